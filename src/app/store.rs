//! Store contract and an in-memory implementation.
//!
//! The panel state is owned by an external reactive store. The coordinator reads
//! it through [`Store::get_state`] and changes it only through the setters; it
//! never keeps a copy between stages. Stores serialize access to their fields
//! themselves.

use crate::domain::state::{AutocompleteState, Collection, Status};
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Getter and setters of the panel state.
pub trait Store: Send + Sync {
    /// Returns a snapshot of the current state.
    fn get_state(&self) -> AutocompleteState;

    fn set_query(&self, query: &str);

    fn set_status(&self, status: Status);

    /// Replaces every collection at once.
    fn set_collections(&self, collections: Vec<Collection>);

    fn set_is_open(&self, is_open: bool);

    fn set_active_item_id(&self, active_item_id: Option<usize>);
}

/// Mutex-guarded store for hosts without a reactive store of their own.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<AutocompleteState>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(state: AutocompleteState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    fn update(&self, f: impl FnOnce(&mut AutocompleteState)) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state);
    }
}

impl Store for MemoryStore {
    fn get_state(&self) -> AutocompleteState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_query(&self, query: &str) {
        self.update(|state| query.clone_into(&mut state.query));
    }

    fn set_status(&self, status: Status) {
        self.update(|state| state.status = status);
    }

    fn set_collections(&self, collections: Vec<Collection>) {
        self.update(|state| state.collections = collections);
    }

    fn set_is_open(&self, is_open: bool) {
        self.update(|state| state.is_open = is_open);
    }

    fn set_active_item_id(&self, active_item_id: Option<usize>) {
        self.update(|state| state.active_item_id = active_item_id);
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("state", &self.get_state())
            .finish()
    }
}
