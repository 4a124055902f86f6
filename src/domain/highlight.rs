//! Highlighted item derivation.
//!
//! The highlighted item is never stored. It is recomputed from the state's
//! `active_item_id`, a flat index that runs across all collections in order:
//! with collections of 2 and 1 items, ids `0` and `1` address the first
//! collection and id `2` addresses the single item of the second.

use crate::domain::state::{AutocompleteState, Collection};
use crate::source::{Item, Source};
use std::fmt;
use std::sync::Arc;

/// The currently highlighted item with its source-computed projections.
#[derive(Clone)]
pub struct ActiveItem {
    pub item: Item,
    /// Value the input would show for this item.
    pub item_input_value: String,
    pub item_url: Option<String>,
    pub source: Arc<dyn Source>,
}

impl fmt::Debug for ActiveItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveItem")
            .field("item", &self.item)
            .field("item_input_value", &self.item_input_value)
            .field("item_url", &self.item_url)
            .field("source", &self.source.source_id())
            .finish()
    }
}

/// Finds the collection holding `active_item_id` and the item's index within it.
fn locate(collections: &[Collection], active_item_id: usize) -> Option<(&Collection, usize)> {
    let mut offset = 0;
    for collection in collections {
        let len = collection.items.len();
        if active_item_id < offset + len {
            return Some((collection, active_item_id - offset));
        }
        offset += len;
    }
    None
}

/// Computes the highlighted item of `state`.
///
/// Returns `None` when no item is active or when the id points past the last
/// item.
#[must_use]
pub fn active_item(state: &AutocompleteState) -> Option<ActiveItem> {
    let active_item_id = state.active_item_id?;
    let (collection, index) = locate(&state.collections, active_item_id)?;
    let item = collection.items.get(index)?.clone();
    let source = Arc::clone(&collection.source);

    Some(ActiveItem {
        item_input_value: source.get_item_input_value(&item, state),
        item_url: source.get_item_url(&item, state),
        item,
        source,
    })
}
