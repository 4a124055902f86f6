//! Status transitions of one resolution cycle.
//!
//! [`StatusDriver`] applies [`StatusEvent`]s to the store on behalf of a single
//! cycle. Stall and re-assert transitions are dropped once the cycle has settled
//! or a newer cycle has started. Settling and stalling share one lock, so a stall
//! callback racing with the commit can never leave the status at `stalled`.

use super::cycle::CycleTicket;
use super::store::Store;
use crate::domain::state::{Status, StatusEvent};
use std::sync::{Arc, Mutex, PoisonError};

/// Drives the status of one cycle through the store.
#[derive(Clone)]
pub struct StatusDriver {
    store: Arc<dyn Store>,
    ticket: CycleTicket,
    in_flight: Arc<Mutex<bool>>,
}

impl StatusDriver {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, ticket: CycleTicket) -> Self {
        Self {
            store,
            ticket,
            in_flight: Arc::new(Mutex::new(false)),
        }
    }

    fn apply(&self, event: StatusEvent) {
        let current = self.store.get_state().status;
        let next = current.on(event);
        tracing::trace!(cycle = self.ticket.seq(), ?event, from = %current, to = %next, "status transition");
        if next != current || event != StatusEvent::StallElapsed {
            self.store.set_status(next);
        }
    }

    /// Marks the cycle as in flight and moves to `loading`.
    pub fn begin(&self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        *in_flight = true;
        self.apply(StatusEvent::InputReceived);
    }

    /// Applies the stall threshold, if the cycle is still in flight and current.
    ///
    /// Returns whether the event was applied.
    pub fn stall(&self) -> bool {
        let in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !*in_flight || !self.ticket.is_current() {
            return false;
        }
        self.apply(StatusEvent::StallElapsed);
        true
    }

    /// Re-asserts `loading` once sources are known, wiping an earlier stall.
    pub fn sources_resolved(&self) {
        let in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if *in_flight && self.ticket.is_current() {
            self.apply(StatusEvent::SourcesResolved);
        }
    }

    /// Settles the cycle after its collections were committed.
    pub fn commit(&self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        *in_flight = false;
        self.apply(StatusEvent::Committed);
    }

    /// Settles an empty-query cycle without fetching.
    pub fn short_circuit(&self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        *in_flight = false;
        self.apply(StatusEvent::EmptyQuery);
    }

    /// Whether the cycle has begun and not settled yet.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        *self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
