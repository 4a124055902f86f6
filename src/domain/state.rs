//! Panel state as seen through the store.
//!
//! This module defines [`AutocompleteState`], the snapshot the coordinator reads
//! from the store, together with [`Status`] and its transition function, the
//! per-source [`Collection`], and the partial [`NextState`] override a caller can
//! attach to an input.
//!
//! # Status Machine
//!
//! ```text
//!            InputReceived             Committed
//!   Idle ─────────────────▶ Loading ─────────────▶ Idle
//!                             │  ▲
//!                StallElapsed │  │ SourcesResolved
//!                             ▼  │
//!                           Stalled ───Committed──▶ Idle
//! ```
//!
//! `EmptyQuery` moves any status straight to `Idle`.

use crate::source::{Item, Source};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Resolution status of the panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// No resolution is in flight.
    #[default]
    Idle,
    /// A resolution is in flight and within the stall threshold.
    Loading,
    /// A resolution is in flight and has exceeded the stall threshold.
    Stalled,
}

/// Events driving the [`Status`] machine during a resolution cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    /// An input with a query to resolve was received.
    InputReceived,
    /// An input short-circuited on an empty query.
    EmptyQuery,
    /// The stall threshold elapsed before the cycle settled.
    StallElapsed,
    /// The source list was obtained; item fetching starts.
    SourcesResolved,
    /// Collections were committed.
    Committed,
}

impl Status {
    /// Returns the status that follows `self` when `event` occurs.
    ///
    /// Stalling only applies to a loading cycle; every other event has a fixed
    /// target regardless of the current status.
    ///
    /// # Example
    ///
    /// ```
    /// use typeahead::{Status, StatusEvent};
    ///
    /// assert_eq!(Status::Loading.on(StatusEvent::StallElapsed), Status::Stalled);
    /// assert_eq!(Status::Idle.on(StatusEvent::StallElapsed), Status::Idle);
    /// assert_eq!(Status::Stalled.on(StatusEvent::SourcesResolved), Status::Loading);
    /// ```
    #[must_use]
    pub const fn on(self, event: StatusEvent) -> Self {
        match (self, event) {
            (_, StatusEvent::InputReceived | StatusEvent::SourcesResolved) => Self::Loading,
            (_, StatusEvent::EmptyQuery | StatusEvent::Committed) => Self::Idle,
            (Self::Loading, StatusEvent::StallElapsed) => Self::Stalled,
            (current, StatusEvent::StallElapsed) => current,
        }
    }

    /// Whether a resolution is in flight.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Loading | Self::Stalled)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Stalled => "stalled",
        };
        f.write_str(name)
    }
}

/// Items produced by one source within one resolution cycle.
///
/// The source handle is shared with the source list that produced it, so
/// equality of collections is decided by source identifier and items.
#[derive(Clone)]
pub struct Collection {
    /// Source that produced the items.
    pub source: Arc<dyn Source>,
    /// Items in the order the source returned them.
    pub items: Vec<Item>,
    /// Failure message when the source failed under an isolating failure policy.
    pub error: Option<String>,
}

impl Collection {
    #[must_use]
    pub fn new(source: Arc<dyn Source>, items: Vec<Item>) -> Self {
        Self {
            source,
            items,
            error: None,
        }
    }

    /// Creates an empty collection marking a failed source.
    #[must_use]
    pub fn failed(source: Arc<dyn Source>, error: impl Into<String>) -> Self {
        Self {
            source,
            items: Vec::new(),
            error: Some(error.into()),
        }
    }

    #[must_use]
    pub fn source_id(&self) -> &str {
        self.source.source_id()
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("source", &self.source_id())
            .field("items", &self.items)
            .field("error", &self.error)
            .finish()
    }
}

impl PartialEq for Collection {
    fn eq(&self, other: &Self) -> bool {
        self.source_id() == other.source_id()
            && self.items == other.items
            && self.error == other.error
    }
}

/// Snapshot of the panel state held by the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutocompleteState {
    /// Current search text.
    pub query: String,
    /// Resolution status.
    pub status: Status,
    /// One collection per active source, in source declaration order.
    pub collections: Vec<Collection>,
    /// Flat index of the highlighted item across all collections.
    pub active_item_id: Option<usize>,
    /// Whether the panel is visible.
    pub is_open: bool,
}

impl AutocompleteState {
    /// Total number of items across all collections.
    #[must_use]
    pub fn items_count(&self) -> usize {
        self.collections.iter().map(|c| c.items.len()).sum()
    }
}

/// Partial state applied at the end of a cycle.
///
/// Used when a cycle is triggered by something other than typing, for example a
/// click on an item that should close the panel once the cycle completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextState {
    /// Explicit panel visibility, overriding the visibility policy.
    pub is_open: Option<bool>,
}

impl NextState {
    #[must_use]
    pub const fn open(is_open: bool) -> Self {
        Self {
            is_open: Some(is_open),
        }
    }
}

/// The host event that triggered a cycle.
///
/// Forwarded untouched to [`Source::on_active`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputEvent {
    /// The query text changed.
    #[default]
    Change,
    /// The input gained focus.
    Focus,
    /// An item was clicked.
    ItemClick,
    /// The input was reset.
    Reset,
    /// The host asked to re-resolve the current query.
    Refresh,
}
