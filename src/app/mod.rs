//! Application layer coordinating resolution cycles.
//!
//! This module holds the coordinator and the pieces a cycle is made of. It sits
//! between the host (which owns the store, the sources and the event loop) and
//! the domain/source layers.
//!
//! # Architecture
//!
//! Every input flows one way through a cycle:
//!
//! ```text
//! Input → Cycle ticket → Status: loading → Sources → Items → Commit → Visibility → Activation
//!                             ↑                                 │
//!                             └────── Stall timer (cancelled) ──┘
//! ```
//!
//! # Modules
//!
//! - [`input`]: The coordinator and its resolution pipeline
//! - [`cycle`]: Cycle sequence numbers and supersession
//! - [`status`]: Status transitions applied on behalf of one cycle
//! - [`stall`]: Per-cycle stall timer
//! - [`store`]: Store contract and in-memory store
//! - [`visibility`]: Panel visibility decision and item activation
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use typeahead::app::{Autocomplete, InputParams, MemoryStore, Store};
//! use typeahead::Config;
//!
//! let store = Arc::new(MemoryStore::default());
//! let autocomplete = Autocomplete::builder(Config::default())
//!     .store(store.clone())
//!     .build()?;
//!
//! let outcome = futures::executor::block_on(autocomplete.on_input(InputParams::new("")))?;
//! assert_eq!(outcome.cycle(), 1);
//! assert!(!store.get_state().is_open);
//! # Ok::<(), typeahead::TypeaheadError>(())
//! ```

pub mod cycle;
pub mod input;
pub mod stall;
pub mod status;
pub mod store;
pub mod visibility;

pub use cycle::{CycleTicket, CycleTracker};
pub use input::{Autocomplete, AutocompleteBuilder, CycleOutcome, InputParams, Refresh};
pub use stall::StallTimer;
pub use status::StatusDriver;
pub use store::{MemoryStore, Store};
pub use visibility::{activate_highlighted, decide_visibility, has_items, PanelPredicate};
