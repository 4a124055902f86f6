//! Domain layer: panel state, status machine and errors.
//!
//! These types are independent of any store, source or timer implementation.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`state`]: Panel state snapshot, status machine, collections
//! - [`highlight`]: Derivation of the highlighted item

pub mod error;
pub mod highlight;
pub mod state;

pub use error::{BoxError, Result, TypeaheadError};
pub use highlight::{active_item, ActiveItem};
pub use state::{AutocompleteState, Collection, InputEvent, NextState, Status, StatusEvent};
