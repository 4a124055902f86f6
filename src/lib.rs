//! Typeahead: the query-resolution core of an autocomplete panel.
//!
//! Given a query typed by the user, the coordinator:
//! - Resolves the active sources for the query (possibly asynchronously)
//! - Fetches items from every source concurrently and keeps their order
//! - Drives a status machine `idle → loading → stalled → idle` around the fetch
//! - Decides whether the panel is open and activates the highlighted item
//! - Drops the results of cycles overtaken by a newer input
//!
//! The panel state lives in a host-owned [`Store`]; the coordinator only reads
//! it through the getter and changes it through the setters.

#![allow(clippy::multiple_crate_versions)]

//!
//! # Architecture
//!
//! The crate follows a layered architecture pattern:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Host (store, sources, event loop)                  │  ← Entry point
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Application Layer (app/)                           │  ← Coordinator
//! │  - Resolution cycles and supersession               │
//! │  - Status transitions, stall timer                  │
//! │  - Visibility, activation                           │
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ Source Layer  │   │ Domain Layer  │   │ Infrastructure│
//! │ (source/)     │   │ (domain/)     │   │ (infra.../)   │
//! │ - Plugin API  │   │ - State       │   │ - Timers      │
//! │ - Fetching    │   │ - Status      │   │ - Virtual time│
//! │ - Aggregation │   │ - Errors      │   │ - Paths       │
//! └───────────────┘   └───────────────┘   └───────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Observability (observability/)                     │  ← Optional
//! │  - OpenTelemetry tracing                            │
//! │  - File-based OTLP export                           │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`app`]: Coordinator, cycles, status driver, stall timer, store
//! - [`domain`]: Panel state, status machine, errors
//! - [`source`]: Source plugin contract, fetching, aggregation
//! - [`infrastructure`]: Timer environments and paths
//! - [`observability`]: OpenTelemetry tracing with file export
//!
//! # Configuration
//!
//! Options can come from a TOML document:
//!
//! ```toml
//! open_on_focus = false
//! stall_threshold_ms = 300
//! default_active_item_id = 0
//! failure_policy = "isolate"
//! trace_level = "debug"
//! ```
//!
//! or from a flat string map handed over by the host (see [`Config::from_map`]).
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use typeahead::{
//!     Autocomplete, Config, InputParams, MemoryStore, Source, SourceContext,
//!     SourceResponse, StaticSources, Status, Store,
//! };
//!
//! struct Fruits;
//!
//! impl Source for Fruits {
//!     fn source_id(&self) -> &str {
//!         "fruits"
//!     }
//!
//!     fn get_items(&self, context: &SourceContext) -> SourceResponse {
//!         let items = ["apple", "apricot", "banana"]
//!             .into_iter()
//!             .filter(|fruit| fruit.starts_with(context.query.as_str()))
//!             .map(|fruit| json!(fruit))
//!             .collect::<Vec<_>>();
//!         SourceResponse::from(items)
//!     }
//! }
//!
//! let store = Arc::new(MemoryStore::default());
//! let autocomplete = Autocomplete::builder(Config::default())
//!     .sources(StaticSources::new(vec![Arc::new(Fruits)]))
//!     .store(store.clone())
//!     .build()?;
//!
//! futures::executor::block_on(autocomplete.on_input(InputParams::new("ap")))?;
//!
//! let state = store.get_state();
//! assert_eq!(state.status, Status::Idle);
//! assert_eq!(state.collections[0].items, vec![json!("apple"), json!("apricot")]);
//! assert!(state.is_open);
//! # Ok::<(), typeahead::TypeaheadError>(())
//! ```
//!
//! # Key Design Decisions
//!
//! ## Cycle Supersession
//!
//! Every input takes a sequence number. Only the latest cycle may commit, so a
//! slow response to an earlier keystroke never overwrites a later one.
//! Likewise, a failure of an overtaken cycle is reported as superseded.
//!
//! ## Per-Cycle Stall Timer
//!
//! Each cycle owns its stall timer and cancels it before committing. A stall
//! can therefore never be observed after the cycle went back to `idle`.
//!
//! ## Explicit Scheduling Environment
//!
//! Timers go through the [`Environment`] trait. [`TokioEnvironment`] uses
//! wall-clock time on a tokio runtime; [`ManualEnvironment`] uses a virtual clock for hosts that
//! drive their own time and for deterministic tests.

pub mod app;
pub mod domain;
pub mod infrastructure;
pub mod source;

pub mod observability;

pub use app::{
    decide_visibility, Autocomplete, AutocompleteBuilder, CycleOutcome, InputParams, MemoryStore,
    Refresh, Store,
};
pub use domain::{
    active_item, ActiveItem, AutocompleteState, BoxError, Collection, InputEvent, NextState,
    Result, Status, StatusEvent, TypeaheadError,
};
pub use infrastructure::{Environment, ManualEnvironment, TimeoutHandle, TokioEnvironment};
pub use source::{
    FailurePolicy, Item, OnActiveParams, Source, SourceContext, SourceProvider, SourceResponse,
    StaticSources,
};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Default stall threshold in milliseconds.
pub const DEFAULT_STALL_THRESHOLD_MS: u64 = 300;

/// Coordinator configuration.
///
/// # Example
///
/// ```toml
/// open_on_focus = true
/// stall_threshold_ms = 150
/// failure_policy = "fail_cycle"
/// trace_level = "info"
/// trace_file = "~/traces/typeahead.json"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Whether an empty query still fetches and may open the panel.
    ///
    /// When disabled, an empty query clears every collection without fetching.
    /// Default: `false`
    pub open_on_focus: bool,

    /// How long a cycle may stay `loading` before it is reported as `stalled`.
    ///
    /// Default: `300`
    pub stall_threshold_ms: u64,

    /// Active item id written at the start of every cycle.
    ///
    /// The id is a flat index over the items of all collections. Default: none
    pub default_active_item_id: Option<usize>,

    /// What a failing source does to its cycle. Default: `fail_cycle`
    pub failure_policy: FailurePolicy,

    /// Tracing filter used when `RUST_LOG` is unset.
    ///
    /// Options: `trace`, `debug`, `info`, `warn`, `error`, or any `EnvFilter`
    /// directive. Default: `"info"`
    pub trace_level: Option<String>,

    /// Trace output file. `~` is expanded.
    ///
    /// Default: `typeahead-otlp.json` in the data directory
    pub trace_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            open_on_focus: false,
            stall_threshold_ms: DEFAULT_STALL_THRESHOLD_MS,
            default_active_item_id: None,
            failure_policy: FailurePolicy::default(),
            trace_level: None,
            trace_file: None,
        }
    }
}

impl Config {
    /// Parses configuration from a flat string map.
    ///
    /// Hosts that pass options as key/value strings can hand them over as is.
    /// Values that fail to parse fall back to their defaults.
    ///
    /// # Parsing Rules
    ///
    /// - `open_on_focus`: `"true"` / `"false"`
    /// - `stall_threshold_ms`: String → `u64`
    /// - `default_active_item_id`: String → `usize`, empty means none
    /// - `failure_policy`: `"fail_cycle"` or `"isolate"`
    /// - `trace_level`, `trace_file`: taken verbatim
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use typeahead::{Config, FailurePolicy};
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("open_on_focus".to_string(), "true".to_string());
    /// map.insert("stall_threshold_ms".to_string(), "soon".to_string());
    /// map.insert("failure_policy".to_string(), "isolate".to_string());
    ///
    /// let config = Config::from_map(&map);
    /// assert!(config.open_on_focus);
    /// assert_eq!(config.stall_threshold_ms, 300);
    /// assert_eq!(config.failure_policy, FailurePolicy::Isolate);
    /// ```
    #[must_use]
    pub fn from_map(config: &BTreeMap<String, String>) -> Self {
        let defaults = Self::default();

        let open_on_focus = config
            .get("open_on_focus")
            .and_then(|s| s.trim().parse::<bool>().ok())
            .unwrap_or(defaults.open_on_focus);

        let stall_threshold_ms = config
            .get("stall_threshold_ms")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(defaults.stall_threshold_ms);

        let default_active_item_id = config
            .get("default_active_item_id")
            .and_then(|s| s.trim().parse::<usize>().ok());

        let failure_policy = config
            .get("failure_policy")
            .and_then(|s| match s.parse::<FailurePolicy>() {
                Ok(policy) => Some(policy),
                Err(e) => {
                    tracing::debug!(error = %e, "ignoring failure_policy");
                    None
                }
            })
            .unwrap_or(defaults.failure_policy);

        Self {
            open_on_focus,
            stall_threshold_ms,
            default_active_item_id,
            failure_policy,
            trace_level: config.get("trace_level").cloned(),
            trace_file: config.get("trace_file").cloned(),
        }
    }

    /// Parses configuration from a TOML document. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`TypeaheadError::Toml`] if the document is malformed or a value
    /// has the wrong type.
    pub fn from_toml_str(document: &str) -> Result<Self> {
        Ok(toml::from_str(document)?)
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`TypeaheadError::Io`] if the file cannot be read, or
    /// [`TypeaheadError::Toml`] if it cannot be parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading configuration file");
        let document = std::fs::read_to_string(path)?;
        Self::from_toml_str(&document)
    }

    #[must_use]
    pub const fn stall_threshold(&self) -> Duration {
        Duration::from_millis(self.stall_threshold_ms)
    }
}
