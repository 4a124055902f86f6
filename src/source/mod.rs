//! Source plugin contract, source enumeration, fetching and aggregation.
//!
//! A [`Source`] is a pluggable provider of results for a query. The coordinator
//! treats every source identically: it asks the [`SourceProvider`] for the
//! active sources of a cycle, calls [`Source::get_items`] on each of them
//! concurrently, and zips the answers back into one
//! [`Collection`](crate::domain::Collection) per source.
//!
//! # Modules
//!
//! - [`fetcher`]: Concurrent item fetching with validation and failure policy
//! - [`aggregator`]: Source/item zipping into ordered collections

pub mod aggregator;
pub mod fetcher;

pub use aggregator::{aggregate, clear_items};
pub use fetcher::{fetch_all, validate_items, FailurePolicy, FetchedItems};

use crate::app::input::Refresh;
use crate::app::store::Store;
use crate::domain::error::BoxError;
use crate::domain::state::{AutocompleteState, InputEvent};
use futures_util::future::{self, BoxFuture};
use futures_util::FutureExt;
use std::fmt;
use std::future::{Future, IntoFuture};
use std::sync::Arc;

/// Source-defined item payload, opaque to the coordinator.
pub type Item = serde_json::Value;

/// Future resolving to the raw answer of a source.
pub type ItemsFuture = BoxFuture<'static, std::result::Result<serde_json::Value, BoxError>>;

/// Future resolving to the active sources of a cycle.
pub type SourcesFuture = BoxFuture<'static, std::result::Result<Vec<Arc<dyn Source>>, BoxError>>;

/// Everything a source or source provider gets to see for one cycle.
#[derive(Clone)]
pub struct SourceContext {
    /// Query being resolved.
    pub query: String,
    /// Store snapshot taken when the stage started.
    pub state: AutocompleteState,
    /// Store handle, giving plugins access to the setters.
    pub store: Arc<dyn Store>,
    /// Starts a new cycle for the current query.
    pub refresh: Refresh,
}

impl fmt::Debug for SourceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceContext")
            .field("query", &self.query)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Parameters passed to [`Source::on_active`].
pub struct OnActiveParams<'a> {
    pub item: &'a Item,
    pub item_input_value: &'a str,
    pub item_url: Option<&'a str>,
    /// Event that triggered the cycle.
    pub event: InputEvent,
    pub state: &'a AutocompleteState,
    pub store: &'a Arc<dyn Store>,
    /// Starts a new cycle for the current query.
    pub refresh: &'a Refresh,
}

/// Answer of [`Source::get_items`].
///
/// Sources that already hold their items answer with [`SourceResponse::Ready`];
/// the fetcher lifts every answer into a future either way. The payload must be a
/// JSON array, anything else is reported as a contract violation.
pub enum SourceResponse {
    Ready(std::result::Result<serde_json::Value, BoxError>),
    Pending(ItemsFuture),
}

impl SourceResponse {
    /// Wraps a future answer.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = std::result::Result<serde_json::Value, BoxError>> + Send + 'static,
    {
        Self::Pending(future.boxed())
    }

    /// Wraps a raw JSON answer, validated later by the fetcher.
    #[must_use]
    pub fn raw(value: serde_json::Value) -> Self {
        Self::Ready(Ok(value))
    }

    /// Wraps an immediate failure.
    pub fn failed(error: impl Into<BoxError>) -> Self {
        Self::Ready(Err(error.into()))
    }
}

impl From<Vec<Item>> for SourceResponse {
    fn from(items: Vec<Item>) -> Self {
        Self::Ready(Ok(serde_json::Value::Array(items)))
    }
}

impl IntoFuture for SourceResponse {
    type Output = std::result::Result<serde_json::Value, BoxError>;
    type IntoFuture = ItemsFuture;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            Self::Ready(result) => future::ready(result).boxed(),
            Self::Pending(future) => future,
        }
    }
}

impl fmt::Debug for SourceResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// A pluggable provider of results for a query.
///
/// Only [`source_id`](Source::source_id) and [`get_items`](Source::get_items)
/// are required. The projections default to the current query and no url, and
/// activation is a no-op.
pub trait Source: Send + Sync {
    /// Stable identifier of the source.
    fn source_id(&self) -> &str;

    /// Fetches the items matching `context.query`.
    fn get_items(&self, context: &SourceContext) -> SourceResponse;

    /// Value the input shows when `item` is highlighted.
    fn get_item_input_value(&self, item: &Item, state: &AutocompleteState) -> String {
        let _ = item;
        state.query.clone()
    }

    /// Url the item links to, if any.
    fn get_item_url(&self, item: &Item, state: &AutocompleteState) -> Option<String> {
        let _ = (item, state);
        None
    }

    /// Called after a cycle when one of this source's items is highlighted.
    fn on_active(&self, params: &OnActiveParams<'_>) {
        let _ = params;
    }
}

/// Computes the active sources of a cycle.
///
/// Enumeration is asynchronous so sources can be loaded lazily. Closures of the
/// right shape implement this trait directly.
pub trait SourceProvider: Send + Sync {
    fn get_sources(&self, context: &SourceContext) -> SourcesFuture;
}

impl<F> SourceProvider for F
where
    F: Fn(&SourceContext) -> SourcesFuture + Send + Sync,
{
    fn get_sources(&self, context: &SourceContext) -> SourcesFuture {
        self(context)
    }
}

/// A fixed source list, the same for every cycle.
#[derive(Clone, Default)]
pub struct StaticSources {
    sources: Vec<Arc<dyn Source>>,
}

impl StaticSources {
    #[must_use]
    pub fn new(sources: Vec<Arc<dyn Source>>) -> Self {
        Self { sources }
    }
}

impl SourceProvider for StaticSources {
    fn get_sources(&self, _context: &SourceContext) -> SourcesFuture {
        future::ready(Ok(self.sources.clone())).boxed()
    }
}

impl fmt::Debug for StaticSources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.sources.iter().map(|s| s.source_id()))
            .finish()
    }
}
