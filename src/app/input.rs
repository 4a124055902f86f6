//! Input handling: the resolution pipeline.
//!
//! [`Autocomplete::on_input`] is the entry point of a resolution cycle. It runs
//! in two phases:
//!
//! 1. **Synchronous prefix**, executed before `on_input` returns: a new cycle
//!    number is issued, the query and the default active item id are written,
//!    and either the empty-query short-circuit completes or the status moves to
//!    `loading` and a stall timer is armed.
//! 2. **Resolution future**, returned to the caller:
//!
//! ```text
//! get_sources ──▶ status: loading ──▶ get_items × N (joined) ──▶ aggregate
//!                                                                   │
//!            activate ◀── is_open ◀── collections ◀── status: idle ◀┘
//! ```
//!
//! The commit at the end only happens while the cycle is still the latest one;
//! an overtaken cycle resolves to [`CycleOutcome::Superseded`] without touching
//! the store. The same holds for a failure: once a newer cycle exists, the
//! failure is reported as superseded, never as an error. Errors of the latest
//! cycle resolve the future to `Err` and commit nothing.

use super::cycle::{CycleTicket, CycleTracker};
use super::stall::StallTimer;
use super::status::StatusDriver;
use super::store::{MemoryStore, Store};
use super::visibility::{activate_highlighted, decide_visibility, has_items, PanelPredicate};
use crate::domain::error::{Result, TypeaheadError};
use crate::domain::state::{AutocompleteState, Collection, InputEvent, NextState};
use crate::infrastructure::{Environment, TokioEnvironment};
use crate::source::{
    aggregate, clear_items, fetch_all, FailurePolicy, SourceContext, SourceProvider,
    StaticSources,
};
use crate::Config;
use futures_util::future::{self, BoxFuture};
use futures_util::FutureExt;
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;

/// One input to resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputParams {
    /// Literal query text.
    pub query: String,
    /// Event that triggered the input.
    pub event: InputEvent,
    /// Partial state applied when the cycle completes.
    pub next_state: NextState,
}

impl InputParams {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_event(mut self, event: InputEvent) -> Self {
        self.event = event;
        self
    }

    #[must_use]
    pub const fn with_next_state(mut self, next_state: NextState) -> Self {
        self.next_state = next_state;
        self
    }
}

/// How a cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Collections, status and visibility were written.
    Committed {
        cycle: u64,
        collections: usize,
        is_open: bool,
        /// Whether a source was notified of its highlighted item.
        activated: bool,
    },
    /// The query was empty and open-on-focus is disabled; nothing was fetched.
    ShortCircuited { cycle: u64, is_open: bool },
    /// A newer cycle started before this one settled; its results were dropped.
    Superseded { cycle: u64, latest: u64 },
}

impl CycleOutcome {
    /// Sequence number of the cycle this outcome belongs to.
    #[must_use]
    pub const fn cycle(&self) -> u64 {
        match self {
            Self::Committed { cycle, .. }
            | Self::ShortCircuited { cycle, .. }
            | Self::Superseded { cycle, .. } => *cycle,
        }
    }
}

/// Query-resolution coordinator for one panel.
///
/// Cheap to clone; clones share the store, the plugins and the cycle counter.
#[derive(Clone)]
pub struct Autocomplete {
    config: Config,
    sources: Arc<dyn SourceProvider>,
    should_panel_open: PanelPredicate,
    environment: Arc<dyn Environment>,
    store: Arc<dyn Store>,
    cycles: Arc<CycleTracker>,
}

impl Autocomplete {
    #[must_use]
    pub fn builder(config: Config) -> AutocompleteBuilder {
        AutocompleteBuilder::new(config)
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Sequence number of the most recently started cycle.
    #[must_use]
    pub fn latest_cycle(&self) -> u64 {
        self.cycles.latest()
    }

    /// Handle that sources use to re-run the current query.
    #[must_use]
    pub fn refresh_handle(&self) -> Refresh {
        Refresh {
            autocomplete: self.clone(),
        }
    }

    /// Starts a cycle for the query currently in the store.
    ///
    /// The cycle is triggered by [`InputEvent::Refresh`] and keeps the panel's
    /// current visibility.
    pub fn refresh(&self) -> BoxFuture<'static, Result<CycleOutcome>> {
        let state = self.store.get_state();
        tracing::debug!(query_len = state.query.len(), "refreshing");
        self.on_input(
            InputParams::new(state.query)
                .with_event(InputEvent::Refresh)
                .with_next_state(NextState::open(state.is_open)),
        )
    }

    /// Starts a resolution cycle for `input`.
    ///
    /// Query, active item id and the initial status are written before this
    /// returns. The returned future performs the rest of the cycle and must be
    /// polled for results to be committed; it is `Send` and owns everything it
    /// needs, so it can be spawned on any executor.
    ///
    /// # Errors
    ///
    /// The future resolves to:
    /// - [`TypeaheadError::SourceEnumeration`] if the source provider fails;
    /// - [`TypeaheadError::ItemFetch`] if a source fails under
    ///   [`FailurePolicy::FailCycle`];
    /// - [`TypeaheadError::ContractViolation`] if a source answers with a
    ///   non-array.
    ///
    /// In every error case nothing is committed and the status is left as it
    /// was, usually `loading`. Recovering from that is up to the host. A cycle
    /// that fails after a newer one started resolves to
    /// [`CycleOutcome::Superseded`] instead, leaving the newer cycle's status
    /// alone.
    pub fn on_input(&self, input: InputParams) -> BoxFuture<'static, Result<CycleOutcome>> {
        let InputParams {
            query,
            event,
            next_state,
        } = input;

        let ticket = self.cycles.begin();
        let span = tracing::debug_span!(
            "on_input",
            cycle = ticket.seq(),
            query_len = query.len(),
            event = ?event
        );
        let _guard = span.enter();

        self.store.set_query(&query);
        self.store.set_active_item_id(self.config.default_active_item_id);

        let status = StatusDriver::new(Arc::clone(&self.store), ticket.clone());

        if query.is_empty() && !self.config.open_on_focus {
            status.short_circuit();
            self.store
                .set_collections(clear_items(&self.store.get_state().collections));
            let is_open = next_state
                .is_open
                .unwrap_or_else(|| (self.should_panel_open)(&self.store.get_state()));
            self.store.set_is_open(is_open);

            tracing::debug!(is_open, "empty query, fetching skipped");
            return future::ready(Ok(CycleOutcome::ShortCircuited {
                cycle: ticket.seq(),
                is_open,
            }))
            .boxed();
        }

        status.begin();
        let stall = StallTimer::arm(
            Arc::clone(&self.environment),
            self.config.stall_threshold(),
            status.clone(),
        );

        let resolution = Resolution {
            query,
            event,
            next_state,
            ticket,
            status,
            stall,
            store: Arc::clone(&self.store),
            sources: Arc::clone(&self.sources),
            refresh: self.refresh_handle(),
            should_panel_open: Arc::clone(&self.should_panel_open),
            open_on_focus: self.config.open_on_focus,
            failure_policy: self.config.failure_policy,
        };

        resolution.run().instrument(span.clone()).boxed()
    }
}

impl fmt::Debug for Autocomplete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Autocomplete")
            .field("config", &self.config)
            .field("latest_cycle", &self.cycles.latest())
            .finish_non_exhaustive()
    }
}

/// Re-runs resolution for the current query on behalf of a source.
///
/// Reaches sources through [`SourceContext::refresh`] and
/// [`OnActiveParams::refresh`](crate::source::OnActiveParams::refresh).
#[derive(Clone)]
pub struct Refresh {
    autocomplete: Autocomplete,
}

impl Refresh {
    /// Same as [`Autocomplete::refresh`]: the new cycle starts before this
    /// returns.
    pub fn refresh(&self) -> BoxFuture<'static, Result<CycleOutcome>> {
        self.autocomplete.refresh()
    }
}

impl fmt::Debug for Refresh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refresh")
            .field("latest_cycle", &self.autocomplete.latest_cycle())
            .finish()
    }
}

/// The asynchronous part of one cycle.
struct Resolution {
    query: String,
    event: InputEvent,
    next_state: NextState,
    ticket: CycleTicket,
    status: StatusDriver,
    /// Disarmed before committing, and on drop whatever the outcome.
    stall: StallTimer,
    store: Arc<dyn Store>,
    sources: Arc<dyn SourceProvider>,
    refresh: Refresh,
    should_panel_open: PanelPredicate,
    open_on_focus: bool,
    failure_policy: FailurePolicy,
}

impl Resolution {
    fn context(&self) -> SourceContext {
        SourceContext {
            query: self.query.clone(),
            state: self.store.get_state(),
            store: Arc::clone(&self.store),
            refresh: self.refresh.clone(),
        }
    }

    fn superseded(&self) -> CycleOutcome {
        CycleOutcome::Superseded {
            cycle: self.ticket.seq(),
            latest: self.ticket.latest(),
        }
    }

    /// Enumerates the sources and fetches their items.
    async fn collect(&self) -> Result<Vec<Collection>> {
        let context = self.context();
        let sources = self
            .sources
            .get_sources(&context)
            .await
            .map_err(|cause| TypeaheadError::SourceEnumeration { cause })?;
        tracing::debug!(source_count = sources.len(), "sources resolved");

        self.status.sources_resolved();

        let context = self.context();
        let fetched = fetch_all(&sources, &context, self.failure_policy).await?;
        Ok(aggregate(sources, fetched))
    }

    async fn run(mut self) -> Result<CycleOutcome> {
        let collected = self.collect().await;
        self.stall.disarm();

        let collections = match collected {
            Ok(collections) => collections,
            Err(e) if !self.ticket.is_current() => {
                tracing::debug!(
                    error = %e,
                    latest = self.ticket.latest(),
                    "superseded cycle failed, error dropped"
                );
                return Ok(self.superseded());
            }
            Err(e) => {
                tracing::debug!(error = %e, "cycle failed");
                return Err(e);
            }
        };

        if !self.ticket.is_current() {
            tracing::debug!(
                latest = self.ticket.latest(),
                "cycle superseded, discarding results"
            );
            return Ok(self.superseded());
        }

        let collection_count = collections.len();
        self.status.commit();
        self.store.set_collections(collections);

        let should_panel_open = (self.should_panel_open)(&self.store.get_state());
        let is_open = decide_visibility(
            self.next_state,
            self.open_on_focus,
            &self.query,
            should_panel_open,
        );
        self.store.set_is_open(is_open);

        let activated = activate_highlighted(&self.store, self.event, &self.refresh);

        tracing::debug!(
            collections = collection_count,
            is_open,
            activated,
            "cycle committed"
        );
        Ok(CycleOutcome::Committed {
            cycle: self.ticket.seq(),
            collections: collection_count,
            is_open,
            activated,
        })
    }
}

/// Assembles an [`Autocomplete`] from configuration and plugins.
///
/// Unset parts fall back to: no sources, a panel that opens when there is at
/// least one item, [`TokioEnvironment`] timers, and an in-memory store.
pub struct AutocompleteBuilder {
    config: Config,
    sources: Option<Arc<dyn SourceProvider>>,
    should_panel_open: Option<PanelPredicate>,
    environment: Option<Arc<dyn Environment>>,
    store: Option<Arc<dyn Store>>,
}

impl AutocompleteBuilder {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            sources: None,
            should_panel_open: None,
            environment: None,
            store: None,
        }
    }

    #[must_use]
    pub fn sources(mut self, provider: impl SourceProvider + 'static) -> Self {
        self.sources = Some(Arc::new(provider));
        self
    }

    #[must_use]
    pub fn should_panel_open(
        mut self,
        predicate: impl Fn(&AutocompleteState) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.should_panel_open = Some(Arc::new(predicate));
        self
    }

    #[must_use]
    pub fn environment(mut self, environment: Arc<dyn Environment>) -> Self {
        self.environment = Some(environment);
        self
    }

    #[must_use]
    pub fn store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    /// # Errors
    ///
    /// Returns [`TypeaheadError::Io`] if no environment was given and the
    /// default timer runtime cannot be started.
    pub fn build(self) -> Result<Autocomplete> {
        tracing::debug!(config = ?self.config, "building autocomplete coordinator");
        let environment = match self.environment {
            Some(environment) => environment,
            None => Arc::new(TokioEnvironment::new()?),
        };
        Ok(Autocomplete {
            config: self.config,
            sources: self
                .sources
                .unwrap_or_else(|| Arc::new(StaticSources::default())),
            should_panel_open: self
                .should_panel_open
                .unwrap_or_else(|| Arc::new(has_items)),
            environment,
            store: self
                .store
                .unwrap_or_else(|| Arc::new(MemoryStore::default())),
            cycles: CycleTracker::new(),
        })
    }
}

impl fmt::Debug for AutocompleteBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutocompleteBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
