//! Shared fixtures for coordinator tests: a status-recording store, sources
//! answering on virtual time or on demand, and a single-threaded driver.

#![allow(dead_code)]

use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use typeahead::{
    Autocomplete, AutocompleteState, BoxError, Collection, Config, CycleOutcome, Environment,
    InputEvent, InputParams, Item, ManualEnvironment, MemoryStore, OnActiveParams, Source,
    SourceContext, SourceProvider, SourceResponse, StaticSources, Status, Store,
};

/// Store recording every status it is given.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    statuses: Mutex<Vec<Status>>,
}

impl RecordingStore {
    /// Statuses written so far, with consecutive repeats collapsed.
    pub fn statuses(&self) -> Vec<Status> {
        let mut statuses = self.statuses.lock().unwrap().clone();
        statuses.dedup();
        statuses
    }

    pub fn status(&self) -> Status {
        self.get_state().status
    }

    /// `(source_id, items)` of every collection.
    pub fn collections(&self) -> Vec<(String, Vec<Item>)> {
        self.get_state()
            .collections
            .iter()
            .map(|c| (c.source_id().to_string(), c.items.clone()))
            .collect()
    }
}

impl Store for RecordingStore {
    fn get_state(&self) -> AutocompleteState {
        self.inner.get_state()
    }

    fn set_query(&self, query: &str) {
        self.inner.set_query(query);
    }

    fn set_status(&self, status: Status) {
        self.statuses.lock().unwrap().push(status);
        self.inner.set_status(status);
    }

    fn set_collections(&self, collections: Vec<Collection>) {
        self.inner.set_collections(collections);
    }

    fn set_is_open(&self, is_open: bool) {
        self.inner.set_is_open(is_open);
    }

    fn set_active_item_id(&self, active_item_id: Option<usize>) {
        self.inner.set_active_item_id(active_item_id);
    }
}

/// One `on_active` notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Activation {
    pub item: Item,
    pub event: InputEvent,
    pub item_input_value: String,
}

/// Source answering with fixed items after a virtual delay.
pub struct TimedSource {
    id: &'static str,
    items: Vec<Item>,
    delay: Duration,
    env: Arc<ManualEnvironment>,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
    activations: Mutex<Vec<Activation>>,
}

impl TimedSource {
    pub fn new(
        env: &Arc<ManualEnvironment>,
        id: &'static str,
        items: &[&str],
        delay_ms: u64,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            items: items.iter().map(|item| Value::from(*item)).collect(),
            delay: Duration::from_millis(delay_ms),
            env: Arc::clone(env),
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
            activations: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn activations(&self) -> Vec<Activation> {
        self.activations.lock().unwrap().clone()
    }
}

impl Source for TimedSource {
    fn source_id(&self) -> &str {
        self.id
    }

    fn get_items(&self, context: &SourceContext) -> SourceResponse {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(context.query.clone());

        let (tx, rx) = oneshot::channel();
        let payload = Value::Array(self.items.clone());
        self.env.set_timeout(
            Box::new(move || {
                let _ = tx.send(payload);
            }),
            self.delay,
        );
        SourceResponse::pending(async move { rx.await.map_err(BoxError::from) })
    }

    fn on_active(&self, params: &OnActiveParams<'_>) {
        self.activations.lock().unwrap().push(Activation {
            item: params.item.clone(),
            event: params.event,
            item_input_value: params.item_input_value.to_string(),
        });
    }
}

type Gate = oneshot::Sender<Result<Value, BoxError>>;

/// Source whose answers are released by the test, per query.
pub struct GatedSource {
    id: &'static str,
    gates: Mutex<Vec<(String, Gate)>>,
}

impl GatedSource {
    pub fn new(id: &'static str) -> Arc<Self> {
        Arc::new(Self {
            id,
            gates: Mutex::new(Vec::new()),
        })
    }

    /// Answers the pending request made for `query`.
    pub fn release(&self, query: &str, answer: Result<Value, BoxError>) {
        let mut gates = self.gates.lock().unwrap();
        let position = gates
            .iter()
            .position(|(pending, _)| pending == query)
            .unwrap_or_else(|| panic!("no pending request for `{query}`"));
        let (_, gate) = gates.remove(position);
        let _ = gate.send(answer);
    }

    pub fn pending(&self) -> usize {
        self.gates.lock().unwrap().len()
    }
}

impl Source for GatedSource {
    fn source_id(&self) -> &str {
        self.id
    }

    fn get_items(&self, context: &SourceContext) -> SourceResponse {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push((context.query.clone(), tx));
        SourceResponse::pending(async move {
            match rx.await {
                Ok(answer) => answer,
                Err(canceled) => Err(BoxError::from(canceled)),
            }
        })
    }
}

/// Source answering immediately.
pub struct ReadySource {
    id: &'static str,
    answer: fn() -> SourceResponse,
}

impl ReadySource {
    pub fn new(id: &'static str, answer: fn() -> SourceResponse) -> Arc<Self> {
        Arc::new(Self { id, answer })
    }
}

impl Source for ReadySource {
    fn source_id(&self) -> &str {
        self.id
    }

    fn get_items(&self, _context: &SourceContext) -> SourceResponse {
        (self.answer)()
    }
}

/// Result slot of a spawned cycle.
pub struct CycleHandle(Rc<RefCell<Option<typeahead::Result<CycleOutcome>>>>);

impl CycleHandle {
    pub fn is_settled(&self) -> bool {
        self.0.borrow().is_some()
    }

    /// Takes the result, panicking if the cycle has not settled.
    pub fn take(&self) -> typeahead::Result<CycleOutcome> {
        self.0.borrow_mut().take().expect("cycle has not settled")
    }

    pub fn outcome(&self) -> CycleOutcome {
        self.take().expect("cycle failed")
    }
}

/// Drives cycles on a single-threaded executor against virtual time.
pub struct Harness {
    pub env: Arc<ManualEnvironment>,
    pub store: Arc<RecordingStore>,
    pub autocomplete: Autocomplete,
    pool: LocalPool,
}

impl Harness {
    pub fn new(config: Config, env: Arc<ManualEnvironment>, sources: Vec<Arc<dyn Source>>) -> Self {
        Self::with_provider(config, env, StaticSources::new(sources))
    }

    pub fn with_provider(
        config: Config,
        env: Arc<ManualEnvironment>,
        provider: impl SourceProvider + 'static,
    ) -> Self {
        let store = Arc::new(RecordingStore::default());
        let autocomplete = Autocomplete::builder(config)
            .sources(provider)
            .environment(env.clone())
            .store(store.clone())
            .build()
            .unwrap();
        Self {
            env,
            store,
            autocomplete,
            pool: LocalPool::new(),
        }
    }

    /// Starts a cycle and polls it until it waits on something.
    pub fn input(&mut self, input: InputParams) -> CycleHandle {
        let slot = Rc::new(RefCell::new(None));
        let cycle = self.autocomplete.on_input(input);
        let writer = Rc::clone(&slot);
        self.pool
            .spawner()
            .spawn_local(async move {
                *writer.borrow_mut() = Some(cycle.await);
            })
            .expect("spawn cycle");
        self.pool.run_until_stalled();
        CycleHandle(slot)
    }

    pub fn type_query(&mut self, query: &str) -> CycleHandle {
        self.input(InputParams::new(query))
    }

    /// Advances virtual time, then polls every cycle that became ready.
    pub fn advance(&mut self, ms: u64) {
        self.env.advance(Duration::from_millis(ms));
        self.pool.run_until_stalled();
    }

    pub fn run(&mut self) {
        self.pool.run_until_stalled();
    }
}

/// Config with a 30 ms stall threshold.
pub fn config() -> Config {
    Config {
        stall_threshold_ms: 30,
        ..Config::default()
    }
}

pub fn items(values: &[&str]) -> Vec<Item> {
    values.iter().map(|value| Value::from(*value)).collect()
}
