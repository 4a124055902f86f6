//! Concurrent item fetching.
//!
//! Every source of a cycle is asked for its items before anything is awaited,
//! then all answers are joined. The join waits for every source to settle; it
//! never races. Answers are validated to be JSON arrays before they reach the
//! aggregator.

use super::{Item, Source, SourceContext};
use crate::domain::error::{Result, TypeaheadError};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::IntoFuture;
use std::str::FromStr;
use std::sync::Arc;

/// Longest payload rendering kept in a contract violation message.
const PAYLOAD_PREVIEW_CHARS: usize = 120;

/// What a failing source does to its cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Any failing source fails the whole cycle; nothing is committed.
    #[default]
    FailCycle,
    /// A failing source yields an empty, error-marked collection and the other
    /// sources commit normally.
    Isolate,
}

impl FromStr for FailurePolicy {
    type Err = TypeaheadError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "fail_cycle" | "fail-cycle" => Ok(Self::FailCycle),
            "isolate" => Ok(Self::Isolate),
            other => Err(TypeaheadError::Config(format!(
                "unknown failure policy `{other}` (expected `fail_cycle` or `isolate`)"
            ))),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FailCycle => f.write_str("fail_cycle"),
            Self::Isolate => f.write_str("isolate"),
        }
    }
}

/// Settled answer of one source.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchedItems {
    Items(Vec<Item>),
    /// The source failed and the failure was isolated.
    Failed(String),
}

/// Returns the JSON type name used in contract violation messages.
const fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Checks that a source answered with an array of items.
///
/// # Errors
///
/// Returns [`TypeaheadError::ContractViolation`] naming the source and the JSON
/// type it returned instead.
pub fn validate_items(source_id: &str, value: serde_json::Value) -> Result<Vec<Item>> {
    match value {
        serde_json::Value::Array(items) => Ok(items),
        other => {
            let rendered = other.to_string();
            let payload = if rendered.chars().count() > PAYLOAD_PREVIEW_CHARS {
                let head: String = rendered.chars().take(PAYLOAD_PREVIEW_CHARS).collect();
                format!("{head}...")
            } else {
                rendered
            };
            Err(TypeaheadError::ContractViolation {
                source_id: source_id.to_string(),
                found: json_type(&other),
                payload,
            })
        }
    }
}

/// Fetches the items of every source concurrently.
///
/// `get_items` is invoked on each source in declaration order, then all answers
/// are awaited together. The result has one entry per source, in the same order.
///
/// # Errors
///
/// - [`TypeaheadError::ContractViolation`] if any source answered with a
///   non-array, regardless of `policy`.
/// - [`TypeaheadError::ItemFetch`] for the first failing source in declaration
///   order when `policy` is [`FailurePolicy::FailCycle`].
pub async fn fetch_all(
    sources: &[Arc<dyn Source>],
    context: &SourceContext,
    policy: FailurePolicy,
) -> Result<Vec<FetchedItems>> {
    let pending: Vec<_> = sources
        .iter()
        .map(|source| source.get_items(context).into_future())
        .collect();

    let settled = join_all(pending).await;

    let mut fetched = Vec::with_capacity(settled.len());
    for (source, outcome) in sources.iter().zip(settled) {
        let source_id = source.source_id();
        match outcome {
            Ok(value) => {
                let items = validate_items(source_id, value)?;
                tracing::debug!(source_id = %source_id, item_count = items.len(), "source settled");
                fetched.push(FetchedItems::Items(items));
            }
            Err(cause) => match policy {
                FailurePolicy::FailCycle => {
                    tracing::debug!(source_id = %source_id, error = %cause, "source failed, failing cycle");
                    return Err(TypeaheadError::ItemFetch {
                        source_id: source_id.to_string(),
                        cause,
                    });
                }
                FailurePolicy::Isolate => {
                    tracing::debug!(source_id = %source_id, error = %cause, "source failed, isolating");
                    fetched.push(FetchedItems::Failed(cause.to_string()));
                }
            },
        }
    }

    Ok(fetched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::store::{MemoryStore, Store};
    use crate::app::Autocomplete;
    use crate::infrastructure::ManualEnvironment;
    use crate::Config;
    use crate::source::SourceResponse;
    use futures::executor::block_on;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        id: &'static str,
        answer: fn() -> SourceResponse,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(id: &'static str, answer: fn() -> SourceResponse) -> Arc<Self> {
            Arc::new(Self {
                id,
                answer,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl Source for Fixed {
        fn source_id(&self) -> &str {
            self.id
        }

        fn get_items(&self, _context: &SourceContext) -> SourceResponse {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.answer)()
        }
    }

    fn context() -> SourceContext {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::default());
        let autocomplete = Autocomplete::builder(Config::default())
            .environment(Arc::new(ManualEnvironment::new()))
            .store(Arc::clone(&store))
            .build()
            .unwrap();
        SourceContext {
            query: "q".to_string(),
            state: Default::default(),
            store,
            refresh: autocomplete.refresh_handle(),
        }
    }

    #[test]
    fn validate_rejects_non_arrays() {
        assert_eq!(validate_items("s", json!([1, 2])).unwrap(), vec![json!(1), json!(2)]);

        let err = validate_items("s", json!({"hits": []})).unwrap_err();
        assert!(matches!(
            err,
            TypeaheadError::ContractViolation { found: "object", .. }
        ));
    }

    #[test]
    fn long_payloads_are_truncated() {
        let long = "x".repeat(500);
        let Err(TypeaheadError::ContractViolation { payload, .. }) =
            validate_items("s", json!(long))
        else {
            panic!("expected a contract violation");
        };
        assert!(payload.ends_with("..."));
        assert_eq!(payload.chars().count(), PAYLOAD_PREVIEW_CHARS + 3);
    }

    #[test]
    fn lifts_ready_and_pending_answers_in_order() {
        let ready = Fixed::new("ready", || SourceResponse::from(vec![json!("r")]));
        let pending = Fixed::new("pending", || {
            SourceResponse::pending(async { Ok(json!(["p1", "p2"])) })
        });
        let sources: Vec<Arc<dyn Source>> = vec![pending.clone(), ready.clone()];

        let fetched = block_on(fetch_all(&sources, &context(), FailurePolicy::FailCycle)).unwrap();

        assert_eq!(
            fetched,
            vec![
                FetchedItems::Items(vec![json!("p1"), json!("p2")]),
                FetchedItems::Items(vec![json!("r")]),
            ]
        );
        assert_eq!(ready.calls.load(Ordering::SeqCst), 1);
        assert_eq!(pending.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fail_cycle_reports_first_failure_after_all_sources_ran() {
        let ok = Fixed::new("ok", || SourceResponse::from(vec![]));
        let first = Fixed::new("first", || SourceResponse::failed("boom"));
        let second = Fixed::new("second", || SourceResponse::failed("bang"));
        let sources: Vec<Arc<dyn Source>> = vec![ok, first, second.clone()];

        let err = block_on(fetch_all(&sources, &context(), FailurePolicy::FailCycle)).unwrap_err();

        assert_eq!(err.source_id(), Some("first"));
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn isolate_marks_failed_sources() {
        let ok = Fixed::new("ok", || SourceResponse::from(vec![json!(1)]));
        let bad = Fixed::new("bad", || SourceResponse::failed("offline"));
        let sources: Vec<Arc<dyn Source>> = vec![bad, ok];

        let fetched = block_on(fetch_all(&sources, &context(), FailurePolicy::Isolate)).unwrap();

        assert_eq!(
            fetched,
            vec![
                FetchedItems::Failed("offline".to_string()),
                FetchedItems::Items(vec![json!(1)]),
            ]
        );
    }

    #[test]
    fn contract_violations_are_never_isolated() {
        let bad = Fixed::new("bad", || SourceResponse::raw(json!("nope")));
        let sources: Vec<Arc<dyn Source>> = vec![bad];

        let err = block_on(fetch_all(&sources, &context(), FailurePolicy::Isolate)).unwrap_err();
        assert!(matches!(err, TypeaheadError::ContractViolation { found: "string", .. }));
    }

    #[test]
    fn parses_failure_policy_names() {
        assert_eq!("isolate".parse::<FailurePolicy>().unwrap(), FailurePolicy::Isolate);
        assert_eq!(" fail_cycle ".parse::<FailurePolicy>().unwrap(), FailurePolicy::FailCycle);
        assert!("retry".parse::<FailurePolicy>().is_err());
    }
}
