//! Collection aggregation.
//!
//! Zips the sources fetched in the current cycle with their settled answers.
//! Position `i` of the output always belongs to source `i` of the input: the
//! aggregator never reorders, merges or deduplicates, and the previous
//! collections play no part in the result.

use super::fetcher::FetchedItems;
use super::Source;
use crate::domain::state::Collection;
use std::sync::Arc;

/// Builds one collection per source, preserving source declaration order.
///
/// `fetched` must hold one entry per source, as returned by
/// [`fetch_all`](super::fetch_all).
#[must_use]
pub fn aggregate(sources: Vec<Arc<dyn Source>>, fetched: Vec<FetchedItems>) -> Vec<Collection> {
    debug_assert_eq!(sources.len(), fetched.len());

    sources
        .into_iter()
        .zip(fetched)
        .map(|(source, fetched)| match fetched {
            FetchedItems::Items(items) => Collection::new(source, items),
            FetchedItems::Failed(error) => Collection::failed(source, error),
        })
        .collect()
}

/// Empties every collection's items, keeping its source and error marker.
#[must_use]
pub fn clear_items(collections: &[Collection]) -> Vec<Collection> {
    collections
        .iter()
        .map(|collection| Collection {
            items: Vec::new(),
            ..collection.clone()
        })
        .collect()
}
