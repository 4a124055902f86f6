//! Error types for query resolution.
//!
//! This module defines the centralized error type [`TypeaheadError`] and a type
//! alias [`Result`] used throughout the crate. Failures coming out of plugin code
//! (source enumeration, item fetching) are carried as boxed causes so that source
//! authors can use whatever error type they like.

use thiserror::Error;

/// Boxed error produced by plugin code (sources and source providers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for a resolution cycle and configuration loading.
///
/// Every failure of a cycle surfaces as one of these values from the cycle
/// future. The coordinator never retries or suppresses them, and nothing is
/// committed to the store when a cycle fails: the panel keeps whatever state it
/// had, most commonly a `loading` status. Hosts are expected to catch the error
/// and reset the status themselves. Only the latest cycle reports errors: a
/// cycle that fails after being overtaken resolves as superseded, so a reset
/// never clobbers the status of the cycle still running.
#[derive(Debug, Error)]
pub enum TypeaheadError {
    /// Enumerating the active sources failed.
    ///
    /// Raised when the injected source provider rejects. No source was
    /// queried, so there is nothing to aggregate.
    #[error("failed to enumerate sources: {cause}")]
    SourceEnumeration {
        /// Error reported by the source provider.
        #[source]
        cause: BoxError,
    },

    /// A source failed to produce its items.
    ///
    /// All fetches of a cycle are joined, so under the default failure policy
    /// one failing source fails the whole cycle. When several sources fail,
    /// the first one in declaration order is reported.
    #[error("source `{source_id}` failed to fetch items: {cause}")]
    ItemFetch {
        /// Identifier of the failing source.
        source_id: String,
        /// Error reported by the source.
        #[source]
        cause: BoxError,
    },

    /// A source answered `get_items` with something other than an array.
    #[error("source `{source_id}` must return an array of items but returned {found}: {payload}")]
    ContractViolation {
        /// Identifier of the misbehaving source.
        source_id: String,
        /// JSON type name of the value that was returned.
        found: &'static str,
        /// Truncated rendering of the returned value.
        payload: String,
    },

    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading a configuration file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A TOML configuration document could not be parsed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl TypeaheadError {
    /// Identifier of the source responsible for the error, if any.
    #[must_use]
    pub fn source_id(&self) -> Option<&str> {
        match self {
            Self::ItemFetch { source_id, .. } | Self::ContractViolation { source_id, .. } => {
                Some(source_id)
            }
            _ => None,
        }
    }
}

/// A specialized `Result` type for typeahead operations.
pub type Result<T> = std::result::Result<T, TypeaheadError>;
