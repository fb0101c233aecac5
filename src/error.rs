//! Error types for the extraction pipeline

use thiserror::Error;

/// Errors raised while resolving configuration or extracting records.
///
/// The run engine treats these differently: `Configuration` is a setup-time
/// defect that aborts the whole run, while `Fetch`/`Parse` abort only the
/// target that raised them.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Unknown source type, invalid selector, or malformed strategy settings
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network or HTTP-status failure for a single request
    #[error("fetch failed for {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Response body could not be parsed as the expected format
    #[error("parse failed for {url}: {message}")]
    Parse { url: String, message: String },
}
