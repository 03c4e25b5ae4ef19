// Build-phase error types
use std::path::PathBuf;
use thiserror::Error;

/// Errors that prevent a snapshot from being built.
///
/// Every variant names the feed (or reference file) it came from so the
/// startup failure can be traced without further context.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Remote retrieval failed and there is no usable cache to fall back to
    #[error("feed {feed}: remote retrieval failed ({cause}) and cache {} is unavailable: {source}", .path.display())]
    CacheMissing {
        feed: String,
        path: PathBuf,
        cause: String,
        #[source]
        source: std::io::Error,
    },

    /// A required column is absent from the source
    #[error("feed {feed}: required column '{column}' is missing")]
    Schema { feed: String, column: String },

    /// A numeric cell that does not parse
    #[error("feed {feed}: invalid value '{value}' in column '{column}' at line {line}")]
    InvalidCell {
        feed: String,
        line: u64,
        column: String,
        value: String,
    },

    #[error("feed {feed}: invalid date '{value}' at line {line}")]
    InvalidDate { feed: String, line: u64, value: String },

    /// Cached copy exists but is not valid CSV
    #[error("feed {feed}: cannot decode cached data")]
    Csv {
        feed: String,
        #[source]
        source: csv::Error,
    },

    #[error("population file {}: {reason}", .path.display())]
    Population { path: PathBuf, reason: String },

    #[error("feed {0} is not configured")]
    UnknownFeed(String),
}
