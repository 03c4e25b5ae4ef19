// Source trait for remote feed retrieval
use async_trait::async_trait;
use thiserror::Error;

/// Why a remote retrieval failed. Any of these triggers the cache fallback.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server responded with status {0}")]
    Status(u16),

    #[error("response is not valid CSV: {0}")]
    Decode(#[from] csv::Error),
}

#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Retrieve the full CSV body at `url`
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}
