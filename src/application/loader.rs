// Acquisition loader - Remote fetch with write-through cache and fallback
use crate::application::feed_source::{FeedSource, FetchError};
use crate::domain::dataset::Dataset;
use crate::error::BuildError;
use crate::infrastructure::config::FeedSpec;
use crate::infrastructure::csv_codec::{decode_table, project, RawTable};
use crate::infrastructure::feed_cache::FeedCache;
use std::sync::Arc;

/// Where a loaded dataset came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Remote,
    Cache,
}

#[derive(Clone)]
pub struct AcquisitionLoader {
    source: Arc<dyn FeedSource>,
    cache: FeedCache,
}

impl AcquisitionLoader {
    pub fn new(source: Arc<dyn FeedSource>, cache: FeedCache) -> Self {
        Self { source, cache }
    }

    /// Load one feed, projected to its schema and sorted by date.
    ///
    /// The cache is only refreshed with a body that projects cleanly. A
    /// remote body missing a required column is a fatal `Schema` error and
    /// leaves the cache untouched; bad dates or cells fall back to the cache.
    pub async fn load(&self, feed: &FeedSpec) -> Result<(Dataset, Origin), BuildError> {
        let source_id = feed.granularity.source_id();

        let cause = match self.fetch_remote(&feed.url).await {
            Ok((body, raw)) => match project(source_id, &raw, &feed.schema, feed.granularity) {
                Ok(dataset) => {
                    if let Err(e) = self.cache.write(source_id, &body).await {
                        tracing::warn!("Could not refresh cache for feed {}: {}", source_id, e);
                    }
                    return Ok(report(source_id, dataset, Origin::Remote));
                }
                Err(e @ BuildError::Schema { .. }) => return Err(e),
                Err(e) => e.to_string(),
            },
            Err(e) => e.to_string(),
        };

        tracing::warn!(
            "Feed {} unavailable at {} ({}), falling back to cache",
            source_id,
            feed.url,
            cause
        );
        let raw = self.read_cache(source_id, &cause).await?;
        let dataset = project(source_id, &raw, &feed.schema, feed.granularity)?;

        Ok(report(source_id, dataset, Origin::Cache))
    }

    async fn fetch_remote(&self, url: &str) -> Result<(String, RawTable), FetchError> {
        let body = self.source.fetch(url).await?;
        let raw = decode_table(&body)?;
        Ok((body, raw))
    }

    async fn read_cache(&self, source_id: &str, cause: &str) -> Result<RawTable, BuildError> {
        let body = self
            .cache
            .read(source_id)
            .await
            .map_err(|source| BuildError::CacheMissing {
                feed: source_id.to_string(),
                path: self.cache.path_for(source_id),
                cause: cause.to_string(),
                source,
            })?;

        decode_table(&body).map_err(|source| BuildError::Csv {
            feed: source_id.to_string(),
            source,
        })
    }
}

fn report(source_id: &str, dataset: Dataset, origin: Origin) -> (Dataset, Origin) {
    match (dataset.first_date(), dataset.last_date()) {
        (Some(first), Some(last)) => tracing::info!(
            "Loaded feed {} from {:?}: {} records ({} to {})",
            source_id,
            origin,
            dataset.len(),
            first,
            last
        ),
        _ => tracing::warn!("Feed {} from {:?} has no records", source_id, origin),
    }

    let duplicates = dataset.duplicate_keys();
    if duplicates > 0 {
        tracing::warn!(
            "Feed {} has {} repeated (date, entity) keys",
            source_id,
            duplicates
        );
    }

    (dataset, origin)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned bodies by URL; unknown URLs fail with 503
    #[derive(Default)]
    pub struct StubSource {
        bodies: HashMap<String, String>,
        pub requests: Mutex<Vec<String>>,
    }

    impl StubSource {
        pub fn with(mut self, url: &str, body: &str) -> Self {
            self.bodies.insert(url.to_string(), body.to_string());
            self
        }
    }

    #[async_trait]
    impl FeedSource for StubSource {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.requests.lock().unwrap().push(url.to_string());
            self.bodies
                .get(url)
                .cloned()
                .ok_or(FetchError::Status(503))
        }
    }
}
