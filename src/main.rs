// Main entry point - Build the snapshot once, then serve it
mod application;
mod domain;
mod error;
mod infrastructure;
mod presentation;

use std::{sync::Arc, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::application::loader::AcquisitionLoader;
use crate::application::snapshot::SnapshotBuilder;
use crate::domain::dataset::Granularity;
use crate::infrastructure::config::{feed_specs, load_app_config};
use crate::infrastructure::csv_codec::read_population;
use crate::infrastructure::feed_cache::FeedCache;
use crate::infrastructure::http_source::HttpFeedSource;
use crate::presentation::app_state::AppState;
use crate::presentation::router;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "covid_trends=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // Load configuration
    let config = load_app_config()?;

    // Reference data
    let population = read_population(&config.data.population_file)?;
    tracing::info!(
        "Loaded {} population entries from {}",
        population.len(),
        config.data.population_file.display()
    );

    // Build phase: every feed is loaded, joined and derived exactly once
    let source = Arc::new(HttpFeedSource::new(Duration::from_secs(
        config.data.fetch_timeout_secs,
    ))?);
    let cache = FeedCache::new(&config.data.cache_dir);
    tracing::info!("Using feed cache at {}", cache.dir().display());
    let loader = AcquisitionLoader::new(source, cache);

    let snapshot = match SnapshotBuilder::new(loader, population)
        .build(&feed_specs(&config))
        .await
    {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::error!("Cannot build snapshot: {}", e);
            return Err(e.into());
        }
    };

    for granularity in Granularity::ALL {
        if let Some(bounds) = snapshot.bounds(granularity) {
            tracing::info!(
                "{} series: {} to {} ({} days)",
                granularity,
                bounds.first_date,
                bounds.last_date,
                bounds.delta_t
            );
        }
    }
    tracing::info!(
        "Snapshot ready with {} population entries",
        snapshot.population().len()
    );

    let state = Arc::new(AppState {
        snapshot: Arc::new(snapshot),
    });

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    tracing::info!("Starting covid-trends service on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
