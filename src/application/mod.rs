// Application layer - Build phase and query use cases
pub mod feed_source;
pub mod kpi_service;
pub mod loader;
pub mod metrics;
pub mod range_query;
pub mod reference_join;
pub mod snapshot;
