// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod csv_codec;
pub mod feed_cache;
pub mod http_response;
pub mod http_source;
