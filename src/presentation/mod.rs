// Presentation layer - HTTP boundary for the chart frontend
pub mod app_state;
pub mod handlers;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use self::app_state::AppState;
use self::handlers::{get_bounds, get_kpis, get_range, get_series, health_check};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/kpis", get(get_kpis))
        .route("/series/:granularity", get(get_series))
        .route("/series/:granularity/bounds", get(get_bounds))
        .route("/series/:granularity/range", get(get_range))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
