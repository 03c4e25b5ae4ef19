// HTTP request handlers
use crate::domain::dataset::Granularity;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

async fn respond<T: Serialize>(data: &T, status: StatusCode, headers: &HeaderMap) -> Response {
    match json_response(data, status, accepts_brotli(headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

async fn not_found(message: String, headers: &HeaderMap) -> Response {
    respond(&ErrorBody { message }, StatusCode::NOT_FOUND, headers).await
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Fixed KPIs computed at startup
pub async fn get_kpis(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    respond(state.snapshot.kpis(), StatusCode::OK, &headers).await
}

/// Full dataset with derived columns, for the initial render
pub async fn get_series(
    Path(granularity): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let dataset = granularity
        .parse::<Granularity>()
        .ok()
        .and_then(|g| state.snapshot.dataset(g));

    match dataset {
        Some(dataset) => respond(dataset, StatusCode::OK, &headers).await,
        None => not_found(format!("no dataset '{}'", granularity), &headers).await,
    }
}

/// Slider bounds for a dataset
pub async fn get_bounds(
    Path(granularity): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let bounds = granularity
        .parse::<Granularity>()
        .ok()
        .and_then(|g| state.snapshot.bounds(g));

    match bounds {
        Some(bounds) => respond(&bounds, StatusCode::OK, &headers).await,
        None => not_found(format!("no bounds for '{}'", granularity), &headers).await,
    }
}

/// Records between two day offsets, with the positivity overlay recomputed.
/// Missing offsets select the full range.
pub async fn get_range(
    Path(granularity): Path<String>,
    Query(query): Query<RangeQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let start = query.start.unwrap_or(0);
    let end = query.end.unwrap_or(i64::MAX);

    let result = granularity
        .parse::<Granularity>()
        .ok()
        .and_then(|g| state.snapshot.query_range(g, start, end));

    match result {
        Some(result) => respond(&result, StatusCode::OK, &headers).await,
        None => not_found(format!("no dataset '{}'", granularity), &headers).await,
    }
}
