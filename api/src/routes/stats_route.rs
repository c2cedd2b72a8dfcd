use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap};
use manual_index::Stats;
use tracing::debug;

use crate::{core::app_state::AppState, middleware_layer::request_id::request_id};

pub async fn stats_route(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Json<Stats> {
    let stats = state.service.stats();
    debug!(
        request_id = %request_id(&headers),
        total_items = stats.total_items,
        ready = stats.ready,
        "stats_route"
    );
    Json(stats)
}
