use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;

use crate::core::app_state::AppState;

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub ready: bool,
}

/// Liveness plus readiness of the search index.
pub async fn root_route(State(state): State<Arc<AppState>>) -> Json<RootResponse> {
    Json(RootResponse {
        status: "ok",
        service: "manual-search",
        version: env!("CARGO_PKG_VERSION"),
        ready: state.service.is_ready(),
    })
}
