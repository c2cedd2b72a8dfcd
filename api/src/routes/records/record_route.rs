use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
};
use manual_index::{Record, RecordId};

use crate::{core::app_state::AppState, error_handler::AppResult};

/// `GET /records/{id}`: stored record with its full page text.
pub async fn record_route(
    State(state): State<Arc<AppState>>,
    id: Result<Path<u64>, PathRejection>,
) -> AppResult<Json<Record>> {
    let Path(id) = id?;
    Ok(Json(state.service.record(RecordId(id))?))
}
