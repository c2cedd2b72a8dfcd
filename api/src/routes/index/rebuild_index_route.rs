use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
};
use manual_index::IndexReport;
use tracing::{error, info};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::AppError,
    middleware_layer::request_id::request_id,
};

/// `POST /index/rebuild`: reloads the configured corpus and swaps the index.
pub async fn rebuild_index_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let request_id = request_id(&headers);

    match state.service.rebuild_from_corpus(None).await {
        Ok(report) => {
            info!(
                request_id = %request_id,
                indexed = report.indexed,
                skipped = report.skipped,
                "rebuild_index_route: success"
            );
            ApiResponse::success(report).into_response_with_status(StatusCode::OK)
        }
        Err(err) => {
            error!(request_id = %request_id, error = %err, "rebuild_index_route: failed");
            let err = AppError::from(err);
            ApiResponse::<IndexReport>::error(err.error_code(), err.to_string())
                .into_response_with_status(err.status_code())
        }
    }
}
