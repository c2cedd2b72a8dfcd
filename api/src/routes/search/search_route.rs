use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Query, State,
        multipart::{Multipart, MultipartRejection},
        rejection::QueryRejection,
    },
    http::HeaderMap,
};
use manual_index::SearchResult;
use tracing::{debug, warn};

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
    middleware_layer::request_id::request_id,
    routes::search::{
        search_request::{TopQuery, read_query_input},
        search_response::SearchTopResponse,
    },
};

/// `POST /search`: best match for an uploaded page image or a text snippet.
pub async fn search_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<SearchResult>> {
    let request_id = request_id(&headers);
    let input = read_query_input(multipart?).await?;
    debug!(
        request_id = %request_id,
        modality = input.as_input().modality(),
        "search_route: start"
    );

    match state.service.search(&input, None).await {
        Ok(hit) => {
            debug!(
                request_id = %request_id,
                page = hit.page,
                score = hit.score,
                "search_route: success"
            );
            Ok(Json(hit))
        }
        Err(err) => {
            warn!(request_id = %request_id, error = %err, "search_route: search failed");
            Err(AppError::from(err))
        }
    }
}

/// `POST /search/top?k=N`: up to `k` ranked matches (default `SEARCH_TOP_K`).
pub async fn search_top_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<TopQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<SearchTopResponse>> {
    let request_id = request_id(&headers);
    let Query(q) = query?;
    let k = q.k.unwrap_or(state.service.config().search.top_k);
    let input = read_query_input(multipart?).await?;

    let results = state
        .service
        .search_top_k(&input, k, None)
        .await
        .inspect_err(|err| {
            warn!(request_id = %request_id, error = %err, "search_top_route: search failed");
        })?;

    debug!(request_id = %request_id, k, hits = results.len(), "search_top_route: success");
    Ok(Json(SearchTopResponse { results }))
}
