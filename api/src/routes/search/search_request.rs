use axum::extract::Multipart;
use manual_index::QueryInput;
use serde::Deserialize;

use crate::error_handler::{AppError, AppResult};

/// Query string of `POST /search/top`.
#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub k: Option<usize>,
}

/// Reads the first `image` or `text` field of a multipart body.
///
/// Unknown fields are skipped. An empty `text` field is passed through and
/// rejected by the embedder as unsupported input.
pub async fn read_query_input(mut multipart: Multipart) -> AppResult<QueryInput> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("image") => {
                let bytes = field.bytes().await?;
                return Ok(QueryInput::Image(bytes.to_vec()));
            }
            Some("text") => {
                let text = field.text().await?;
                return Ok(QueryInput::Text(text));
            }
            _ => continue,
        }
    }
    Err(AppError::BadRequest(
        "expected a multipart field named `image` or `text`".into(),
    ))
}
