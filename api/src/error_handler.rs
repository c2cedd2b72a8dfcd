use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use manual_index::{ErrorKind, SearchError};
use serde::Serialize;
use thiserror::Error;

use crate::core::app_state::ConfigError;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Config(#[from] ConfigError),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found")]
    NotFound,

    /// Rich HTTP error mapped from lower layers with specific status & code.
    #[error("{message}")]
    Http {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
}

impl AppError {
    pub(crate) fn status_code(&self) -> StatusCode {
        match self {
            // 4xx
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,

            // custom mapped
            AppError::Http { status, .. } => *status,

            // 5xx
            AppError::Config(_) | AppError::Bind(_) | AppError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub(crate) fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NotFound => "NOT_FOUND",
            AppError::Http { code, .. } => code,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.error_code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<QueryRejection> for AppError {
    fn from(err: QueryRejection) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<PathRejection> for AppError {
    fn from(err: PathRejection) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(err: MultipartRejection) -> Self {
        AppError::Http {
            status: StatusCode::BAD_REQUEST,
            code: "BAD_MULTIPART",
            message: err.body_text(),
        }
    }
}

/// Keeps the status axum picks (400, or 413 when the upload limit is hit).
impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::Http {
            status: err.status(),
            code: "BAD_MULTIPART",
            message: err.body_text(),
        }
    }
}

/// HTTP status for each retrieval error class.
fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::NoResult => StatusCode::NOT_FOUND,
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::Transient => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Maps retrieval errors to HTTP status (by [`SearchError::kind`]) and a
/// stable error code.
impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        let code = match &err {
            SearchError::NotReady => "NOT_READY",
            SearchError::EmptyIndex => "EMPTY_INDEX",
            SearchError::NoMatch { .. } => "NO_MATCH",
            SearchError::NotFound(_) => "RECORD_NOT_FOUND",
            SearchError::UnsupportedInput(_) => "UNSUPPORTED_INPUT",
            SearchError::Duplicate(_) => "DUPLICATE_RECORD",
            SearchError::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            SearchError::Timeout(_) => "TIMEOUT",
            SearchError::Config(_) => "CONFIG_ERROR",
            SearchError::Io(_) => "IO_ERROR",
            SearchError::Parse { .. } => "CORPUS_PARSE_ERROR",
            SearchError::Embedding(_) => "EMBEDDING_ERROR",
            SearchError::Internal(_) => "INTERNAL_ERROR",
        };
        AppError::Http {
            status: status_for(err.kind()),
            code,
            message: err.to_string(),
        }
    }
}
