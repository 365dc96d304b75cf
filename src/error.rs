//! Common error type and alias.
//!
//! Every outbound call and handler step returns `AppResult<T>`. The
//! `IntoResponse` impl is the single place where a failure becomes an HTTP
//! status and JSON body.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    /// The request body could not be buffered (e.g. over the size limit).
    #[error("{message}")]
    RequestBody { status: StatusCode, message: String },

    #[error("upstream returned status {status}: {details}")]
    UpstreamHttp { status: u16, details: Value },

    #[error("failed to reach upstream: {0}")]
    UpstreamConnection(#[source] reqwest::Error),

    #[error("failed to enhance prompt: {0}")]
    Enhancement(#[source] Box<AppError>),

    #[error("unexpected upstream response: {0}")]
    Extraction(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Status code reported to the client for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::RequestBody { status, .. } => *status,
            AppError::UpstreamHttp { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            AppError::UpstreamConnection(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Enhancement(_)
            | AppError::Extraction(_)
            | AppError::Config(_)
            | AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON body reported to the client. Internal causes stay in the logs.
    pub fn body(&self) -> Value {
        match self {
            AppError::Validation(msg) | AppError::RequestBody { message: msg, .. } => {
                json!({ "error": msg })
            }
            AppError::UpstreamHttp { status, details } => json!({
                "error": "Request to OpenAI API failed",
                "status_code": status,
                "details": details,
            }),
            AppError::UpstreamConnection(_) => json!({ "error": "Failed to reach OpenAI API" }),
            AppError::Enhancement(cause) => json!({
                "error": "Failed to enhance prompt",
                "details": cause.to_string(),
            }),
            AppError::Extraction(_) | AppError::Config(_) | AppError::Unexpected(_) => {
                json!({ "error": "Internal server error" })
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}
