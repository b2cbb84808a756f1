use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Message shown to users for any failure they cannot correct themselves.
pub const GENERIC_FAILURE_MESSAGE: &str = "Sorry, couldn't process that meal. Please try again.";

#[derive(Error, Debug)]
pub enum PlatelogError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    #[error("LLM rate limit exceeded, retry after {retry_after:?} seconds")]
    LlmRateLimit { retry_after: Option<u64> },

    #[error("Nutrition database error: {0}")]
    Nutrition(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl PlatelogError {
    pub fn status(&self) -> StatusCode {
        match self {
            PlatelogError::Validation(_) => StatusCode::BAD_REQUEST,
            PlatelogError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PlatelogError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            PlatelogError::Validation(msg) | PlatelogError::NotFound(msg) => msg.clone(),
            internal => {
                tracing::error!(error = %internal, "Request failed with internal error");
                GENERIC_FAILURE_MESSAGE.to_string()
            }
        };

        let body = Json(json!({
            "error": message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, PlatelogError>;
