use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors that cross a component boundary and end up in an HTTP response.
///
/// Optional upstreams (nutrient database, country directory) never produce one of
/// these; their failures are absorbed where they are called.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{upstream} lookup failed: {detail}")]
    LookupFailure { upstream: &'static str, detail: String },

    #[error("Authorization token required")]
    MissingToken,

    #[error("Invalid or expired token")]
    AuthFailure,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn lookup(upstream: &'static str, detail: impl ToString) -> Self {
        Self::LookupFailure {
            upstream,
            detail: detail.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MissingToken | AppError::AuthFailure | AppError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AppError::LookupFailure { .. } | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to the client. Server-side failures never expose their detail.
    fn public_message(&self) -> String {
        match self {
            AppError::LookupFailure { .. } => {
                "Unable to reach the product database right now.".to_string()
            }
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        (status, Json(json!({ "message": self.public_message() }))).into_response()
    }
}
