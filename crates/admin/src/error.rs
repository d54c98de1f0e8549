//! Unified error handling for the curator.
//!
//! Every handler returns `Result<_, AppError>`. Errors render as
//! `{"error": message}`; internal details are logged and sent to Sentry,
//! never returned to the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::shopify::{AdminShopifyError, ProjectionError};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Shopify could not be reached or rejected the request.
    #[error("Shopify error: {0}")]
    Remote(#[from] AdminShopifyError),

    /// Shopify answered with data that does not match the product schema.
    #[error("{0}")]
    MalformedResponse(#[from] ProjectionError),

    /// Submitted data could not be parsed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Storage(#[from] RepositoryError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// No Shopify session.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Remote(AdminShopifyError::NotFound(_)) | Self::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Remote(_) | Self::MalformedResponse(_) | Self::Storage(_) | Self::Session(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    /// Message safe to return to the client.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Remote(AdminShopifyError::NotFound(what)) => format!("Not found: {what}"),
            Self::Remote(_) | Self::MalformedResponse(_) => "Failed to fetch products".to_string(),
            Self::Storage(_) => "Failed to save data".to_string(),
            Self::Session(_) => "Session unavailable".to_string(),
            Self::InvalidInput(_) | Self::Unauthorized(_) | Self::NotFound(_) => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Curator request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}
