//! Error types for the inventory sync service
//!
//! Every failure that can reach an HTTP handler is expressed as an [`Error`],
//! which knows the status code it maps to. Platform failures carry their own
//! taxonomy in [`crate::inventory::InventoryError`] and are usually absorbed
//! per line item before they get this far.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::config::ConfigError;
use crate::inventory::{ApiError, InventoryError};
use crate::tracking::TrackingError;

/// The main error type for service operations
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or mismatched webhook signature
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Malformed input on a test endpoint
    #[error("Validation error: {0}")]
    Validation(String),

    /// Inventory mutation failed
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// Platform API call failed outside of an adjustment
    #[error("Platform API error: {0}")]
    Api(#[from] ApiError),

    /// Order tracking store failed
    #[error("Tracking error: {0}")]
    Tracking(#[from] TrackingError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Anything else
    #[error("{0}")]
    Unexpected(String),
}

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an authentication error
    pub fn authentication<S: Into<String>>(msg: S) -> Self {
        Error::Authentication(msg.into())
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Error::Validation(msg.into())
    }

    /// Create an unexpected error
    pub fn unexpected<S: Into<String>>(msg: S) -> Self {
        Error::Unexpected(msg.into())
    }

    /// HTTP status code this error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Authentication(_) => StatusCode::UNAUTHORIZED,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Inventory(_)
            | Error::Api(_)
            | Error::Tracking(_)
            | Error::Config(_)
            | Error::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::authentication("invalid webhook signature");
        assert_eq!(
            err.to_string(),
            "Authentication failed: invalid webhook signature"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::authentication("x").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(Error::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::unexpected("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let inventory = Error::from(InventoryError::NoInventoryLevel {
            inventory_item_id: 7,
        });
        assert_eq!(inventory.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_generic_error() {
        let err = Error::unexpected("something went wrong");
        assert_eq!(err.to_string(), "something went wrong");
    }

    #[test]
    fn test_into_response_status() {
        let response = Error::validation("orderId is required").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
