//! Error handling module
//!
//! Provides unified error types and handling for the entire application.

use crate::catalog::NodeKind;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Failures of a comparison pass
#[derive(Error, Debug)]
pub enum CompareError {
    /// Both sides of a pair-compare are absent
    #[error("Cannot compare two absent nodes")]
    BothNodesNull,

    /// A node pair was registered twice with different results
    #[error("Node pair {key} was already compared with a different result")]
    DuplicateComparison { key: String },

    /// A node pair was re-entered while its own comparison was still running
    #[error("Node pair {key} is already being compared")]
    ComparisonInProgress { key: String },

    /// No comparer is registered for a kind or any of its ancestors
    #[error("No comparer registered for node kind {kind}")]
    UnresolvableComparer { kind: NodeKind },

    #[error("Failed to serialize property value: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Violations of the schema graph invariants
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Duplicate {kind} name '{name}' in {parent}")]
    DuplicateName {
        parent: String,
        kind: &'static str,
        name: String,
    },

    #[error("{kind} name '{name}' in {parent} contains a '.'")]
    DottedName {
        parent: String,
        kind: &'static str,
        name: String,
    },
}

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Comparison error: {0}")]
    Compare(#[from] CompareError),

    #[error("Invalid catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Schema not cached for node {0}")]
    NotCached(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<crate::config::ConfigError> for AppError {
    fn from(err: crate::config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match &self {
            AppError::Compare(CompareError::BothNodesNull) => (
                StatusCode::BAD_REQUEST,
                "BOTH_NODES_NULL",
                self.to_string(),
                None,
            ),
            AppError::Compare(e) => {
                error!("Comparison error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "COMPARISON_ERROR",
                    "Schema comparison failed".to_string(),
                    Some(e.to_string()),
                )
            }
            AppError::Catalog(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_CATALOG",
                e.to_string(),
                None,
            ),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                msg.clone(),
                None,
            ),
            AppError::NotCached(node) => (
                StatusCode::NOT_FOUND,
                "NOT_CACHED",
                format!("No cached schema for node '{}', extraction required", node),
                None,
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                msg.clone(),
                None,
            ),
            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    Some(msg.clone()),
                )
            }
            AppError::Config(msg) => {
                error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIG_ERROR",
                    "A configuration error occurred".to_string(),
                    Some(msg.clone()),
                )
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            message,
            error: details,
            code: Some(error_code.to_string()),
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, AppError>;

/// Helper function to create a validation error
pub fn validation_error(msg: impl Into<String>) -> AppError {
    AppError::Validation(msg.into())
}

/// Helper function to create a not found error
pub fn not_found_error(msg: impl Into<String>) -> AppError {
    AppError::NotFound(msg.into())
}
