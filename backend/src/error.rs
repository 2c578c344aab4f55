//! Error handling for the Business Management Platform
//!
//! Every error renders as the standard `{ success: false, message, field? }`
//! envelope with the status code mandated by the error taxonomy.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Workflow errors
    #[error("Invalid state: {0}")]
    State(String),

    #[error("Insufficient available stock: {0}")]
    InsufficientStock(String),

    #[error("Insufficient reserved stock: {0}")]
    InsufficientReserved(String),

    #[error("Invoice has payments applied and cannot be modified")]
    InvoiceLocked,

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Validation error tied to a specific input field
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Error response body following the standard envelope
#[derive(Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, field) = match &self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                message.clone(),
                Some(field.clone()),
            ),
            AppError::DuplicateEntry(what) => (
                StatusCode::CONFLICT,
                format!("A record with this {} already exists", what),
                Some(what.clone()),
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                format!("{} not found", resource),
                None,
            ),
            AppError::State(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::InsufficientStock(msg) => (
                StatusCode::BAD_REQUEST,
                format!("Insufficient available stock: {}", msg),
                None,
            ),
            AppError::InsufficientReserved(msg) => (
                StatusCode::BAD_REQUEST,
                format!("Insufficient reserved stock: {}", msg),
                None,
            ),
            AppError::InvoiceLocked => (
                StatusCode::BAD_REQUEST,
                "Invoice has payments applied and cannot be modified".to_string(),
                None,
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "A database error occurred".to_string(),
                None,
            ),
            AppError::Internal(_) | AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred".to_string(),
                None,
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        let body = ErrorBody {
            success: false,
            message,
            field,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
