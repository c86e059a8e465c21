//! Error handling for the mill back-office platform
//!
//! Provides consistent error responses in English and Indonesian

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_id: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business rule rejections; no state change has happened when these
    // are returned
    #[error("Insufficient stock for {material}: requested {requested}, available {available}")]
    InsufficientStock {
        material: String,
        requested: Decimal,
        available: Decimal,
    },

    #[error("Insufficient contents in tank {tank}: requested {requested}, available {available}")]
    InsufficientTankStock {
        tank: String,
        requested: Decimal,
        available: Decimal,
    },

    #[error("Capacity of tank {tank} exceeded: requested {requested}, room left {remaining}")]
    CapacityExceeded {
        tank: String,
        requested: Decimal,
        remaining: Decimal,
    },

    #[error("Invalid state transition on {document}: {from} -> {to}")]
    InvalidTransition {
        document: String,
        from: String,
        to: String,
    },

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
    /// Shorthand for a single-field validation error with a default
    /// Indonesian translation
    pub fn validation(field: &str, message: &str, message_id: &str) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.to_string(),
            message_id: message_id.to_string(),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation {
                field,
                message,
                message_id,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: message.clone(),
                    message_id: message_id.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message_en: format!("{} not found", resource),
                    message_id: format!("{} tidak ditemukan", resource),
                    field: None,
                },
            ),
            AppError::InsufficientStock {
                material,
                requested,
                available,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_STOCK".to_string(),
                    message_en: format!(
                        "Insufficient stock for {}: requested {}, available {}",
                        material, requested, available
                    ),
                    message_id: format!(
                        "Stok {} tidak mencukupi: diminta {}, tersedia {}",
                        material, requested, available
                    ),
                    field: None,
                },
            ),
            AppError::InsufficientTankStock {
                tank,
                requested,
                available,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_TANK_STOCK".to_string(),
                    message_en: format!(
                        "Insufficient contents in tank {}: requested {}, available {}",
                        tank, requested, available
                    ),
                    message_id: format!(
                        "Isi tangki {} tidak mencukupi: diminta {}, tersedia {}",
                        tank, requested, available
                    ),
                    field: None,
                },
            ),
            AppError::CapacityExceeded {
                tank,
                requested,
                remaining,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "CAPACITY_EXCEEDED".to_string(),
                    message_en: format!(
                        "Capacity of tank {} exceeded: requested {}, room left {}",
                        tank, requested, remaining
                    ),
                    message_id: format!(
                        "Kapasitas tangki {} terlampaui: diminta {}, sisa ruang {}",
                        tank, requested, remaining
                    ),
                    field: None,
                },
            ),
            AppError::InvalidTransition { document, from, to } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INVALID_TRANSITION".to_string(),
                    message_en: format!(
                        "Invalid state transition on {}: {} -> {}",
                        document, from, to
                    ),
                    message_id: format!(
                        "Perubahan status tidak diizinkan pada {}: {} -> {}",
                        document, from, to
                    ),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message_en: "A database error occurred".to_string(),
                    message_id: "Terjadi kesalahan basis data".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_id: "Terjadi kesalahan internal server".to_string(),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: "An internal server error occurred".to_string(),
                    message_id: "Terjadi kesalahan internal server".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
