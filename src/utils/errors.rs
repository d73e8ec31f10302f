//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del núcleo de guías
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::guide::GuideState;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Guide {guide_id} is in state {current}, cannot {operation}")]
    InvalidGuideState {
        guide_id: i64,
        current: GuideState,
        operation: String,
    },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: GuideState, to: GuideState },

    #[error("Courier ineligible: {0}")]
    CourierIneligible(String),

    #[error("Courier {courier_id} has no active contract")]
    NoActiveContract { courier_id: i64 },

    #[error("Assignment of guide {guide_id} already accepted")]
    AlreadyAccepted { guide_id: i64 },

    #[error("Incident {incident_id} already resolved")]
    AlreadyResolved { incident_id: i64 },

    #[error("Guide {guide_id} already cancelled")]
    AlreadyCancelled { guide_id: i64 },

    #[error("Guide {guide_id} cannot be cancelled after pickup")]
    CannotCancelAfterPickup { guide_id: i64 },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl AppError {
    /// Código estable expuesto a los clientes
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DB_ERROR",
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::NotFound(_) => "RESOURCE_NOT_FOUND",
            AppError::InvalidGuideState { .. } => "INVALID_GUIDE_STATE",
            AppError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            AppError::CourierIneligible(_) => "COURIER_INELIGIBLE",
            AppError::NoActiveContract { .. } => "NO_ACTIVE_CONTRACT",
            AppError::AlreadyAccepted { .. } => "ALREADY_ACCEPTED",
            AppError::AlreadyResolved { .. } => "ALREADY_RESOLVED",
            AppError::AlreadyCancelled { .. } => "ALREADY_CANCELLED",
            AppError::CannotCancelAfterPickup { .. } => "CANNOT_CANCEL_AFTER_PICKUP",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Notification(_) => "NOTIFICATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) | AppError::Notification(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidGuideState { .. }
            | AppError::InvalidStateTransition { .. }
            | AppError::AlreadyAccepted { .. }
            | AppError::AlreadyResolved { .. }
            | AppError::AlreadyCancelled { .. }
            | AppError::CannotCancelAfterPickup { .. } => StatusCode::CONFLICT,
            AppError::CourierIneligible(_) | AppError::NoActiveContract { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let error_response = match &self {
            AppError::Database(e) => {
                tracing::error!("❌ Database error: {}", e);
                ErrorResponse {
                    error: "Database Error".to_string(),
                    message: "An error occurred while accessing the database".to_string(),
                    details: None,
                    code: Some(code.to_string()),
                }
            }

            AppError::Validation(e) => {
                tracing::warn!("⚠️ Validation error: {}", e);
                ErrorResponse {
                    error: "Validation Error".to_string(),
                    message: "The provided data is invalid".to_string(),
                    details: Some(json!(e)),
                    code: Some(code.to_string()),
                }
            }

            AppError::InvalidGuideState { guide_id, current, operation } => {
                tracing::warn!("⚠️ {}", self);
                ErrorResponse {
                    error: "Invalid Guide State".to_string(),
                    message: self.to_string(),
                    details: Some(json!({
                        "guide_id": guide_id,
                        "current_state": current,
                        "operation": operation,
                    })),
                    code: Some(code.to_string()),
                }
            }

            AppError::InvalidStateTransition { from, to } => {
                tracing::warn!("⚠️ {}", self);
                ErrorResponse {
                    error: "Invalid State Transition".to_string(),
                    message: self.to_string(),
                    details: Some(json!({ "from": from, "to": to })),
                    code: Some(code.to_string()),
                }
            }

            AppError::Internal(msg) | AppError::Notification(msg) => {
                tracing::error!("❌ Internal error: {}", msg);
                ErrorResponse {
                    error: "Internal Server Error".to_string(),
                    message: "An unexpected error occurred".to_string(),
                    details: None,
                    code: Some(code.to_string()),
                }
            }

            other => {
                tracing::warn!("⚠️ {}", other);
                ErrorResponse {
                    error: status
                        .canonical_reason()
                        .unwrap_or("Error")
                        .to_string(),
                    message: other.to_string(),
                    details: None,
                    code: Some(code.to_string()),
                }
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de validación
pub fn validation_error(field: &'static str, message: &'static str) -> AppError {
    use validator::ValidationError;

    let mut error = ValidationError::new("custom");
    error.add_param("field".into(), &field);
    error.add_param("message".into(), &message);

    let mut errors = validator::ValidationErrors::new();
    errors.add(field, error);

    AppError::Validation(errors)
}

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: i64) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de acceso prohibido
pub fn forbidden_error(operation: &str, reason: &str) -> AppError {
    AppError::Forbidden(format!("Cannot {}: {}", operation, reason))
}

/// Función helper para errores de estado de guía
pub fn invalid_state_error(guide_id: i64, current: GuideState, operation: &str) -> AppError {
    AppError::InvalidGuideState {
        guide_id,
        current,
        operation: operation.to_string(),
    }
}
