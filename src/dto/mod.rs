//! DTOs de la API HTTP
//!
//! Requests validados con `validator` y el sobre de respuesta común.

pub mod guide_dto;
pub mod incident_dto;

use serde::Serialize;

/// Sobre de respuesta `{ success, message, data }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}
