//! Usuario que actúa
//!
//! Extractor del header `X-User-Id`. La autenticación vive fuera de este
//! servicio; aquí solo se exige que el header exista y sea un id válido.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::utils::errors::AppError;

pub const ACTING_USER_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActingUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(ACTING_USER_HEADER)
            .ok_or_else(|| AppError::Unauthorized("missing X-User-Id header".to_string()))?;

        value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|id| *id > 0)
            .map(ActingUser)
            .ok_or_else(|| AppError::Unauthorized("invalid X-User-Id header".to_string()))
    }
}
