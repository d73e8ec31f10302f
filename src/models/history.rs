//! Modelo del historial de estados
//!
//! Registro append-only de cada transición (y de los eventos sin cambio
//! de estado) de una guía. Nunca se actualiza ni se elimina.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::guide::GuideState;

/// Entrada del historial - mapea a la tabla guide_state_history
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct HistoryEntry {
    pub id: i64,
    pub guide_id: i64,
    pub state: GuideState,
    pub user_id: i64,
    pub observation: String,
    pub created_at: DateTime<Utc>,
}

/// Entrada pendiente de persistir
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub guide_id: i64,
    pub state: GuideState,
    pub user_id: i64,
    pub observation: String,
    pub created_at: DateTime<Utc>,
}
