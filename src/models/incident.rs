//! Modelo de Incidencia
//!
//! Una guía puede acumular varias incidencias; en la práctica solo una
//! queda abierta (sin resolver) a la vez.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Tipo de incidencia (catálogo externo, solo lectura)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct IncidentType {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// Incidencia - mapea a la tabla incidents
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Incident {
    pub id: i64,
    pub guide_id: i64,
    pub incident_type_id: i64,
    pub description: String,
    pub reported_by: i64,
    pub resolved: bool,
    pub resolution: Option<String>,
    pub resolved_by: Option<i64>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Incidencia pendiente de persistir
#[derive(Debug, Clone)]
pub struct NewIncident {
    pub guide_id: i64,
    pub incident_type_id: i64,
    pub description: String,
    pub reported_by: i64,
    pub created_at: DateTime<Utc>,
}
