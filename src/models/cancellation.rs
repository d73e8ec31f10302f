//! Modelo de Cancelación
//!
//! Una cancelación por guía (1:1) con la penalización y el pago al
//! mensajero calculados en el momento de cancelar.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

/// Quién origina la cancelación - mapea al ENUM cancellation_initiator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "cancellation_initiator")]
pub enum CancellationInitiator {
    /// El negocio cancela (sujeto a cancelaciones gratuitas y penalización)
    Negocio,
    /// El destinatario rechaza o cancela (sin penalización)
    Cliente,
}

impl fmt::Display for CancellationInitiator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancellationInitiator::Negocio => f.write_str("Negocio"),
            CancellationInitiator::Cliente => f.write_str("Cliente"),
        }
    }
}

/// Tipo de cancelación (catálogo externo, solo lectura)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct CancellationType {
    pub id: i64,
    pub name: String,
    pub initiator: CancellationInitiator,
}

/// Cancelación - mapea a la tabla cancellations
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Cancellation {
    pub id: i64,
    pub guide_id: i64,
    pub business_id: i64,
    pub cancelled_by: i64,
    pub cancellation_type_id: i64,
    pub initiator: CancellationInitiator,
    pub reason: String,
    pub penalty_amount: Decimal,
    pub courier_payment: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Cancelación pendiente de persistir
#[derive(Debug, Clone)]
pub struct NewCancellation {
    pub guide_id: i64,
    pub business_id: i64,
    pub cancelled_by: i64,
    pub cancellation_type_id: i64,
    pub initiator: CancellationInitiator,
    pub reason: String,
    pub penalty_amount: Decimal,
    pub courier_payment: Decimal,
    pub created_at: DateTime<Utc>,
}
