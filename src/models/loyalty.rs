//! Modelo de Nivel de Fidelidad
//!
//! Entidad externa de solo lectura. La promoción entre niveles se calcula
//! fuera del núcleo; aquí solo se consultan sus porcentajes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct LoyaltyLevel {
    pub id: i64,
    pub name: String,
    pub discount_percentage: Decimal,
    pub penalty_percentage: Decimal,
    pub free_cancellations_per_month: i32,
}
