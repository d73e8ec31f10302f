//! Modelo de Contrato
//!
//! Entidad externa de solo lectura: fuente de la tasa de comisión del
//! mensajero y condición de elegibilidad para asignaciones.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Contract {
    pub id: i64,
    pub courier_id: i64,
    pub commission_percentage: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub active: bool,
}

impl Contract {
    /// Activo si el flag está encendido y la fecha cae dentro del rango
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.active
            && self.start_date <= date
            && self.end_date.map_or(true, |end| date <= end)
    }
}
