//! Modelo de Guía
//!
//! Este módulo contiene el struct Guide y el enum cerrado de estados.
//! Mapea exactamente a la tabla guides del schema PostgreSQL.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

/// Estado de la guía - mapea al ENUM guide_state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "guide_state")]
pub enum GuideState {
    Creada,
    Asignada,
    Recogida,
    EnRuta,
    Entregada,
    Cancelada,
    Rechazada,
    Incidencia,
}

impl GuideState {
    pub const ALL: [GuideState; 8] = [
        GuideState::Creada,
        GuideState::Asignada,
        GuideState::Recogida,
        GuideState::EnRuta,
        GuideState::Entregada,
        GuideState::Cancelada,
        GuideState::Rechazada,
        GuideState::Incidencia,
    ];

    /// Orden de presentación
    pub fn display_order(&self) -> u8 {
        match self {
            GuideState::Creada => 1,
            GuideState::Asignada => 2,
            GuideState::Recogida => 3,
            GuideState::EnRuta => 4,
            GuideState::Entregada => 5,
            GuideState::Cancelada => 6,
            GuideState::Rechazada => 7,
            GuideState::Incidencia => 8,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(
            self,
            GuideState::Entregada | GuideState::Cancelada | GuideState::Rechazada
        )
    }

    /// Estados en los que la guía debe tener mensajero asignado
    pub fn requires_courier(&self) -> bool {
        matches!(
            self,
            GuideState::Asignada
                | GuideState::Recogida
                | GuideState::EnRuta
                | GuideState::Entregada
                | GuideState::Incidencia
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GuideState::Creada => "Creada",
            GuideState::Asignada => "Asignada",
            GuideState::Recogida => "Recogida",
            GuideState::EnRuta => "EnRuta",
            GuideState::Entregada => "Entregada",
            GuideState::Cancelada => "Cancelada",
            GuideState::Rechazada => "Rechazada",
            GuideState::Incidencia => "Incidencia",
        }
    }
}

impl fmt::Display for GuideState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Guía principal - mapea exactamente a la tabla guides
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Guide {
    pub id: i64,
    pub guide_number: String,
    pub business_id: i64,
    pub branch_id: i64,
    pub courier_id: Option<i64>,
    pub coordinator_id: Option<i64>,
    pub current_state: GuideState,
    pub base_price: Decimal,
    pub courier_commission: Option<Decimal>,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub recipient_address: String,
    pub recipient_city: String,
    pub recipient_state: String,
    pub observations: Option<String>,
    pub assignment_accepted: bool,
    pub accepted_at: Option<DateTime<Utc>>,
    pub assignment_date: Option<DateTime<Utc>>,
    pub pickup_date: Option<DateTime<Utc>>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub cancellation_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Guide {
    /// Agregar una nota al rastro de observaciones sin sobrescribir lo anterior
    pub fn append_observation(&mut self, label: &str, note: &str, at: DateTime<Utc>) {
        let line = format!("[{}] {}: {}", at.format("%Y-%m-%d %H:%M"), label, note);
        self.observations = Some(match self.observations.take() {
            Some(existing) if !existing.trim().is_empty() => format!("{}\n{}", existing, line),
            _ => line,
        });
    }

    pub fn is_assigned_to(&self, courier_id: i64) -> bool {
        self.courier_id == Some(courier_id)
    }
}

/// Datos para insertar una nueva guía (estado inicial Creada)
#[derive(Debug, Clone)]
pub struct NewGuide {
    pub guide_number: String,
    pub business_id: i64,
    pub branch_id: i64,
    pub base_price: Decimal,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub recipient_address: String,
    pub recipient_city: String,
    pub recipient_state: String,
    pub observations: Option<String>,
}
