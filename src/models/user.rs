//! Modelos de Usuario y Negocio
//!
//! Entidades externas de solo lectura. Los roles determinan quién puede
//! coordinar y quién puede recibir asignaciones.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

/// Rol del usuario - mapea al ENUM user_role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "user_role")]
pub enum UserRole {
    Administrador,
    Coordinador,
    Mensajero,
    Negocio,
}

/// Usuario - mapea a la tabla users
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
    pub active: bool,
}

impl User {
    pub fn can_coordinate(&self) -> bool {
        self.active && matches!(self.role, UserRole::Coordinador | UserRole::Administrador)
    }

    pub fn is_courier(&self) -> bool {
        self.role == UserRole::Mensajero
    }
}

/// Negocio - mapea a la tabla businesses
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Business {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub loyalty_level_id: Option<i64>,
    pub active: bool,
}
