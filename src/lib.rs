//! Motor del ciclo de vida de guías de entrega
//!
//! Asignación de mensajeros, aceptación y rechazo, cancelaciones con
//! penalización por fidelidad e incidencias, con un historial auditable de
//! cada cambio de estado.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::create_app_router;
pub use state::AppState;
pub use utils::errors::{AppError, AppResult};
