//! Módulo de base de datos
//!
//! Maneja la conexión con PostgreSQL y las migraciones.

pub mod connection;

pub use connection::{connect, run_migrations};
