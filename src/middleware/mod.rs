//! Middleware del sistema
//!
//! Este módulo contiene el CORS y el extractor del usuario que actúa.

pub mod acting_user;
pub mod cors;

pub use acting_user::ActingUser;
pub use cors::cors_from_config;
