//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use crate::config::EnvironmentConfig;
use crate::services::ServiceContext;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EnvironmentConfig>,
    pub services: ServiceContext,
}

impl AppState {
    pub fn new(config: EnvironmentConfig, services: ServiceContext) -> Self {
        Self {
            config: Arc::new(config),
            services,
        }
    }
}
