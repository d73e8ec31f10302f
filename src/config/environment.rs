//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno. Las variables se leen
//! una sola vez al arrancar (después de `dotenvy`).

use std::env;

use anyhow::{Context, Result};

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub cors_origins: Vec<String>,
    pub log_level: tracing::Level,
    /// Relay HTTP de correo; sin él las notificaciones solo se registran
    pub notifier_url: Option<String>,
    pub notifier_from: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            database_url: None,
            database_max_connections: 20,
            cors_origins: Vec::new(),
            log_level: tracing::Level::INFO,
            notifier_url: None,
            notifier_from: "no-reply@guias.local".to_string(),
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl EnvironmentConfig {
    /// Leer la configuración desde variables de entorno
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let port = match optional_var("PORT") {
            Some(port) => port.parse().context("PORT must be a valid number")?,
            None => defaults.port,
        };
        let database_max_connections = match optional_var("DATABASE_MAX_CONNECTIONS") {
            Some(max) => max
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a valid number")?,
            None => defaults.database_max_connections,
        };
        let log_level = match optional_var("LOG_LEVEL") {
            Some(level) => level
                .parse()
                .map_err(|_| anyhow::anyhow!("LOG_LEVEL must be one of trace, debug, info, warn, error"))?,
            None => defaults.log_level,
        };

        Ok(Self {
            environment: optional_var("ENVIRONMENT").unwrap_or(defaults.environment),
            port,
            host: optional_var("HOST").unwrap_or(defaults.host),
            database_url: optional_var("DATABASE_URL"),
            database_max_connections,
            cors_origins: optional_var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            log_level,
            notifier_url: optional_var("NOTIFIER_URL"),
            notifier_from: optional_var("NOTIFIER_FROM").unwrap_or(defaults.notifier_from),
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la dirección del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
