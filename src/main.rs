use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn};

use delivery_guides::config::{DatabaseConfig, EnvironmentConfig};
use delivery_guides::database;
use delivery_guides::repositories::{
    Directory, GuideStore, MemoryDirectory, MemoryStore, PgDirectory, PgGuideStore,
};
use delivery_guides::services::{HttpNotifier, LogNotifier, Notifier, ServiceContext};
use delivery_guides::{create_app_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();
    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    info!("🚚 Delivery Guides - ciclo de vida de guías");
    info!("================================================");
    info!("🌍 Entorno: {}", config.environment);

    let (store, directory): (Arc<dyn GuideStore>, Arc<dyn Directory>) =
        match DatabaseConfig::from_environment(&config) {
            Some(db_config) => {
                let pool = match database::connect(&db_config).await {
                    Ok(pool) => pool,
                    Err(e) => {
                        error!("❌ Error conectando a la base de datos: {:#}", e);
                        return Err(e);
                    }
                };
                (
                    Arc::new(PgGuideStore::new(pool.clone())),
                    Arc::new(PgDirectory::new(pool)),
                )
            }
            None => {
                if config.is_production() {
                    return Err(anyhow::anyhow!("DATABASE_URL must be set in production"));
                }
                warn!("⚠️ DATABASE_URL no definida: almacenamiento en memoria (solo desarrollo, los datos se pierden al reiniciar)");
                warn!("⚠️ Directorio de demostración: coordinador 1, mensajeros 2 y 3, usuario de negocio 4, negocios 1 y 2");
                (
                    Arc::new(MemoryStore::new()),
                    Arc::new(MemoryDirectory::with_demo_data().await),
                )
            }
        };

    let notifier: Arc<dyn Notifier> = match &config.notifier_url {
        Some(url) => {
            info!("📧 Notificaciones vía relay HTTP: {}", url);
            Arc::new(HttpNotifier::new(
                reqwest::Client::new(),
                url.clone(),
                config.notifier_from.clone(),
            ))
        }
        None => {
            info!("📧 Notificaciones solo en logs");
            Arc::new(LogNotifier)
        }
    };

    let addr: SocketAddr = config.server_url().parse()?;
    let services = ServiceContext::new(store, directory, notifier);
    let app = create_app_router(AppState::new(config, services));

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health");
    info!("   POST /api/guides - Crear guía");
    info!("   GET  /api/guides/:id - Obtener guía");
    info!("   GET  /api/guides/:id/history - Historial");
    info!("   POST /api/guides/:id/assign | reassign - Asignación");
    info!("   POST /api/guides/:id/accept | reject | pickup | in-transit | deliver - Mensajero");
    info!("   POST /api/guides/:id/cancel, GET /api/guides/:id/cancellation - Cancelación");
    info!("   POST|GET /api/guides/:id/incidents, POST /api/incidents/:id/resolve - Incidencias");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo escuchar Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo escuchar SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
