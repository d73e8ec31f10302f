//! Repositorios
//!
//! Define los contratos de persistencia del núcleo:
//! - [`GuideStore`] abre unidades de trabajo atómicas sobre guías,
//!   historial, cancelaciones e incidencias (lo único que el núcleo posee).
//! - [`Directory`] consulta entidades de referencia de solo lectura
//!   (usuarios, negocios, niveles de fidelidad, contratos y catálogos).
//!
//! Hay dos implementaciones: PostgreSQL (`sqlx`) y memoria.

pub mod memory_repository;
pub mod postgres_repository;

pub use memory_repository::{MemoryDirectory, MemoryStore};
pub use postgres_repository::{PgDirectory, PgGuideStore};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{
    Business, Cancellation, CancellationType, Contract, Guide, HistoryEntry, Incident,
    IncidentType, LoyaltyLevel, NewCancellation, NewGuide, NewHistoryEntry, NewIncident, User,
};
use crate::utils::errors::AppResult;

/// Fábrica de unidades de trabajo
#[async_trait]
pub trait GuideStore: Send + Sync {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>>;
}

/// Unidad de trabajo atómica.
///
/// Las lecturas `lock_*` bloquean la fila hasta el final de la unidad.
/// Nada es visible para otras unidades hasta `commit`; soltar la unidad
/// sin confirmar descarta todos los cambios.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn lock_guide(&mut self, guide_id: i64) -> AppResult<Option<Guide>>;
    async fn find_guide(&mut self, guide_id: i64) -> AppResult<Option<Guide>>;
    async fn guide_number_exists(&mut self, guide_number: &str) -> AppResult<bool>;
    async fn insert_guide(&mut self, guide: &NewGuide, at: DateTime<Utc>) -> AppResult<Guide>;
    async fn update_guide(&mut self, guide: &Guide) -> AppResult<()>;

    async fn append_history(&mut self, entry: &NewHistoryEntry) -> AppResult<HistoryEntry>;
    async fn history_for_guide(&mut self, guide_id: i64) -> AppResult<Vec<HistoryEntry>>;

    async fn find_cancellation_by_guide(&mut self, guide_id: i64)
        -> AppResult<Option<Cancellation>>;
    /// Bloquea las cancelaciones del negocio hasta el final de la unidad.
    /// Debe tomarse antes de `count_business_cancellations`.
    async fn lock_business_cancellations(&mut self, business_id: i64) -> AppResult<()>;
    /// Cancelaciones iniciadas por el negocio en `[from, to)`
    async fn count_business_cancellations(
        &mut self,
        business_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<i64>;
    async fn insert_cancellation(&mut self, cancellation: &NewCancellation)
        -> AppResult<Cancellation>;

    async fn insert_incident(&mut self, incident: &NewIncident) -> AppResult<Incident>;
    async fn lock_incident(&mut self, incident_id: i64) -> AppResult<Option<Incident>>;
    async fn update_incident(&mut self, incident: &Incident) -> AppResult<()>;
    async fn incidents_for_guide(&mut self, guide_id: i64) -> AppResult<Vec<Incident>>;

    async fn commit(&mut self) -> AppResult<()>;
}

/// Consultas de referencia (entidades gestionadas fuera del núcleo)
#[async_trait]
pub trait Directory: Send + Sync {
    async fn find_user(&self, user_id: i64) -> AppResult<Option<User>>;
    async fn find_business(&self, business_id: i64) -> AppResult<Option<Business>>;
    async fn find_loyalty_level(&self, level_id: i64) -> AppResult<Option<LoyaltyLevel>>;
    async fn find_active_contract(
        &self,
        courier_id: i64,
        on_date: NaiveDate,
    ) -> AppResult<Option<Contract>>;
    async fn find_cancellation_type(&self, type_id: i64) -> AppResult<Option<CancellationType>>;
    async fn find_incident_type(&self, type_id: i64) -> AppResult<Option<IncidentType>>;
}
