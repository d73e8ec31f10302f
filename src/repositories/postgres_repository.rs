//! Repositorio PostgreSQL
//!
//! Cada unidad de trabajo es una transacción `sqlx`; las lecturas con
//! bloqueo usan `SELECT ... FOR UPDATE` para serializar operaciones
//! concurrentes sobre la misma guía.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use super::{Directory, GuideStore, UnitOfWork};
use crate::models::{
    Business, Cancellation, CancellationInitiator, CancellationType, Contract, Guide, GuideState,
    HistoryEntry, Incident, IncidentType, LoyaltyLevel, NewCancellation, NewGuide,
    NewHistoryEntry, NewIncident, User,
};
use crate::utils::errors::{AppError, AppResult};

const UNIQUE_VIOLATION: &str = "23505";

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}

#[derive(Clone)]
pub struct PgGuideStore {
    pool: PgPool,
}

impl PgGuideStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GuideStore for PgGuideStore {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx: Some(tx) }))
    }
}

pub struct PgUnitOfWork {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgUnitOfWork {
    fn conn(&mut self) -> AppResult<&mut PgConnection> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| AppError::Internal("unit of work already committed".to_string()))
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn lock_guide(&mut self, guide_id: i64) -> AppResult<Option<Guide>> {
        let guide = sqlx::query_as::<_, Guide>("SELECT * FROM guides WHERE id = $1 FOR UPDATE")
            .bind(guide_id)
            .fetch_optional(self.conn()?)
            .await?;

        Ok(guide)
    }

    async fn find_guide(&mut self, guide_id: i64) -> AppResult<Option<Guide>> {
        let guide = sqlx::query_as::<_, Guide>("SELECT * FROM guides WHERE id = $1")
            .bind(guide_id)
            .fetch_optional(self.conn()?)
            .await?;

        Ok(guide)
    }

    async fn guide_number_exists(&mut self, guide_number: &str) -> AppResult<bool> {
        let result: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM guides WHERE guide_number = $1)")
                .bind(guide_number)
                .fetch_one(self.conn()?)
                .await?;

        Ok(result.0)
    }

    async fn insert_guide(&mut self, guide: &NewGuide, at: DateTime<Utc>) -> AppResult<Guide> {
        let created = sqlx::query_as::<_, Guide>(
            r#"
            INSERT INTO guides (
                guide_number, business_id, branch_id, current_state, base_price,
                recipient_name, recipient_phone, recipient_address, recipient_city,
                recipient_state, observations, assignment_accepted, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, FALSE, $12, $12)
            RETURNING *
            "#,
        )
        .bind(&guide.guide_number)
        .bind(guide.business_id)
        .bind(guide.branch_id)
        .bind(GuideState::Creada)
        .bind(guide.base_price)
        .bind(&guide.recipient_name)
        .bind(&guide.recipient_phone)
        .bind(&guide.recipient_address)
        .bind(&guide.recipient_city)
        .bind(&guide.recipient_state)
        .bind(&guide.observations)
        .bind(at)
        .fetch_one(self.conn()?)
        .await?;

        Ok(created)
    }

    async fn update_guide(&mut self, guide: &Guide) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE guides
            SET courier_id = $2, coordinator_id = $3, current_state = $4,
                courier_commission = $5, observations = $6, assignment_accepted = $7,
                accepted_at = $8, assignment_date = $9, pickup_date = $10,
                delivery_date = $11, cancellation_date = $12, updated_at = $13
            WHERE id = $1
            "#,
        )
        .bind(guide.id)
        .bind(guide.courier_id)
        .bind(guide.coordinator_id)
        .bind(guide.current_state)
        .bind(guide.courier_commission)
        .bind(&guide.observations)
        .bind(guide.assignment_accepted)
        .bind(guide.accepted_at)
        .bind(guide.assignment_date)
        .bind(guide.pickup_date)
        .bind(guide.delivery_date)
        .bind(guide.cancellation_date)
        .bind(guide.updated_at)
        .execute(self.conn()?)
        .await?;

        Ok(())
    }

    async fn append_history(&mut self, entry: &NewHistoryEntry) -> AppResult<HistoryEntry> {
        let stored = sqlx::query_as::<_, HistoryEntry>(
            r#"
            INSERT INTO guide_state_history (guide_id, state, user_id, observation, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(entry.guide_id)
        .bind(entry.state)
        .bind(entry.user_id)
        .bind(&entry.observation)
        .bind(entry.created_at)
        .fetch_one(self.conn()?)
        .await?;

        Ok(stored)
    }

    async fn history_for_guide(&mut self, guide_id: i64) -> AppResult<Vec<HistoryEntry>> {
        let entries = sqlx::query_as::<_, HistoryEntry>(
            "SELECT * FROM guide_state_history WHERE guide_id = $1 ORDER BY created_at, id",
        )
        .bind(guide_id)
        .fetch_all(self.conn()?)
        .await?;

        Ok(entries)
    }

    async fn find_cancellation_by_guide(
        &mut self,
        guide_id: i64,
    ) -> AppResult<Option<Cancellation>> {
        let cancellation =
            sqlx::query_as::<_, Cancellation>("SELECT * FROM cancellations WHERE guide_id = $1")
                .bind(guide_id)
                .fetch_optional(self.conn()?)
                .await?;

        Ok(cancellation)
    }

    async fn lock_business_cancellations(&mut self, business_id: i64) -> AppResult<()> {
        // La fila existe siempre: guides.business_id la referencia
        sqlx::query("SELECT id FROM businesses WHERE id = $1 FOR UPDATE")
            .bind(business_id)
            .execute(self.conn()?)
            .await?;

        Ok(())
    }

    async fn count_business_cancellations(
        &mut self,
        business_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM cancellations
            WHERE business_id = $1 AND initiator = $2
              AND created_at >= $3 AND created_at < $4
            "#,
        )
        .bind(business_id)
        .bind(CancellationInitiator::Negocio)
        .bind(from)
        .bind(to)
        .fetch_one(self.conn()?)
        .await?;

        Ok(result.0)
    }

    async fn insert_cancellation(
        &mut self,
        cancellation: &NewCancellation,
    ) -> AppResult<Cancellation> {
        let stored = sqlx::query_as::<_, Cancellation>(
            r#"
            INSERT INTO cancellations (
                guide_id, business_id, cancelled_by, cancellation_type_id, initiator,
                reason, penalty_amount, courier_payment, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(cancellation.guide_id)
        .bind(cancellation.business_id)
        .bind(cancellation.cancelled_by)
        .bind(cancellation.cancellation_type_id)
        .bind(cancellation.initiator)
        .bind(&cancellation.reason)
        .bind(cancellation.penalty_amount)
        .bind(cancellation.courier_payment)
        .bind(cancellation.created_at)
        .fetch_one(self.conn()?)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::AlreadyCancelled { guide_id: cancellation.guide_id }
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(stored)
    }

    async fn insert_incident(&mut self, incident: &NewIncident) -> AppResult<Incident> {
        let stored = sqlx::query_as::<_, Incident>(
            r#"
            INSERT INTO incidents (
                guide_id, incident_type_id, description, reported_by, resolved, created_at
            )
            VALUES ($1, $2, $3, $4, FALSE, $5)
            RETURNING *
            "#,
        )
        .bind(incident.guide_id)
        .bind(incident.incident_type_id)
        .bind(&incident.description)
        .bind(incident.reported_by)
        .bind(incident.created_at)
        .fetch_one(self.conn()?)
        .await?;

        Ok(stored)
    }

    async fn lock_incident(&mut self, incident_id: i64) -> AppResult<Option<Incident>> {
        let incident =
            sqlx::query_as::<_, Incident>("SELECT * FROM incidents WHERE id = $1 FOR UPDATE")
                .bind(incident_id)
                .fetch_optional(self.conn()?)
                .await?;

        Ok(incident)
    }

    async fn update_incident(&mut self, incident: &Incident) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE incidents
            SET resolved = $2, resolution = $3, resolved_by = $4, resolved_at = $5
            WHERE id = $1
            "#,
        )
        .bind(incident.id)
        .bind(incident.resolved)
        .bind(&incident.resolution)
        .bind(incident.resolved_by)
        .bind(incident.resolved_at)
        .execute(self.conn()?)
        .await?;

        Ok(())
    }

    async fn incidents_for_guide(&mut self, guide_id: i64) -> AppResult<Vec<Incident>> {
        let incidents = sqlx::query_as::<_, Incident>(
            "SELECT * FROM incidents WHERE guide_id = $1 ORDER BY created_at, id",
        )
        .bind(guide_id)
        .fetch_all(self.conn()?)
        .await?;

        Ok(incidents)
    }

    async fn commit(&mut self) -> AppResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| AppError::Internal("unit of work already committed".to_string()))?;
        tx.commit().await?;
        Ok(())
    }
}

/// Consultas de referencia sobre el pool (sin transacción)
#[derive(Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Directory for PgDirectory {
    async fn find_user(&self, user_id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, full_name, email, role, active FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_business(&self, business_id: i64) -> AppResult<Option<Business>> {
        let business = sqlx::query_as::<_, Business>(
            "SELECT id, name, email, loyalty_level_id, active FROM businesses WHERE id = $1",
        )
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(business)
    }

    async fn find_loyalty_level(&self, level_id: i64) -> AppResult<Option<LoyaltyLevel>> {
        let level = sqlx::query_as::<_, LoyaltyLevel>("SELECT * FROM loyalty_levels WHERE id = $1")
            .bind(level_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(level)
    }

    async fn find_active_contract(
        &self,
        courier_id: i64,
        on_date: NaiveDate,
    ) -> AppResult<Option<Contract>> {
        let contract = sqlx::query_as::<_, Contract>(
            r#"
            SELECT * FROM contracts
            WHERE courier_id = $1
              AND active = TRUE
              AND start_date <= $2
              AND (end_date IS NULL OR end_date >= $2)
            ORDER BY start_date DESC
            LIMIT 1
            "#,
        )
        .bind(courier_id)
        .bind(on_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(contract)
    }

    async fn find_cancellation_type(&self, type_id: i64) -> AppResult<Option<CancellationType>> {
        let cancellation_type =
            sqlx::query_as::<_, CancellationType>("SELECT * FROM cancellation_types WHERE id = $1")
                .bind(type_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(cancellation_type)
    }

    async fn find_incident_type(&self, type_id: i64) -> AppResult<Option<IncidentType>> {
        let incident_type =
            sqlx::query_as::<_, IncidentType>("SELECT * FROM incident_types WHERE id = $1")
                .bind(type_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(incident_type)
    }
}
