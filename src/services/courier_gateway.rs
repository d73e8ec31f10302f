//! Pasarela del mensajero
//!
//! Aceptación o rechazo de una asignación y los avances que reporta el
//! propio mensajero (recogida, en ruta, entrega). Toda operación exige que
//! la guía esté asignada al mensajero que actúa.

use chrono::Utc;

use crate::models::{Guide, GuideState};
use crate::services::context::{ensure_assigned_to, load_guide_for_update, ServiceContext};
use crate::services::lifecycle_engine;
use crate::services::notification_service::Notification;
use crate::utils::errors::{invalid_state_error, AppError, AppResult};
use crate::utils::validation::{optional_text, require_text};

pub struct CourierGateway {
    ctx: ServiceContext,
}

fn with_notes(mut observation: String, notes: Option<&String>) -> String {
    if let Some(notes) = notes {
        observation.push_str(&format!(". {}", notes));
    }
    observation
}

/// Con una incidencia abierta el mensajero no puede avanzar la guía
fn ensure_not_in_incident(guide: &Guide, action: &str) -> AppResult<()> {
    if guide.current_state == GuideState::Incidencia {
        return Err(invalid_state_error(guide.id, guide.current_state, action));
    }
    Ok(())
}

impl CourierGateway {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Aceptar la asignación (sin cambio de estado)
    pub async fn accept(&self, guide_id: i64, courier_id: i64, notes: Option<&str>) -> AppResult<Guide> {
        let now = Utc::now();
        let notes = optional_text(notes);

        let mut uow = self.ctx.store.begin().await?;
        let mut guide = load_guide_for_update(uow.as_mut(), guide_id).await?;

        if guide.current_state != GuideState::Asignada {
            return Err(invalid_state_error(guide.id, guide.current_state, "accept assignment"));
        }
        ensure_assigned_to(&guide, courier_id, "accept assignment")?;
        if guide.assignment_accepted {
            return Err(AppError::AlreadyAccepted { guide_id: guide.id });
        }

        guide.assignment_accepted = true;
        guide.accepted_at = Some(now);

        let observation = with_notes(
            format!("Asignación aceptada por el mensajero #{}", courier_id),
            notes.as_ref(),
        );
        lifecycle_engine::record_event(uow.as_mut(), &mut guide, courier_id, &observation, now).await?;
        uow.commit().await?;

        tracing::info!("👍 Guía {} aceptada por el mensajero {}", guide.guide_number, courier_id);
        Ok(guide)
    }

    /// Rechazar la asignación antes de aceptarla: la guía vuelve a Creada
    pub async fn reject(&self, guide_id: i64, courier_id: i64, reason: &str) -> AppResult<Guide> {
        let now = Utc::now();
        let reason = require_text("reason", reason)?;

        let mut uow = self.ctx.store.begin().await?;
        let mut guide = load_guide_for_update(uow.as_mut(), guide_id).await?;

        if guide.current_state != GuideState::Asignada {
            return Err(invalid_state_error(guide.id, guide.current_state, "reject assignment"));
        }
        ensure_assigned_to(&guide, courier_id, "reject assignment")?;
        if guide.assignment_accepted {
            return Err(AppError::AlreadyAccepted { guide_id: guide.id });
        }

        // El coordinador se conserva como último responsable de la guía
        guide.courier_id = None;
        guide.courier_commission = None;
        guide.assignment_accepted = false;
        guide.accepted_at = None;

        let observation = format!("Asignación rechazada por el mensajero #{}: {}", courier_id, reason);
        lifecycle_engine::apply_transition(
            uow.as_mut(),
            &mut guide,
            GuideState::Creada,
            courier_id,
            &observation,
            now,
        )
        .await?;
        uow.commit().await?;
        drop(uow);

        tracing::info!("👎 Guía {} rechazada por el mensajero {}", guide.guide_number, courier_id);

        if let Some(email) = self.ctx.user_email(guide.coordinator_id).await {
            self.ctx
                .notify(vec![Notification::new(
                    email,
                    format!("Guía {} rechazada", guide.guide_number),
                    format!(
                        "El mensajero #{} rechazó la guía {}. Motivo: {}. Requiere nueva asignación.",
                        courier_id, guide.guide_number, reason
                    ),
                )])
                .await;
        }

        Ok(guide)
    }

    /// Marcar la recogida (requiere asignación aceptada)
    pub async fn mark_picked_up(&self, guide_id: i64, courier_id: i64, notes: Option<&str>) -> AppResult<Guide> {
        let now = Utc::now();
        let notes = optional_text(notes);

        let mut uow = self.ctx.store.begin().await?;
        let mut guide = load_guide_for_update(uow.as_mut(), guide_id).await?;

        ensure_assigned_to(&guide, courier_id, "mark pickup")?;
        if guide.current_state == GuideState::Asignada && !guide.assignment_accepted {
            return Err(invalid_state_error(
                guide.id,
                guide.current_state,
                "mark pickup before accepting the assignment",
            ));
        }

        let observation = with_notes(format!("Recogida por el mensajero #{}", courier_id), notes.as_ref());
        lifecycle_engine::apply_transition(
            uow.as_mut(),
            &mut guide,
            GuideState::Recogida,
            courier_id,
            &observation,
            now,
        )
        .await?;
        uow.commit().await?;

        Ok(guide)
    }

    /// Marcar la guía en ruta
    pub async fn mark_in_transit(&self, guide_id: i64, courier_id: i64, notes: Option<&str>) -> AppResult<Guide> {
        let now = Utc::now();
        let notes = optional_text(notes);

        let mut uow = self.ctx.store.begin().await?;
        let mut guide = load_guide_for_update(uow.as_mut(), guide_id).await?;

        ensure_assigned_to(&guide, courier_id, "mark in transit")?;
        ensure_not_in_incident(&guide, "mark in transit")?;

        let observation = with_notes(format!("En ruta con el mensajero #{}", courier_id), notes.as_ref());
        lifecycle_engine::apply_transition(
            uow.as_mut(),
            &mut guide,
            GuideState::EnRuta,
            courier_id,
            &observation,
            now,
        )
        .await?;
        uow.commit().await?;

        Ok(guide)
    }

    /// Marcar la entrega (estado final)
    pub async fn mark_delivered(&self, guide_id: i64, courier_id: i64, notes: Option<&str>) -> AppResult<Guide> {
        let now = Utc::now();
        let notes = optional_text(notes);

        let mut uow = self.ctx.store.begin().await?;
        let mut guide = load_guide_for_update(uow.as_mut(), guide_id).await?;

        ensure_assigned_to(&guide, courier_id, "mark delivered")?;
        ensure_not_in_incident(&guide, "mark delivered")?;

        let observation = with_notes(format!("Entregada por el mensajero #{}", courier_id), notes.as_ref());
        lifecycle_engine::apply_transition(
            uow.as_mut(),
            &mut guide,
            GuideState::Entregada,
            courier_id,
            &observation,
            now,
        )
        .await?;
        uow.commit().await?;
        drop(uow);

        tracing::info!("📦 Guía {} entregada", guide.guide_number);

        if let Some(email) = self.ctx.business_email(guide.business_id).await {
            self.ctx
                .notify(vec![Notification::new(
                    email,
                    format!("Guía {} entregada", guide.guide_number),
                    format!("La guía {} fue entregada a {}.", guide.guide_number, guide.recipient_name),
                )])
                .await;
        }

        Ok(guide)
    }
}
