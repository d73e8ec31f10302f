//! Servicio de asignación
//!
//! Asigna y reasigna mensajeros. Antes de cualquier escritura verifica el
//! estado de la guía, la capacidad del coordinador, la elegibilidad del
//! mensajero y su contrato vigente; la comisión se recalcula siempre con
//! la tasa del contrato del nuevo mensajero.

use chrono::Utc;

use crate::models::{Guide, GuideState};
use crate::services::commission::compute_commission;
use crate::services::context::{load_guide_for_update, ServiceContext};
use crate::services::lifecycle_engine;
use crate::services::notification_service::Notification;
use crate::utils::errors::{invalid_state_error, validation_error, AppResult};
use crate::utils::validation::{optional_text, require_text};

pub struct AssignmentService {
    ctx: ServiceContext,
}

impl AssignmentService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Asignar un mensajero a una guía en estado Creada
    pub async fn assign(
        &self,
        guide_id: i64,
        courier_id: i64,
        coordinator_id: i64,
        observations: Option<&str>,
    ) -> AppResult<Guide> {
        let now = Utc::now();
        let notes = optional_text(observations);

        let mut uow = self.ctx.store.begin().await?;
        let mut guide = load_guide_for_update(uow.as_mut(), guide_id).await?;

        if guide.current_state != GuideState::Creada {
            return Err(invalid_state_error(guide.id, guide.current_state, "assign courier"));
        }

        let coordinator = self.ctx.require_coordinator(coordinator_id, "assign courier").await?;
        let (courier, contract) = self.ctx.eligible_courier(courier_id, now.date_naive()).await?;
        let commission = compute_commission(guide.base_price, contract.commission_percentage)?;

        guide.courier_id = Some(courier.id);
        guide.coordinator_id = Some(coordinator.id);
        guide.courier_commission = Some(commission);
        guide.assignment_accepted = false;
        guide.accepted_at = None;

        let mut observation = format!(
            "Asignada al mensajero {} (#{}) con comisión {}",
            courier.full_name, courier.id, commission
        );
        if let Some(notes) = &notes {
            observation.push_str(&format!(". {}", notes));
        }

        lifecycle_engine::apply_transition(
            uow.as_mut(),
            &mut guide,
            GuideState::Asignada,
            coordinator.id,
            &observation,
            now,
        )
        .await?;
        uow.commit().await?;
        drop(uow);

        tracing::info!(
            "✅ Guía {} asignada al mensajero {} (comisión {})",
            guide.guide_number,
            courier.id,
            commission
        );

        let mut notifications = vec![Notification::new(
            courier.email.clone(),
            format!("Nueva guía asignada {}", guide.guide_number),
            format!(
                "Se te asignó la guía {} para {} ({}, {}). Confirma si la aceptas.",
                guide.guide_number, guide.recipient_name, guide.recipient_address, guide.recipient_city
            ),
        )];
        if let Some(email) = self.ctx.business_email(guide.business_id).await {
            notifications.push(Notification::new(
                email,
                format!("Guía {} asignada", guide.guide_number),
                format!("La guía {} fue asignada a un mensajero.", guide.guide_number),
            ));
        }
        self.ctx.notify(notifications).await;

        Ok(guide)
    }

    /// Reasignar la guía a otro mensajero (desde Asignada o Incidencia)
    pub async fn reassign(
        &self,
        guide_id: i64,
        new_courier_id: i64,
        reason: &str,
        coordinator_id: i64,
    ) -> AppResult<Guide> {
        let now = Utc::now();
        let reason = require_text("reason", reason)?;

        let mut uow = self.ctx.store.begin().await?;
        let mut guide = load_guide_for_update(uow.as_mut(), guide_id).await?;

        if !matches!(guide.current_state, GuideState::Asignada | GuideState::Incidencia) {
            return Err(invalid_state_error(guide.id, guide.current_state, "reassign courier"));
        }
        if guide.current_state == GuideState::Asignada && guide.courier_id == Some(new_courier_id) {
            return Err(validation_error(
                "new_courier_id",
                "guide is already assigned to this courier",
            ));
        }

        let coordinator = self.ctx.require_coordinator(coordinator_id, "reassign courier").await?;
        let (courier, contract) = self
            .ctx
            .eligible_courier(new_courier_id, now.date_naive())
            .await?;
        let commission = compute_commission(guide.base_price, contract.commission_percentage)?;

        let previous_courier_id = guide.courier_id;
        guide.courier_id = Some(courier.id);
        guide.coordinator_id = Some(coordinator.id);
        guide.courier_commission = Some(commission);
        guide.assignment_accepted = false;
        guide.accepted_at = None;

        let observation = format!(
            "Reasignada del mensajero {} al mensajero #{} ({}) con comisión {}. Motivo: {}",
            previous_courier_id
                .map(|id| format!("#{}", id))
                .unwrap_or_else(|| "sin asignar".to_string()),
            courier.id,
            courier.full_name,
            commission,
            reason
        );

        if guide.current_state == GuideState::Incidencia {
            lifecycle_engine::apply_transition(
                uow.as_mut(),
                &mut guide,
                GuideState::Asignada,
                coordinator.id,
                &observation,
                now,
            )
            .await?;
        } else {
            guide.assignment_date = Some(now);
            lifecycle_engine::record_event(uow.as_mut(), &mut guide, coordinator.id, &observation, now)
                .await?;
        }
        uow.commit().await?;
        drop(uow);

        tracing::info!(
            "🔄 Guía {} reasignada: {:?} -> {}",
            guide.guide_number,
            previous_courier_id,
            courier.id
        );

        let mut notifications = vec![Notification::new(
            courier.email.clone(),
            format!("Nueva guía asignada {}", guide.guide_number),
            format!(
                "Se te reasignó la guía {} para {} ({}, {}). Confirma si la aceptas.",
                guide.guide_number, guide.recipient_name, guide.recipient_address, guide.recipient_city
            ),
        )];
        if previous_courier_id != Some(courier.id) {
            if let Some(email) = self.ctx.user_email(previous_courier_id).await {
                notifications.push(Notification::new(
                    email,
                    format!("Guía {} reasignada", guide.guide_number),
                    format!("La guía {} ya no está a tu cargo. Motivo: {}", guide.guide_number, reason),
                ));
            }
        }
        if let Some(email) = self.ctx.business_email(guide.business_id).await {
            notifications.push(Notification::new(
                email,
                format!("Guía {} reasignada", guide.guide_number),
                format!("La guía {} fue reasignada a otro mensajero.", guide.guide_number),
            ));
        }
        self.ctx.notify(notifications).await;

        Ok(guide)
    }
}
