//! Servicio de cancelación
//!
//! Cancela guías que aún no han sido recogidas y calcula la penalización
//! según quién origina la cancelación y el nivel de fidelidad del negocio.

use chrono::Utc;
use rust_decimal::Decimal;

use crate::models::{Cancellation, Guide, GuideState, NewCancellation};
use crate::services::context::{load_guide_for_update, ServiceContext};
use crate::services::lifecycle_engine;
use crate::services::notification_service::Notification;
use crate::services::penalty::{compute_penalty, month_bounds};
use crate::utils::errors::{invalid_state_error, not_found_error, AppError, AppResult};
use crate::utils::validation::{optional_text, require_text};

pub struct CancellationService {
    ctx: ServiceContext,
}

impl CancellationService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Cancelar una guía en estado Creada o Asignada
    pub async fn cancel(
        &self,
        guide_id: i64,
        cancellation_type_id: i64,
        reason: &str,
        user_id: i64,
        notes: Option<&str>,
    ) -> AppResult<(Cancellation, Guide)> {
        let now = Utc::now();
        let notes = optional_text(notes);

        let mut uow = self.ctx.store.begin().await?;
        let mut guide = load_guide_for_update(uow.as_mut(), guide_id).await?;

        if uow.find_cancellation_by_guide(guide.id).await?.is_some() {
            return Err(AppError::AlreadyCancelled { guide_id: guide.id });
        }
        if guide.pickup_date.is_some() {
            return Err(AppError::CannotCancelAfterPickup { guide_id: guide.id });
        }
        if !matches!(guide.current_state, GuideState::Creada | GuideState::Asignada) {
            return Err(invalid_state_error(guide.id, guide.current_state, "cancel guide"));
        }
        let reason = require_text("reason", reason)?;

        let cancellation_type = self
            .ctx
            .directory
            .find_cancellation_type(cancellation_type_id)
            .await?
            .ok_or_else(|| not_found_error("CancellationType", cancellation_type_id))?;
        let user = self.ctx.require_user(user_id).await?;

        let loyalty_level = match self.ctx.directory.find_business(guide.business_id).await? {
            Some(business) => match business.loyalty_level_id {
                Some(level_id) => self.ctx.directory.find_loyalty_level(level_id).await?,
                None => None,
            },
            None => None,
        };

        let (period_start, period_end) = month_bounds(now);
        uow.lock_business_cancellations(guide.business_id).await?;
        let used_this_month = uow
            .count_business_cancellations(guide.business_id, period_start, period_end)
            .await?;

        let commission = guide.courier_commission.unwrap_or(Decimal::ZERO);
        let outcome = compute_penalty(
            commission,
            cancellation_type.initiator,
            loyalty_level.as_ref(),
            used_this_month,
        );

        let cancellation = uow
            .insert_cancellation(&NewCancellation {
                guide_id: guide.id,
                business_id: guide.business_id,
                cancelled_by: user.id,
                cancellation_type_id: cancellation_type.id,
                initiator: cancellation_type.initiator,
                reason: reason.clone(),
                penalty_amount: outcome.penalty_amount,
                courier_payment: outcome.courier_payment,
                created_at: now,
            })
            .await?;

        guide.append_observation("Cancelación", &reason, now);
        if let Some(notes) = &notes {
            guide.append_observation("Notas de cancelación", notes, now);
        }

        let mut observation = format!(
            "Cancelada ({}, {}): {}. Penalización {}, pago al mensajero {}",
            cancellation_type.name,
            cancellation_type.initiator,
            reason,
            outcome.penalty_amount,
            outcome.courier_payment
        );
        if outcome.free_cancellation_used {
            observation.push_str(". Cancelación gratuita del mes");
        }

        lifecycle_engine::apply_transition(
            uow.as_mut(),
            &mut guide,
            GuideState::Cancelada,
            user.id,
            &observation,
            now,
        )
        .await?;
        uow.commit().await?;
        drop(uow);

        tracing::info!(
            "🚫 Guía {} cancelada por {} (penalización {}, pago mensajero {})",
            guide.guide_number,
            cancellation_type.initiator,
            outcome.penalty_amount,
            outcome.courier_payment
        );

        let mut notifications = Vec::new();
        if let Some(email) = self.ctx.business_email(guide.business_id).await {
            notifications.push(Notification::new(
                email,
                format!("Guía {} cancelada", guide.guide_number),
                format!(
                    "La guía {} fue cancelada. Motivo: {}. Penalización: {}.",
                    guide.guide_number, reason, outcome.penalty_amount
                ),
            ));
        }
        if let Some(email) = self.ctx.user_email(guide.courier_id).await {
            notifications.push(Notification::new(
                email,
                format!("Guía {} cancelada", guide.guide_number),
                format!(
                    "La guía {} fue cancelada. Pago por la cancelación: {}.",
                    guide.guide_number, outcome.courier_payment
                ),
            ));
        }
        self.ctx.notify(notifications).await;

        Ok((cancellation, guide))
    }
}
