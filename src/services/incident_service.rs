//! Servicio de incidencias
//!
//! Reporte y resolución de incidencias durante la entrega. Una guía puede
//! acumular varias incidencias abiertas; sale de `Incidencia` cuando se
//! resuelve la última o cuando la resolución reprograma la entrega.

use chrono::Utc;

use crate::models::{Guide, GuideState, Incident, NewIncident};
use crate::services::commission::compute_commission;
use crate::services::context::{load_guide_for_update, ServiceContext};
use crate::services::lifecycle_engine;
use crate::services::notification_service::Notification;
use crate::utils::errors::{invalid_state_error, not_found_error, AppError, AppResult};
use crate::utils::validation::require_text;

/// Estados desde los que se puede reportar una incidencia
const REPORTABLE_STATES: [GuideState; 4] = [
    GuideState::Asignada,
    GuideState::Recogida,
    GuideState::EnRuta,
    GuideState::Incidencia,
];

/// Parámetros de resolución
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub resolution: String,
    pub new_courier_id: Option<i64>,
    pub reschedule: bool,
}

pub struct IncidentService {
    ctx: ServiceContext,
}

impl IncidentService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Reportar una incidencia sobre una guía en curso
    pub async fn report(
        &self,
        guide_id: i64,
        incident_type_id: i64,
        description: &str,
        reporter_id: i64,
    ) -> AppResult<(Incident, Guide)> {
        let now = Utc::now();

        let mut uow = self.ctx.store.begin().await?;
        let mut guide = load_guide_for_update(uow.as_mut(), guide_id).await?;

        if !REPORTABLE_STATES.contains(&guide.current_state) {
            return Err(invalid_state_error(guide.id, guide.current_state, "report incident"));
        }
        let description = require_text("description", description)?;
        let incident_type = self
            .ctx
            .directory
            .find_incident_type(incident_type_id)
            .await?
            .ok_or_else(|| not_found_error("IncidentType", incident_type_id))?;
        let reporter = self.ctx.require_user(reporter_id).await?;

        let incident = uow
            .insert_incident(&NewIncident {
                guide_id: guide.id,
                incident_type_id: incident_type.id,
                description: description.clone(),
                reported_by: reporter.id,
                created_at: now,
            })
            .await?;

        let observation = format!(
            "Incidencia #{} ({}) reportada: {}",
            incident.id, incident_type.name, description
        );
        if guide.current_state == GuideState::Incidencia {
            lifecycle_engine::record_event(uow.as_mut(), &mut guide, reporter.id, &observation, now).await?;
        } else {
            lifecycle_engine::apply_transition(
                uow.as_mut(),
                &mut guide,
                GuideState::Incidencia,
                reporter.id,
                &observation,
                now,
            )
            .await?;
        }
        uow.commit().await?;
        drop(uow);

        tracing::warn!(
            "⚠️ Incidencia {} en guía {}: {}",
            incident.id,
            guide.guide_number,
            incident_type.name
        );

        let mut notifications = Vec::new();
        if let Some(email) = self.ctx.business_email(guide.business_id).await {
            notifications.push(Notification::new(
                email,
                format!("Incidencia en la guía {}", guide.guide_number),
                format!(
                    "Se reportó una incidencia ({}) en la guía {}: {}",
                    incident_type.name, guide.guide_number, description
                ),
            ));
        }
        if let Some(email) = self.ctx.user_email(guide.courier_id).await {
            notifications.push(Notification::new(
                email,
                format!("Incidencia en la guía {}", guide.guide_number),
                format!("La guía {} quedó en incidencia: {}", guide.guide_number, description),
            ));
        }
        self.ctx.notify(notifications).await;

        Ok((incident, guide))
    }

    /// Resolver una incidencia, opcionalmente reasignando la guía
    pub async fn resolve(
        &self,
        incident_id: i64,
        params: Resolution,
        resolver_id: i64,
    ) -> AppResult<(Incident, Guide)> {
        let now = Utc::now();

        let mut uow = self.ctx.store.begin().await?;
        let mut incident = uow
            .lock_incident(incident_id)
            .await?
            .ok_or_else(|| not_found_error("Incident", incident_id))?;

        if incident.resolved {
            return Err(AppError::AlreadyResolved { incident_id: incident.id });
        }
        let resolution = require_text("resolution", &params.resolution)?;
        let resolver = self.ctx.require_user(resolver_id).await?;

        let mut guide = load_guide_for_update(uow.as_mut(), incident.guide_id).await?;
        let previous_courier_id = guide.courier_id;

        let mut reassigned_to = None;
        if let Some(new_courier_id) = params.new_courier_id {
            if !matches!(guide.current_state, GuideState::Asignada | GuideState::Incidencia) {
                return Err(invalid_state_error(
                    guide.id,
                    guide.current_state,
                    "reassign courier while resolving incident",
                ));
            }
            let coordinator = self
                .ctx
                .require_coordinator(resolver.id, "reassign courier while resolving incident")
                .await?;
            let (courier, contract) = self
                .ctx
                .eligible_courier(new_courier_id, now.date_naive())
                .await?;
            let commission = compute_commission(guide.base_price, contract.commission_percentage)?;

            guide.courier_id = Some(courier.id);
            guide.coordinator_id = Some(coordinator.id);
            guide.courier_commission = Some(commission);
            guide.assignment_accepted = false;
            guide.accepted_at = None;
            reassigned_to = Some(courier);
        }

        incident.resolved = true;
        incident.resolution = Some(resolution.clone());
        incident.resolved_by = Some(resolver.id);
        incident.resolved_at = Some(now);
        uow.update_incident(&incident).await?;

        let other_open = uow
            .incidents_for_guide(guide.id)
            .await?
            .iter()
            .any(|i| i.id != incident.id && !i.resolved);

        let mut observation = format!("Incidencia #{} resuelta: {}", incident.id, resolution);
        if let Some(courier) = &reassigned_to {
            observation.push_str(&format!(
                ". Reasignada del mensajero {} al mensajero #{} ({})",
                previous_courier_id
                    .map(|id| format!("#{}", id))
                    .unwrap_or_else(|| "sin asignar".to_string()),
                courier.id,
                courier.full_name
            ));
        }
        if params.reschedule {
            observation.push_str(". Entrega reprogramada");
        }

        let returns_to_assigned = guide.current_state == GuideState::Incidencia
            && guide.courier_id.is_some()
            && (params.reschedule || !other_open);
        if returns_to_assigned {
            lifecycle_engine::apply_transition(
                uow.as_mut(),
                &mut guide,
                GuideState::Asignada,
                resolver.id,
                &observation,
                now,
            )
            .await?;
        } else {
            lifecycle_engine::record_event(uow.as_mut(), &mut guide, resolver.id, &observation, now).await?;
        }
        uow.commit().await?;
        drop(uow);

        tracing::info!(
            "✅ Incidencia {} resuelta (guía {} en {})",
            incident.id,
            guide.guide_number,
            guide.current_state
        );

        let mut notifications = Vec::new();
        if let Some(email) = self.ctx.business_email(guide.business_id).await {
            notifications.push(Notification::new(
                email,
                format!("Incidencia resuelta en la guía {}", guide.guide_number),
                format!("La incidencia de la guía {} fue resuelta: {}", guide.guide_number, resolution),
            ));
        }
        if let Some(courier) = &reassigned_to {
            notifications.push(Notification::new(
                courier.email.clone(),
                format!("Nueva guía asignada {}", guide.guide_number),
                format!(
                    "Se te asignó la guía {} para {} ({}, {}). Confirma si la aceptas.",
                    guide.guide_number, guide.recipient_name, guide.recipient_address, guide.recipient_city
                ),
            ));
            if previous_courier_id != Some(courier.id) {
                if let Some(email) = self.ctx.user_email(previous_courier_id).await {
                    notifications.push(Notification::new(
                        email,
                        format!("Guía {} reasignada", guide.guide_number),
                        format!("La guía {} ya no está a tu cargo.", guide.guide_number),
                    ));
                }
            }
        } else if let Some(email) = self.ctx.user_email(guide.courier_id).await {
            notifications.push(Notification::new(
                email,
                format!("Incidencia resuelta en la guía {}", guide.guide_number),
                format!("La incidencia de la guía {} fue resuelta: {}", guide.guide_number, resolution),
            ));
        }
        self.ctx.notify(notifications).await;

        Ok((incident, guide))
    }

    /// Incidencias de una guía, de la más antigua a la más reciente
    pub async fn list_for_guide(&self, guide_id: i64) -> AppResult<Vec<Incident>> {
        let mut uow = self.ctx.store.begin().await?;
        if uow.find_guide(guide_id).await?.is_none() {
            return Err(not_found_error("Guide", guide_id));
        }
        uow.incidents_for_guide(guide_id).await
    }
}
