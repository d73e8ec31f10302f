//! Motor del ciclo de vida de guías
//!
//! Dueño de la máquina de estados: es el único componente que escribe
//! `current_state`. Valida cada arista contra la tabla estática, marca
//! las fechas del ciclo de vida, persiste la guía y agrega exactamente una
//! entrada al historial, siempre dentro de la unidad de trabajo del
//! llamador (no abre ni confirma transacciones propias).

use chrono::{DateTime, Utc};

use crate::models::{Guide, GuideState, HistoryEntry, NewHistoryEntry};
use crate::repositories::UnitOfWork;
use crate::utils::errors::{AppError, AppResult};

/// Destinos permitidos desde cada estado
pub fn allowed_targets(from: GuideState) -> &'static [GuideState] {
    use GuideState::*;

    match from {
        Creada => &[Asignada, Cancelada],
        Asignada => &[Creada, Recogida, Incidencia, Cancelada],
        Recogida => &[EnRuta, Incidencia],
        EnRuta => &[Entregada, Incidencia],
        Incidencia => &[Asignada, EnRuta, Entregada],
        Entregada | Cancelada | Rechazada => &[],
    }
}

pub fn can_transition(from: GuideState, to: GuideState) -> bool {
    allowed_targets(from).contains(&to)
}

pub fn validate_transition(from: GuideState, to: GuideState) -> AppResult<()> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(AppError::InvalidStateTransition { from, to })
    }
}

/// Aplicar una transición y registrarla en el historial
pub async fn apply_transition(
    uow: &mut dyn UnitOfWork,
    guide: &mut Guide,
    to: GuideState,
    acting_user_id: i64,
    observation: &str,
    at: DateTime<Utc>,
) -> AppResult<HistoryEntry> {
    let from = guide.current_state;
    validate_transition(from, to)?;

    guide.current_state = to;
    match to {
        GuideState::Asignada => guide.assignment_date = Some(at),
        GuideState::Recogida => {
            guide.pickup_date.get_or_insert(at);
        }
        GuideState::Entregada => {
            guide.delivery_date.get_or_insert(at);
        }
        GuideState::Cancelada => {
            guide.cancellation_date.get_or_insert(at);
        }
        _ => {}
    }
    guide.updated_at = at;

    uow.update_guide(guide).await?;
    let entry = uow
        .append_history(&NewHistoryEntry {
            guide_id: guide.id,
            state: to,
            user_id: acting_user_id,
            observation: observation.to_string(),
            created_at: at,
        })
        .await?;

    tracing::info!(
        "🔁 Guía {} ({}): {} -> {} por usuario {}",
        guide.id,
        guide.guide_number,
        from,
        to,
        acting_user_id
    );

    Ok(entry)
}

/// Persistir cambios de la guía sin cambio de estado y registrar el evento
pub async fn record_event(
    uow: &mut dyn UnitOfWork,
    guide: &mut Guide,
    acting_user_id: i64,
    observation: &str,
    at: DateTime<Utc>,
) -> AppResult<HistoryEntry> {
    guide.updated_at = at;
    uow.update_guide(guide).await?;

    let entry = uow
        .append_history(&NewHistoryEntry {
            guide_id: guide.id,
            state: guide.current_state,
            user_id: acting_user_id,
            observation: observation.to_string(),
            created_at: at,
        })
        .await?;

    tracing::debug!(
        "📝 Evento en guía {} ({}): {}",
        guide.id,
        guide.current_state,
        observation
    );

    Ok(entry)
}
