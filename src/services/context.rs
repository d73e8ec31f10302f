//! Contexto compartido de los servicios del núcleo
//!
//! Agrupa los colaboradores externos (almacén de guías, directorio de
//! referencia y notificador) y las validaciones que los cuatro servicios
//! repiten: cargar la guía, exigir coordinador, exigir mensajero elegible.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::models::{Contract, Guide, User};
use crate::repositories::{Directory, GuideStore, UnitOfWork};
use crate::services::commission::{ensure_courier_eligible, require_active_contract};
use crate::services::notification_service::{dispatch_all, Notification, Notifier};
use crate::utils::errors::{forbidden_error, not_found_error, AppResult};

#[derive(Clone)]
pub struct ServiceContext {
    pub store: Arc<dyn GuideStore>,
    pub directory: Arc<dyn Directory>,
    pub notifier: Arc<dyn Notifier>,
}

impl ServiceContext {
    pub fn new(
        store: Arc<dyn GuideStore>,
        directory: Arc<dyn Directory>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { store, directory, notifier }
    }

    /// Usuario existente o `NotFound`
    pub async fn require_user(&self, user_id: i64) -> AppResult<User> {
        self.directory
            .find_user(user_id)
            .await?
            .ok_or_else(|| not_found_error("User", user_id))
    }

    /// Usuario activo con capacidad de coordinación
    pub async fn require_coordinator(&self, user_id: i64, operation: &str) -> AppResult<User> {
        let user = self.require_user(user_id).await?;
        if !user.can_coordinate() {
            return Err(forbidden_error(operation, "user is not an active coordinator"));
        }
        Ok(user)
    }

    /// Mensajero elegible con contrato vigente en `today`
    pub async fn eligible_courier(
        &self,
        courier_id: i64,
        today: NaiveDate,
    ) -> AppResult<(User, Contract)> {
        let courier = ensure_courier_eligible(courier_id, self.directory.find_user(courier_id).await?)?;
        let contract = require_active_contract(
            courier_id,
            self.directory.find_active_contract(courier_id, today).await?,
            today,
        )?;
        Ok((courier, contract))
    }

    /// Enviar notificaciones tras confirmar; nunca falla
    pub async fn notify(&self, notifications: Vec<Notification>) {
        dispatch_all(self.notifier.as_ref(), notifications).await;
    }

    /// Correo del usuario, si se puede resolver (solo para notificar)
    pub async fn user_email(&self, user_id: Option<i64>) -> Option<String> {
        let user_id = user_id?;
        match self.directory.find_user(user_id).await {
            Ok(user) => user.map(|u| u.email),
            Err(e) => {
                tracing::warn!("⚠️ No se pudo resolver el correo del usuario {}: {}", user_id, e);
                None
            }
        }
    }

    /// Correo del negocio, si se puede resolver (solo para notificar)
    pub async fn business_email(&self, business_id: i64) -> Option<String> {
        match self.directory.find_business(business_id).await {
            Ok(business) => business.map(|b| b.email),
            Err(e) => {
                tracing::warn!("⚠️ No se pudo resolver el correo del negocio {}: {}", business_id, e);
                None
            }
        }
    }
}

/// Cargar la guía con bloqueo de fila o devolver `NotFound`
pub async fn load_guide_for_update(uow: &mut dyn UnitOfWork, guide_id: i64) -> AppResult<Guide> {
    uow.lock_guide(guide_id)
        .await?
        .ok_or_else(|| not_found_error("Guide", guide_id))
}

/// Exigir que la guía esté asignada al mensajero que actúa
pub fn ensure_assigned_to(guide: &Guide, courier_id: i64, operation: &str) -> AppResult<()> {
    if !guide.is_assigned_to(courier_id) {
        return Err(forbidden_error(operation, "guide is not assigned to this courier"));
    }
    Ok(())
}
