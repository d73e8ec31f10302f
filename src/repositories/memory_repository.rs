//! Repositorio en memoria
//!
//! Implementación sin base de datos para pruebas y ejecuciones locales.
//! Cada unidad de trabajo toma el mutex global (serializable por
//! construcción), trabaja sobre una copia y solo la publica en `commit`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use super::{Directory, GuideStore, UnitOfWork};
use crate::models::{
    Business, Cancellation, CancellationInitiator, CancellationType, Contract, Guide, GuideState,
    HistoryEntry, Incident, IncidentType, LoyaltyLevel, NewCancellation, NewGuide,
    NewHistoryEntry, NewIncident, User, UserRole,
};
use crate::utils::errors::{AppError, AppResult};

#[derive(Debug, Clone, Default)]
struct MemoryData {
    guides: HashMap<i64, Guide>,
    history: Vec<HistoryEntry>,
    cancellations: Vec<Cancellation>,
    incidents: HashMap<i64, Incident>,
    next_guide_id: i64,
    next_history_id: i64,
    next_cancellation_id: i64,
    next_incident_id: i64,
}

impl MemoryData {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<MemoryData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Guía confirmada (fuera de cualquier unidad de trabajo)
    pub async fn guide(&self, guide_id: i64) -> Option<Guide> {
        self.data.lock().await.guides.get(&guide_id).cloned()
    }

    pub async fn history(&self, guide_id: i64) -> Vec<HistoryEntry> {
        self.data
            .lock()
            .await
            .history
            .iter()
            .filter(|h| h.guide_id == guide_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl GuideStore for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let guard = self.data.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, working, committed: false }))
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryData>,
    working: MemoryData,
    committed: bool,
}

impl MemoryUnitOfWork {
    fn ensure_open(&self) -> AppResult<()> {
        if self.committed {
            return Err(AppError::Internal("unit of work already committed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn lock_guide(&mut self, guide_id: i64) -> AppResult<Option<Guide>> {
        self.ensure_open()?;
        Ok(self.working.guides.get(&guide_id).cloned())
    }

    async fn find_guide(&mut self, guide_id: i64) -> AppResult<Option<Guide>> {
        self.lock_guide(guide_id).await
    }

    async fn guide_number_exists(&mut self, guide_number: &str) -> AppResult<bool> {
        self.ensure_open()?;
        Ok(self.working.guides.values().any(|g| g.guide_number == guide_number))
    }

    async fn insert_guide(&mut self, guide: &NewGuide, at: DateTime<Utc>) -> AppResult<Guide> {
        self.ensure_open()?;
        let id = MemoryData::next_id(&mut self.working.next_guide_id);
        let created = Guide {
            id,
            guide_number: guide.guide_number.clone(),
            business_id: guide.business_id,
            branch_id: guide.branch_id,
            courier_id: None,
            coordinator_id: None,
            current_state: GuideState::Creada,
            base_price: guide.base_price,
            courier_commission: None,
            recipient_name: guide.recipient_name.clone(),
            recipient_phone: guide.recipient_phone.clone(),
            recipient_address: guide.recipient_address.clone(),
            recipient_city: guide.recipient_city.clone(),
            recipient_state: guide.recipient_state.clone(),
            observations: guide.observations.clone(),
            assignment_accepted: false,
            accepted_at: None,
            assignment_date: None,
            pickup_date: None,
            delivery_date: None,
            cancellation_date: None,
            created_at: at,
            updated_at: at,
        };
        self.working.guides.insert(id, created.clone());
        Ok(created)
    }

    async fn update_guide(&mut self, guide: &Guide) -> AppResult<()> {
        self.ensure_open()?;
        match self.working.guides.get_mut(&guide.id) {
            Some(stored) => {
                *stored = guide.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Guide with id '{}' not found", guide.id))),
        }
    }

    async fn append_history(&mut self, entry: &NewHistoryEntry) -> AppResult<HistoryEntry> {
        self.ensure_open()?;
        let stored = HistoryEntry {
            id: MemoryData::next_id(&mut self.working.next_history_id),
            guide_id: entry.guide_id,
            state: entry.state,
            user_id: entry.user_id,
            observation: entry.observation.clone(),
            created_at: entry.created_at,
        };
        self.working.history.push(stored.clone());
        Ok(stored)
    }

    async fn history_for_guide(&mut self, guide_id: i64) -> AppResult<Vec<HistoryEntry>> {
        self.ensure_open()?;
        let mut entries: Vec<HistoryEntry> = self
            .working
            .history
            .iter()
            .filter(|h| h.guide_id == guide_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(entries)
    }

    async fn find_cancellation_by_guide(
        &mut self,
        guide_id: i64,
    ) -> AppResult<Option<Cancellation>> {
        self.ensure_open()?;
        Ok(self
            .working
            .cancellations
            .iter()
            .find(|c| c.guide_id == guide_id)
            .cloned())
    }

    async fn lock_business_cancellations(&mut self, _business_id: i64) -> AppResult<()> {
        // El mutex del almacén ya serializa todas las unidades de trabajo
        self.ensure_open()
    }

    async fn count_business_cancellations(
        &mut self,
        business_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<i64> {
        self.ensure_open()?;
        let count = self
            .working
            .cancellations
            .iter()
            .filter(|c| {
                c.business_id == business_id
                    && c.initiator == CancellationInitiator::Negocio
                    && c.created_at >= from
                    && c.created_at < to
            })
            .count();
        Ok(count as i64)
    }

    async fn insert_cancellation(
        &mut self,
        cancellation: &NewCancellation,
    ) -> AppResult<Cancellation> {
        self.ensure_open()?;
        if self
            .working
            .cancellations
            .iter()
            .any(|c| c.guide_id == cancellation.guide_id)
        {
            return Err(AppError::AlreadyCancelled { guide_id: cancellation.guide_id });
        }
        let stored = Cancellation {
            id: MemoryData::next_id(&mut self.working.next_cancellation_id),
            guide_id: cancellation.guide_id,
            business_id: cancellation.business_id,
            cancelled_by: cancellation.cancelled_by,
            cancellation_type_id: cancellation.cancellation_type_id,
            initiator: cancellation.initiator,
            reason: cancellation.reason.clone(),
            penalty_amount: cancellation.penalty_amount,
            courier_payment: cancellation.courier_payment,
            created_at: cancellation.created_at,
        };
        self.working.cancellations.push(stored.clone());
        Ok(stored)
    }

    async fn insert_incident(&mut self, incident: &NewIncident) -> AppResult<Incident> {
        self.ensure_open()?;
        let id = MemoryData::next_id(&mut self.working.next_incident_id);
        let stored = Incident {
            id,
            guide_id: incident.guide_id,
            incident_type_id: incident.incident_type_id,
            description: incident.description.clone(),
            reported_by: incident.reported_by,
            resolved: false,
            resolution: None,
            resolved_by: None,
            resolved_at: None,
            created_at: incident.created_at,
        };
        self.working.incidents.insert(id, stored.clone());
        Ok(stored)
    }

    async fn lock_incident(&mut self, incident_id: i64) -> AppResult<Option<Incident>> {
        self.ensure_open()?;
        Ok(self.working.incidents.get(&incident_id).cloned())
    }

    async fn update_incident(&mut self, incident: &Incident) -> AppResult<()> {
        self.ensure_open()?;
        match self.working.incidents.get_mut(&incident.id) {
            Some(stored) => {
                *stored = incident.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "Incident with id '{}' not found",
                incident.id
            ))),
        }
    }

    async fn incidents_for_guide(&mut self, guide_id: i64) -> AppResult<Vec<Incident>> {
        self.ensure_open()?;
        let mut incidents: Vec<Incident> = self
            .working
            .incidents
            .values()
            .filter(|i| i.guide_id == guide_id)
            .cloned()
            .collect();
        incidents.sort_by_key(|i| i.id);
        Ok(incidents)
    }

    async fn commit(&mut self) -> AppResult<()> {
        self.ensure_open()?;
        *self.guard = std::mem::take(&mut self.working);
        self.committed = true;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct DirectoryData {
    users: HashMap<i64, User>,
    businesses: HashMap<i64, Business>,
    loyalty_levels: HashMap<i64, LoyaltyLevel>,
    contracts: Vec<Contract>,
    cancellation_types: HashMap<i64, CancellationType>,
    incident_types: HashMap<i64, IncidentType>,
}

/// Directorio de referencia en memoria, poblado por quien lo construye
#[derive(Clone, Default)]
pub struct MemoryDirectory {
    data: Arc<RwLock<DirectoryData>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directorio de demostración para ejecutar el servidor sin base de datos.
    ///
    /// Usuarios: 1 coordinador, 2 y 3 mensajeros con contrato (30% y 25%),
    /// 4 usuario de negocio. Negocios: 1 (nivel Bronce) y 2 (nivel Oro, 10%
    /// de descuento y dos cancelaciones gratuitas). Tipos de cancelación:
    /// 1 negocio, 2 cliente. Tipo de incidencia: 1.
    pub async fn with_demo_data() -> Self {
        let directory = Self::new();
        let today = Utc::now().date_naive();

        for (id, name, role) in [
            (1, "Coordinación", UserRole::Coordinador),
            (2, "Mensajero Uno", UserRole::Mensajero),
            (3, "Mensajero Dos", UserRole::Mensajero),
            (4, "Tienda Demo", UserRole::Negocio),
        ] {
            directory
                .add_user(User {
                    id,
                    full_name: name.to_string(),
                    email: format!("demo{}@example.com", id),
                    role,
                    active: true,
                })
                .await;
        }

        for (id, courier_id, rate) in [(1, 2, 30), (2, 3, 25)] {
            directory
                .add_contract(Contract {
                    id,
                    courier_id,
                    commission_percentage: Decimal::new(rate, 0),
                    start_date: today - Duration::days(365),
                    end_date: None,
                    active: true,
                })
                .await;
        }

        directory
            .add_loyalty_level(LoyaltyLevel {
                id: 1,
                name: "Bronce".to_string(),
                discount_percentage: Decimal::ZERO,
                penalty_percentage: Decimal::new(15, 0),
                free_cancellations_per_month: 0,
            })
            .await;
        directory
            .add_loyalty_level(LoyaltyLevel {
                id: 2,
                name: "Oro".to_string(),
                discount_percentage: Decimal::new(10, 0),
                penalty_percentage: Decimal::new(20, 0),
                free_cancellations_per_month: 2,
            })
            .await;

        for (id, level) in [(1, 1), (2, 2)] {
            directory
                .add_business(Business {
                    id,
                    name: format!("Negocio Demo {}", id),
                    email: format!("negocio{}@example.com", id),
                    loyalty_level_id: Some(level),
                    active: true,
                })
                .await;
        }

        directory
            .add_cancellation_type(CancellationType {
                id: 1,
                name: "Anulado por el negocio".to_string(),
                initiator: CancellationInitiator::Negocio,
            })
            .await;
        directory
            .add_cancellation_type(CancellationType {
                id: 2,
                name: "Rechazado por el cliente".to_string(),
                initiator: CancellationInitiator::Cliente,
            })
            .await;
        directory
            .add_incident_type(IncidentType {
                id: 1,
                name: "Dirección incorrecta".to_string(),
                description: None,
            })
            .await;

        directory
    }

    pub async fn add_user(&self, user: User) {
        self.data.write().await.users.insert(user.id, user);
    }

    pub async fn add_business(&self, business: Business) {
        self.data.write().await.businesses.insert(business.id, business);
    }

    pub async fn add_loyalty_level(&self, level: LoyaltyLevel) {
        self.data.write().await.loyalty_levels.insert(level.id, level);
    }

    pub async fn add_contract(&self, contract: Contract) {
        self.data.write().await.contracts.push(contract);
    }

    pub async fn add_cancellation_type(&self, cancellation_type: CancellationType) {
        self.data
            .write()
            .await
            .cancellation_types
            .insert(cancellation_type.id, cancellation_type);
    }

    pub async fn add_incident_type(&self, incident_type: IncidentType) {
        self.data
            .write()
            .await
            .incident_types
            .insert(incident_type.id, incident_type);
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn find_user(&self, user_id: i64) -> AppResult<Option<User>> {
        Ok(self.data.read().await.users.get(&user_id).cloned())
    }

    async fn find_business(&self, business_id: i64) -> AppResult<Option<Business>> {
        Ok(self.data.read().await.businesses.get(&business_id).cloned())
    }

    async fn find_loyalty_level(&self, level_id: i64) -> AppResult<Option<LoyaltyLevel>> {
        Ok(self.data.read().await.loyalty_levels.get(&level_id).cloned())
    }

    async fn find_active_contract(
        &self,
        courier_id: i64,
        on_date: NaiveDate,
    ) -> AppResult<Option<Contract>> {
        Ok(self
            .data
            .read()
            .await
            .contracts
            .iter()
            .filter(|c| c.courier_id == courier_id && c.is_active_on(on_date))
            .max_by_key(|c| c.start_date)
            .cloned())
    }

    async fn find_cancellation_type(&self, type_id: i64) -> AppResult<Option<CancellationType>> {
        Ok(self.data.read().await.cancellation_types.get(&type_id).cloned())
    }

    async fn find_incident_type(&self, type_id: i64) -> AppResult<Option<IncidentType>> {
        Ok(self.data.read().await.incident_types.get(&type_id).cloned())
    }
}
