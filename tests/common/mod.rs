#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use delivery_guides::models::{
    Business, CancellationInitiator, CancellationType, Contract, Guide, IncidentType,
    LoyaltyLevel, User, UserRole,
};
use delivery_guides::repositories::{MemoryDirectory, MemoryStore};
use delivery_guides::services::{CreateGuide, GuideService, LogNotifier, Notifier, ServiceContext};
use delivery_guides::{AppError, AppResult};

pub const COORDINATOR: i64 = 1;
pub const COURIER_A: i64 = 2;
pub const COURIER_B: i64 = 3;
pub const BUSINESS_USER: i64 = 4;
pub const COURIER_WITHOUT_CONTRACT: i64 = 5;
pub const INACTIVE_COURIER: i64 = 6;

/// Negocio sin cancelaciones gratuitas (penalización 15%)
pub const STRICT_BUSINESS: i64 = 10;
/// Negocio con dos cancelaciones gratuitas al mes y 10% de descuento
pub const LOYAL_BUSINESS: i64 = 11;
/// Negocio sin nivel de fidelidad
pub const PLAIN_BUSINESS: i64 = 12;

pub const BUSINESS_CANCELLATION: i64 = 1;
pub const CUSTOMER_CANCELLATION: i64 = 2;
pub const ADDRESS_INCIDENT: i64 = 1;

pub struct Harness {
    pub store: MemoryStore,
    pub directory: MemoryDirectory,
    pub ctx: ServiceContext,
}

/// Notificador que siempre falla
pub struct BrokenNotifier;

#[async_trait]
impl Notifier for BrokenNotifier {
    async fn notify(&self, _recipient_email: &str, _subject: &str, _body: &str) -> AppResult<()> {
        Err(AppError::Notification("relay down".to_string()))
    }
}

fn user(id: i64, name: &str, role: UserRole, active: bool) -> User {
    User {
        id,
        full_name: name.to_string(),
        email: format!("user{}@example.com", id),
        role,
        active,
    }
}

fn contract(id: i64, courier_id: i64, rate: i64) -> Contract {
    let today = Utc::now().date_naive();
    Contract {
        id,
        courier_id,
        commission_percentage: Decimal::new(rate, 0),
        start_date: today - Duration::days(30),
        end_date: Some(today + Duration::days(30)),
        active: true,
    }
}

pub async fn harness() -> Harness {
    harness_with(Arc::new(LogNotifier)).await
}

pub async fn harness_with(notifier: Arc<dyn Notifier>) -> Harness {
    let store = MemoryStore::new();
    let directory = MemoryDirectory::new();

    directory.add_user(user(COORDINATOR, "Carla Coordinadora", UserRole::Coordinador, true)).await;
    directory.add_user(user(COURIER_A, "Mario Mensajero", UserRole::Mensajero, true)).await;
    directory.add_user(user(COURIER_B, "Beatriz Mensajera", UserRole::Mensajero, true)).await;
    directory.add_user(user(BUSINESS_USER, "Tienda Norte", UserRole::Negocio, true)).await;
    directory
        .add_user(user(COURIER_WITHOUT_CONTRACT, "Sin Contrato", UserRole::Mensajero, true))
        .await;
    directory.add_user(user(INACTIVE_COURIER, "Inactivo", UserRole::Mensajero, false)).await;

    directory.add_contract(contract(1, COURIER_A, 30)).await;
    directory.add_contract(contract(2, COURIER_B, 25)).await;
    directory.add_contract(contract(3, INACTIVE_COURIER, 30)).await;

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

    for (id, level) in [(STRICT_BUSINESS, Some(1)), (LOYAL_BUSINESS, Some(2)), (PLAIN_BUSINESS, None)] {
        directory
            .add_business(Business {
                id,
                name: format!("Negocio {}", id),
                email: format!("negocio{}@example.com", id),
                loyalty_level_id: level,
                active: true,
            })
            .await;
    }

    directory
        .add_cancellation_type(CancellationType {
            id: BUSINESS_CANCELLATION,
            name: "Pedido anulado por el negocio".to_string(),
            initiator: CancellationInitiator::Negocio,
        })
        .await;
    directory
        .add_cancellation_type(CancellationType {
            id: CUSTOMER_CANCELLATION,
            name: "Cliente rechaza el pedido".to_string(),
            initiator: CancellationInitiator::Cliente,
        })
        .await;
    directory
        .add_incident_type(IncidentType {
            id: ADDRESS_INCIDENT,
            name: "Dirección incorrecta".to_string(),
            description: None,
        })
        .await;

    let ctx = ServiceContext::new(
        Arc::new(store.clone()),
        Arc::new(directory.clone()),
        notifier,
    );

    Harness { store, directory, ctx }
}

pub fn new_guide(business_id: i64, base_price: Decimal) -> CreateGuide {
    CreateGuide {
        business_id,
        branch_id: 1,
        base_price,
        recipient_name: "Ana Destinataria".to_string(),
        recipient_phone: "+57 300 123 4567".to_string(),
        recipient_address: "Calle 10 # 20-30".to_string(),
        recipient_city: "Medellín".to_string(),
        recipient_state: "Antioquia".to_string(),
        observations: None,
    }
}

impl Harness {
    /// Guía en estado Creada con precio base 100.00
    pub async fn created_guide(&self, business_id: i64) -> Guide {
        GuideService::new(self.ctx.clone())
            .create(new_guide(business_id, Decimal::new(10000, 2)), BUSINESS_USER)
            .await
            .expect("guide is created")
    }
}
