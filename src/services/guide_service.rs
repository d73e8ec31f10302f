//! Servicio de guías
//!
//! Alta de guías (con descuento de fidelidad y número único) y consultas
//! de lectura: guía, historial y cancelación.

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;

use crate::models::{Cancellation, Guide, GuideState, HistoryEntry, NewGuide, NewHistoryEntry};
use crate::services::commission::percentage_of;
use crate::services::context::ServiceContext;
use crate::services::notification_service::Notification;
use crate::utils::errors::{forbidden_error, not_found_error, validation_error, AppError, AppResult};
use crate::utils::validation::{optional_text, require_text, validate_non_negative, validate_phone};

const GUIDE_NUMBER_ATTEMPTS: usize = 5;
const SUFFIX_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SUFFIX_LEN: usize = 6;

/// Datos de alta de una guía
#[derive(Debug, Clone)]
pub struct CreateGuide {
    pub business_id: i64,
    pub branch_id: i64,
    pub base_price: Decimal,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub recipient_address: String,
    pub recipient_city: String,
    pub recipient_state: String,
    pub observations: Option<String>,
}

/// Número de guía `GU-YYYYMMDD-XXXXXX`
pub fn generate_guide_number(at: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
        .collect();
    format!("GU-{}-{}", at.format("%Y%m%d"), suffix)
}

/// Precio final tras aplicar el descuento de fidelidad
pub fn apply_discount(base_price: Decimal, discount_percentage: Decimal) -> Decimal {
    percentage_of(base_price, Decimal::ONE_HUNDRED - discount_percentage)
}

pub struct GuideService {
    ctx: ServiceContext,
}

impl GuideService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Crear una guía en estado Creada
    pub async fn create(&self, input: CreateGuide, user_id: i64) -> AppResult<Guide> {
        let now = Utc::now();

        validate_non_negative(input.base_price)
            .map_err(|_| validation_error("base_price", "must not be negative"))?;
        let recipient_name = require_text("recipient_name", &input.recipient_name)?;
        let recipient_phone = require_text("recipient_phone", &input.recipient_phone)?;
        validate_phone(&recipient_phone)
            .map_err(|_| validation_error("recipient_phone", "invalid phone number"))?;
        let recipient_address = require_text("recipient_address", &input.recipient_address)?;
        let recipient_city = require_text("recipient_city", &input.recipient_city)?;
        let recipient_state = require_text("recipient_state", &input.recipient_state)?;

        let user = self.ctx.require_user(user_id).await?;
        let business = self
            .ctx
            .directory
            .find_business(input.business_id)
            .await?
            .ok_or_else(|| not_found_error("Business", input.business_id))?;
        if !business.active {
            return Err(forbidden_error("create guide", "business is not active"));
        }

        let discount = match business.loyalty_level_id {
            Some(level_id) => self
                .ctx
                .directory
                .find_loyalty_level(level_id)
                .await?
                .map(|level| level.discount_percentage)
                .unwrap_or(Decimal::ZERO),
            None => Decimal::ZERO,
        };
        let base_price = apply_discount(input.base_price, discount);

        let mut uow = self.ctx.store.begin().await?;

        let mut guide_number = None;
        for _ in 0..GUIDE_NUMBER_ATTEMPTS {
            let candidate = generate_guide_number(now);
            if !uow.guide_number_exists(&candidate).await? {
                guide_number = Some(candidate);
                break;
            }
            tracing::debug!("🔁 Número de guía {} repetido, generando otro", candidate);
        }
        let guide_number = guide_number.ok_or_else(|| {
            AppError::Internal("could not generate a unique guide number".to_string())
        })?;

        let guide = uow
            .insert_guide(
                &NewGuide {
                    guide_number,
                    business_id: business.id,
                    branch_id: input.branch_id,
                    base_price,
                    recipient_name,
                    recipient_phone,
                    recipient_address,
                    recipient_city,
                    recipient_state,
                    observations: optional_text(input.observations.as_deref()),
                },
                now,
            )
            .await?;

        let mut observation = "Guía creada".to_string();
        if discount > Decimal::ZERO {
            observation.push_str(&format!(
                ". Descuento de fidelidad {}% sobre {}",
                discount, input.base_price
            ));
        }
        uow.append_history(&NewHistoryEntry {
            guide_id: guide.id,
            state: GuideState::Creada,
            user_id: user.id,
            observation,
            created_at: now,
        })
        .await?;
        uow.commit().await?;
        drop(uow);

        tracing::info!(
            "🆕 Guía {} creada para el negocio {} (precio {})",
            guide.guide_number,
            business.id,
            guide.base_price
        );

        self.ctx
            .notify(vec![Notification::new(
                business.email.clone(),
                format!("Guía {} creada", guide.guide_number),
                format!(
                    "Se registró la guía {} para {} ({}).",
                    guide.guide_number, guide.recipient_name, guide.recipient_city
                ),
            )])
            .await;

        Ok(guide)
    }

    pub async fn get(&self, guide_id: i64) -> AppResult<Guide> {
        let mut uow = self.ctx.store.begin().await?;
        uow.find_guide(guide_id)
            .await?
            .ok_or_else(|| not_found_error("Guide", guide_id))
    }

    /// Historial ordenado por fecha e id
    pub async fn history(&self, guide_id: i64) -> AppResult<Vec<HistoryEntry>> {
        let mut uow = self.ctx.store.begin().await?;
        if uow.find_guide(guide_id).await?.is_none() {
            return Err(not_found_error("Guide", guide_id));
        }
        uow.history_for_guide(guide_id).await
    }

    pub async fn cancellation(&self, guide_id: i64) -> AppResult<Cancellation> {
        let mut uow = self.ctx.store.begin().await?;
        if uow.find_guide(guide_id).await?.is_none() {
            return Err(not_found_error("Guide", guide_id));
        }
        uow.find_cancellation_by_guide(guide_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Guide {} has no cancellation", guide_id)))
    }
}
