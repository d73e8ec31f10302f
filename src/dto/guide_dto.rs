use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::{Cancellation, Guide};
use crate::services::CreateGuide;
use crate::utils::validation::{validate_non_negative, validate_phone};

fn validate_price(value: &Decimal) -> Result<(), ValidationError> {
    validate_non_negative(*value)
}

// Request para crear una guía
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGuideRequest {
    pub business_id: i64,
    pub branch_id: i64,
    #[validate(custom = "validate_price")]
    pub base_price: Decimal,
    #[validate(length(min = 1, max = 200))]
    pub recipient_name: String,
    #[validate(custom = "validate_phone")]
    pub recipient_phone: String,
    #[validate(length(min = 1, max = 1000))]
    pub recipient_address: String,
    #[validate(length(min = 1, max = 100))]
    pub recipient_city: String,
    #[validate(length(min = 1, max = 100))]
    pub recipient_state: String,
    #[validate(length(max = 1000))]
    pub observations: Option<String>,
}

impl From<CreateGuideRequest> for CreateGuide {
    fn from(request: CreateGuideRequest) -> Self {
        Self {
            business_id: request.business_id,
            branch_id: request.branch_id,
            base_price: request.base_price,
            recipient_name: request.recipient_name,
            recipient_phone: request.recipient_phone,
            recipient_address: request.recipient_address,
            recipient_city: request.recipient_city,
            recipient_state: request.recipient_state,
            observations: request.observations,
        }
    }
}

// Request para asignar un mensajero
#[derive(Debug, Deserialize, Validate)]
pub struct AssignGuideRequest {
    pub courier_id: i64,
    #[validate(length(max = 1000))]
    pub observations: Option<String>,
}

// Request para reasignar
#[derive(Debug, Deserialize, Validate)]
pub struct ReassignGuideRequest {
    pub new_courier_id: i64,
    #[validate(length(min = 1, max = 1000))]
    pub reason: String,
}

// Notas opcionales de los avances del mensajero
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CourierNotesRequest {
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

// Request para rechazar una asignación
#[derive(Debug, Deserialize, Validate)]
pub struct RejectGuideRequest {
    #[validate(length(min = 1, max = 1000))]
    pub reason: String,
}

// Request para cancelar
#[derive(Debug, Deserialize, Validate)]
pub struct CancelGuideRequest {
    pub cancellation_type_id: i64,
    #[validate(length(min = 1, max = 1000))]
    pub reason: String,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

// Response de cancelación
#[derive(Debug, Serialize)]
pub struct CancellationResponse {
    pub cancellation: Cancellation,
    pub guide: Guide,
}
