use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Guide, Incident};
use crate::services::Resolution;

// Request para reportar una incidencia
#[derive(Debug, Deserialize, Validate)]
pub struct ReportIncidentRequest {
    pub incident_type_id: i64,
    #[validate(length(min = 1, max = 1000))]
    pub description: String,
}

// Request para resolver una incidencia
#[derive(Debug, Deserialize, Validate)]
pub struct ResolveIncidentRequest {
    #[validate(length(min = 1, max = 1000))]
    pub resolution: String,
    pub new_courier_id: Option<i64>,
    #[serde(default)]
    pub reschedule: bool,
}

impl From<ResolveIncidentRequest> for Resolution {
    fn from(request: ResolveIncidentRequest) -> Self {
        Self {
            resolution: request.resolution,
            new_courier_id: request.new_courier_id,
            reschedule: request.reschedule,
        }
    }
}

// Response de incidencia con el estado resultante de la guía
#[derive(Debug, Serialize)]
pub struct IncidentResponse {
    pub incident: Incident,
    pub guide: Guide,
}
