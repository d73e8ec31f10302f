use validator::Validate;

use crate::dto::incident_dto::{IncidentResponse, ReportIncidentRequest, ResolveIncidentRequest};
use crate::dto::ApiResponse;
use crate::models::Incident;
use crate::services::incident_service::IncidentService;
use crate::services::ServiceContext;
use crate::utils::errors::AppResult;

pub struct IncidentController {
    incidents: IncidentService,
}

impl IncidentController {
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            incidents: IncidentService::new(ctx),
        }
    }

    pub async fn report(
        &self,
        guide_id: i64,
        reporter_id: i64,
        request: ReportIncidentRequest,
    ) -> AppResult<ApiResponse<IncidentResponse>> {
        request.validate()?;
        let (incident, guide) = self
            .incidents
            .report(guide_id, request.incident_type_id, &request.description, reporter_id)
            .await?;
        Ok(ApiResponse::success_with_message(
            IncidentResponse { incident, guide },
            "Incidencia reportada",
        ))
    }

    pub async fn resolve(
        &self,
        incident_id: i64,
        resolver_id: i64,
        request: ResolveIncidentRequest,
    ) -> AppResult<ApiResponse<IncidentResponse>> {
        request.validate()?;
        let (incident, guide) = self
            .incidents
            .resolve(incident_id, request.into(), resolver_id)
            .await?;
        Ok(ApiResponse::success_with_message(
            IncidentResponse { incident, guide },
            "Incidencia resuelta",
        ))
    }

    pub async fn list_for_guide(&self, guide_id: i64) -> AppResult<ApiResponse<Vec<Incident>>> {
        Ok(ApiResponse::success(self.incidents.list_for_guide(guide_id).await?))
    }
}
