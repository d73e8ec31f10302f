use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};

use crate::controllers::IncidentController;
use crate::dto::incident_dto::{IncidentResponse, ResolveIncidentRequest};
use crate::dto::ApiResponse;
use crate::middleware::ActingUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_incident_router() -> Router<AppState> {
    Router::new().route("/:id/resolve", post(resolve_incident))
}

async fn resolve_incident(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ActingUser(resolver_id): ActingUser,
    Json(request): Json<ResolveIncidentRequest>,
) -> Result<Json<ApiResponse<IncidentResponse>>, AppError> {
    let controller = IncidentController::new(state.services.clone());
    Ok(Json(controller.resolve(id, resolver_id, request).await?))
}
