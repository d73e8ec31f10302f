use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::controllers::{GuideController, IncidentController};
use crate::dto::guide_dto::{
    AssignGuideRequest, CancelGuideRequest, CancellationResponse, CourierNotesRequest,
    CreateGuideRequest, ReassignGuideRequest, RejectGuideRequest,
};
use crate::dto::incident_dto::{IncidentResponse, ReportIncidentRequest};
use crate::dto::ApiResponse;
use crate::middleware::ActingUser;
use crate::models::{Cancellation, Guide, HistoryEntry, Incident};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_guide_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_guide))
        .route("/:id", get(get_guide))
        .route("/:id/history", get(get_history))
        .route("/:id/assign", post(assign_guide))
        .route("/:id/reassign", post(reassign_guide))
        .route("/:id/accept", post(accept_guide))
        .route("/:id/reject", post(reject_guide))
        .route("/:id/pickup", post(mark_picked_up))
        .route("/:id/in-transit", post(mark_in_transit))
        .route("/:id/deliver", post(mark_delivered))
        .route("/:id/cancel", post(cancel_guide))
        .route("/:id/cancellation", get(get_cancellation))
        .route("/:id/incidents", post(report_incident).get(list_incidents))
}

type GuideResponse = Result<Json<ApiResponse<Guide>>, AppError>;

async fn create_guide(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Json(request): Json<CreateGuideRequest>,
) -> GuideResponse {
    let controller = GuideController::new(state.services.clone());
    Ok(Json(controller.create(user_id, request).await?))
}

async fn get_guide(State(state): State<AppState>, Path(id): Path<i64>) -> GuideResponse {
    let controller = GuideController::new(state.services.clone());
    Ok(Json(controller.get(id).await?))
}

async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<HistoryEntry>>>, AppError> {
    let controller = GuideController::new(state.services.clone());
    Ok(Json(controller.history(id).await?))
}

async fn assign_guide(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ActingUser(coordinator_id): ActingUser,
    Json(request): Json<AssignGuideRequest>,
) -> GuideResponse {
    let controller = GuideController::new(state.services.clone());
    Ok(Json(controller.assign(id, coordinator_id, request).await?))
}

async fn reassign_guide(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ActingUser(coordinator_id): ActingUser,
    Json(request): Json<ReassignGuideRequest>,
) -> GuideResponse {
    let controller = GuideController::new(state.services.clone());
    Ok(Json(controller.reassign(id, coordinator_id, request).await?))
}

async fn accept_guide(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ActingUser(courier_id): ActingUser,
    Json(request): Json<CourierNotesRequest>,
) -> GuideResponse {
    let controller = GuideController::new(state.services.clone());
    Ok(Json(controller.accept(id, courier_id, request).await?))
}

async fn reject_guide(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ActingUser(courier_id): ActingUser,
    Json(request): Json<RejectGuideRequest>,
) -> GuideResponse {
    let controller = GuideController::new(state.services.clone());
    Ok(Json(controller.reject(id, courier_id, request).await?))
}

async fn mark_picked_up(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ActingUser(courier_id): ActingUser,
    Json(request): Json<CourierNotesRequest>,
) -> GuideResponse {
    let controller = GuideController::new(state.services.clone());
    Ok(Json(controller.mark_picked_up(id, courier_id, request).await?))
}

async fn mark_in_transit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ActingUser(courier_id): ActingUser,
    Json(request): Json<CourierNotesRequest>,
) -> GuideResponse {
    let controller = GuideController::new(state.services.clone());
    Ok(Json(controller.mark_in_transit(id, courier_id, request).await?))
}

async fn mark_delivered(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ActingUser(courier_id): ActingUser,
    Json(request): Json<CourierNotesRequest>,
) -> GuideResponse {
    let controller = GuideController::new(state.services.clone());
    Ok(Json(controller.mark_delivered(id, courier_id, request).await?))
}

async fn cancel_guide(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ActingUser(user_id): ActingUser,
    Json(request): Json<CancelGuideRequest>,
) -> Result<Json<ApiResponse<CancellationResponse>>, AppError> {
    let controller = GuideController::new(state.services.clone());
    Ok(Json(controller.cancel(id, user_id, request).await?))
}

async fn get_cancellation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Cancellation>>, AppError> {
    let controller = GuideController::new(state.services.clone());
    Ok(Json(controller.cancellation(id).await?))
}

async fn report_incident(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ActingUser(reporter_id): ActingUser,
    Json(request): Json<ReportIncidentRequest>,
) -> Result<Json<ApiResponse<IncidentResponse>>, AppError> {
    let controller = IncidentController::new(state.services.clone());
    Ok(Json(controller.report(id, reporter_id, request).await?))
}

async fn list_incidents(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Incident>>>, AppError> {
    let controller = IncidentController::new(state.services.clone());
    Ok(Json(controller.list_for_guide(id).await?))
}
