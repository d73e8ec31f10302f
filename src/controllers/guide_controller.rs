use validator::Validate;

use crate::dto::guide_dto::{
    AssignGuideRequest, CancelGuideRequest, CancellationResponse, CourierNotesRequest,
    CreateGuideRequest, ReassignGuideRequest, RejectGuideRequest,
};
use crate::dto::ApiResponse;
use crate::models::{Cancellation, Guide, HistoryEntry};
use crate::services::{
    AssignmentService, CancellationService, CourierGateway, GuideService, ServiceContext,
};
use crate::utils::errors::AppResult;

pub struct GuideController {
    guides: GuideService,
    assignments: AssignmentService,
    courier: CourierGateway,
    cancellations: CancellationService,
}

impl GuideController {
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            guides: GuideService::new(ctx.clone()),
            assignments: AssignmentService::new(ctx.clone()),
            courier: CourierGateway::new(ctx.clone()),
            cancellations: CancellationService::new(ctx),
        }
    }

    pub async fn create(&self, user_id: i64, request: CreateGuideRequest) -> AppResult<ApiResponse<Guide>> {
        request.validate()?;
        let guide = self.guides.create(request.into(), user_id).await?;
        Ok(ApiResponse::success_with_message(guide, "Guía creada exitosamente"))
    }

    pub async fn get(&self, guide_id: i64) -> AppResult<ApiResponse<Guide>> {
        Ok(ApiResponse::success(self.guides.get(guide_id).await?))
    }

    pub async fn history(&self, guide_id: i64) -> AppResult<ApiResponse<Vec<HistoryEntry>>> {
        Ok(ApiResponse::success(self.guides.history(guide_id).await?))
    }

    pub async fn assign(
        &self,
        guide_id: i64,
        coordinator_id: i64,
        request: AssignGuideRequest,
    ) -> AppResult<ApiResponse<Guide>> {
        request.validate()?;
        let guide = self
            .assignments
            .assign(guide_id, request.courier_id, coordinator_id, request.observations.as_deref())
            .await?;
        Ok(ApiResponse::success_with_message(guide, "Guía asignada exitosamente"))
    }

    pub async fn reassign(
        &self,
        guide_id: i64,
        coordinator_id: i64,
        request: ReassignGuideRequest,
    ) -> AppResult<ApiResponse<Guide>> {
        request.validate()?;
        let guide = self
            .assignments
            .reassign(guide_id, request.new_courier_id, &request.reason, coordinator_id)
            .await?;
        Ok(ApiResponse::success_with_message(guide, "Guía reasignada exitosamente"))
    }

    pub async fn accept(
        &self,
        guide_id: i64,
        courier_id: i64,
        request: CourierNotesRequest,
    ) -> AppResult<ApiResponse<Guide>> {
        request.validate()?;
        let guide = self
            .courier
            .accept(guide_id, courier_id, request.notes.as_deref())
            .await?;
        Ok(ApiResponse::success_with_message(guide, "Asignación aceptada"))
    }

    pub async fn reject(
        &self,
        guide_id: i64,
        courier_id: i64,
        request: RejectGuideRequest,
    ) -> AppResult<ApiResponse<Guide>> {
        request.validate()?;
        let guide = self.courier.reject(guide_id, courier_id, &request.reason).await?;
        Ok(ApiResponse::success_with_message(guide, "Asignación rechazada"))
    }

    pub async fn mark_picked_up(
        &self,
        guide_id: i64,
        courier_id: i64,
        request: CourierNotesRequest,
    ) -> AppResult<ApiResponse<Guide>> {
        request.validate()?;
        let guide = self
            .courier
            .mark_picked_up(guide_id, courier_id, request.notes.as_deref())
            .await?;
        Ok(ApiResponse::success_with_message(guide, "Guía recogida"))
    }

    pub async fn mark_in_transit(
        &self,
        guide_id: i64,
        courier_id: i64,
        request: CourierNotesRequest,
    ) -> AppResult<ApiResponse<Guide>> {
        request.validate()?;
        let guide = self
            .courier
            .mark_in_transit(guide_id, courier_id, request.notes.as_deref())
            .await?;
        Ok(ApiResponse::success_with_message(guide, "Guía en ruta"))
    }

    pub async fn mark_delivered(
        &self,
        guide_id: i64,
        courier_id: i64,
        request: CourierNotesRequest,
    ) -> AppResult<ApiResponse<Guide>> {
        request.validate()?;
        let guide = self
            .courier
            .mark_delivered(guide_id, courier_id, request.notes.as_deref())
            .await?;
        Ok(ApiResponse::success_with_message(guide, "Guía entregada"))
    }

    pub async fn cancel(
        &self,
        guide_id: i64,
        user_id: i64,
        request: CancelGuideRequest,
    ) -> AppResult<ApiResponse<CancellationResponse>> {
        request.validate()?;
        let (cancellation, guide) = self
            .cancellations
            .cancel(
                guide_id,
                request.cancellation_type_id,
                &request.reason,
                user_id,
                request.notes.as_deref(),
            )
            .await?;
        Ok(ApiResponse::success_with_message(
            CancellationResponse { cancellation, guide },
            "Guía cancelada",
        ))
    }

    pub async fn cancellation(&self, guide_id: i64) -> AppResult<ApiResponse<Cancellation>> {
        Ok(ApiResponse::success(self.guides.cancellation(guide_id).await?))
    }
}
