use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::api_response::ApiResponse;
use crate::dto::approval_dto::{
    ApprovalDecisionRequest, ApprovalResponse, ApprovalResultResponse,
};
use crate::models::user::ActingUser;
use crate::services::approval_service::ApprovalService;
use crate::utils::errors::AppError;

pub struct ApprovalController {
    service: ApprovalService,
}

impl ApprovalController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            service: ApprovalService::new(pool),
        }
    }

    pub async fn record_decision(
        &self,
        trip_id: Uuid,
        request: ApprovalDecisionRequest,
        actor: &ActingUser,
    ) -> Result<ApiResponse<ApprovalResultResponse>, AppError> {
        let result = self
            .service
            .record_decision(
                trip_id,
                actor,
                request.step,
                request.decision.into(),
                request.comment,
            )
            .await?;

        Ok(ApiResponse::success_with_message(
            result.into(),
            "Decisión registrada exitosamente".to_string(),
        ))
    }

    pub async fn get_by_trip(&self, trip_id: Uuid) -> Result<ApprovalResponse, AppError> {
        let approval = self.service.find_by_trip(trip_id).await?;
        Ok(approval.into())
    }
}
