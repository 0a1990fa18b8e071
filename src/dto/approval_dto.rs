use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::approval::{Approval, ApprovalStatus, ApprovalStep};
use crate::services::approval_service::ApprovalResult;
use crate::services::approval_workflow::Decision;
use crate::dto::trip_dto::TripResponse;

/// Decisión enviada por el aprobador
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DecisionRequest {
    Approve,
    Reject,
}

impl From<DecisionRequest> for Decision {
    fn from(decision: DecisionRequest) -> Self {
        match decision {
            DecisionRequest::Approve => Decision::Approve,
            DecisionRequest::Reject => Decision::Reject,
        }
    }
}

// Request de decisión de aprobación
#[derive(Debug, Deserialize)]
pub struct ApprovalDecisionRequest {
    pub step: ApprovalStep,
    pub decision: DecisionRequest,
    pub comment: Option<String>,
}

/// Una sub-aprobación en la respuesta
#[derive(Debug, Serialize)]
pub struct SubApprovalResponse {
    pub approver_id: Option<Uuid>,
    pub status: ApprovalStatus,
    pub approved_at: Option<DateTime<Utc>>,
    pub comments: Option<String>,
    pub required: bool,
}

// Response de approval
#[derive(Debug, Serialize)]
pub struct ApprovalResponse {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub hod: SubApprovalResponse,
    pub secondary: SubApprovalResponse,
    pub safety: SubApprovalResponse,
    pub current_step: ApprovalStep,
    pub overall_status: ApprovalStatus,
    pub rejection_reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<Approval> for ApprovalResponse {
    fn from(approval: Approval) -> Self {
        Self {
            id: approval.id,
            trip_id: approval.trip_id,
            hod: SubApprovalResponse {
                approver_id: approval.hod_approver_id,
                status: approval.hod_status,
                approved_at: approval.hod_approved_at,
                comments: approval.hod_comments,
                required: true,
            },
            secondary: SubApprovalResponse {
                approver_id: approval.secondary_approver_id,
                status: approval.secondary_status,
                approved_at: approval.secondary_approved_at,
                comments: approval.secondary_comments,
                required: approval.require_approver2,
            },
            safety: SubApprovalResponse {
                approver_id: approval.safety_approver_id,
                status: approval.safety_status,
                approved_at: approval.safety_approved_at,
                comments: approval.safety_comments,
                required: approval.require_safety_approver,
            },
            current_step: approval.current_step,
            overall_status: approval.overall_status,
            rejection_reason: approval.rejection_reason,
            updated_at: approval.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApprovalResultResponse {
    pub approval: ApprovalResponse,
    pub trip: TripResponse,
}

impl From<ApprovalResult> for ApprovalResultResponse {
    fn from(result: ApprovalResult) -> Self {
        Self {
            approval: result.approval.into(),
            trip: result.trip.into(),
        }
    }
}
