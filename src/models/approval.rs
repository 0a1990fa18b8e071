//! Modelo de Approval
//!
//! Registro 1:1 con un Trip que agrupa las tres sub-aprobaciones
//! (HOD, secundaria, seguridad) y el cursor del flujo de aprobación.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado de una sub-aprobación y del resultado agregado
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "approval_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

/// Paso actual del flujo - mapea al ENUM approval_step
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "approval_step", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStep {
    Hod,
    Secondary,
    Safety,
    Completed,
}

/// Approval - mapea exactamente a la tabla approvals
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Approval {
    pub id: Uuid,
    pub trip_id: Uuid,

    pub hod_approver_id: Option<Uuid>,
    pub hod_status: ApprovalStatus,
    pub hod_approved_at: Option<DateTime<Utc>>,
    pub hod_comments: Option<String>,

    pub secondary_approver_id: Option<Uuid>,
    pub secondary_status: ApprovalStatus,
    pub secondary_approved_at: Option<DateTime<Utc>>,
    pub secondary_comments: Option<String>,

    pub safety_approver_id: Option<Uuid>,
    pub safety_status: ApprovalStatus,
    pub safety_approved_at: Option<DateTime<Utc>>,
    pub safety_comments: Option<String>,

    /// Approver1 (HOD) siempre es requerido
    pub require_approver2: bool,
    pub require_safety_approver: bool,

    pub current_step: ApprovalStep,
    pub overall_status: ApprovalStatus,
    pub rejection_reason: Option<String>,

    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Approval {
    /// El flujo ya alcanzó un resultado terminal
    pub fn is_terminal(&self) -> bool {
        self.overall_status != ApprovalStatus::Pending
    }

    /// Si el paso es requerido por este approval
    pub fn step_required(&self, step: ApprovalStep) -> bool {
        match step {
            ApprovalStep::Hod => true,
            ApprovalStep::Secondary => self.require_approver2,
            ApprovalStep::Safety => self.require_safety_approver,
            ApprovalStep::Completed => false,
        }
    }

    /// Estado de la sub-aprobación del paso
    pub fn step_status(&self, step: ApprovalStep) -> ApprovalStatus {
        match step {
            ApprovalStep::Hod => self.hod_status,
            ApprovalStep::Secondary => self.secondary_status,
            ApprovalStep::Safety => self.safety_status,
            ApprovalStep::Completed => self.overall_status,
        }
    }

    /// Aprobador asignado al paso
    pub fn step_approver(&self, step: ApprovalStep) -> Option<Uuid> {
        match step {
            ApprovalStep::Hod => self.hod_approver_id,
            ApprovalStep::Secondary => self.secondary_approver_id,
            ApprovalStep::Safety => self.safety_approver_id,
            ApprovalStep::Completed => None,
        }
    }

    /// Primer paso requerido que sigue pendiente, en orden HOD → SECONDARY → SAFETY
    pub fn next_required_pending_step(&self) -> ApprovalStep {
        for step in [ApprovalStep::Hod, ApprovalStep::Secondary, ApprovalStep::Safety] {
            if self.step_required(step) && self.step_status(step) == ApprovalStatus::Pending {
                return step;
            }
        }
        ApprovalStep::Completed
    }

    /// Todas las sub-aprobaciones requeridas están aprobadas
    pub fn all_required_approved(&self) -> bool {
        [ApprovalStep::Hod, ApprovalStep::Secondary, ApprovalStep::Safety]
            .into_iter()
            .filter(|s| self.step_required(*s))
            .all(|s| self.step_status(s) == ApprovalStatus::Approved)
    }
}

/// Política externa de aprobación - mapea a la tabla approval_config
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApprovalConfig {
    pub id: Uuid,
    /// Distancia a partir de la cual se exige approver2 (km)
    pub distance_limit_km: f64,
    /// Ventana horaria restringida; puede cruzar medianoche
    pub restricted_from: NaiveTime,
    pub restricted_to: NaiveTime,
    pub secondary_user_id: Uuid,
    pub safety_user_id: Uuid,
    pub updated_at: DateTime<Utc>,
}
