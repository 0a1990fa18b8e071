use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::approval::Approval;
use crate::utils::errors::AppError;

pub struct ApprovalRepository {
    pool: PgPool,
}

impl ApprovalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_tx(
        &self,
        tx: &mut PgConnection,
        approval: &Approval,
    ) -> Result<Approval, AppError> {
        let created = sqlx::query_as::<_, Approval>(
            r#"
            INSERT INTO approvals (id, trip_id,
                                   hod_approver_id, hod_status, hod_approved_at, hod_comments,
                                   secondary_approver_id, secondary_status, secondary_approved_at, secondary_comments,
                                   safety_approver_id, safety_status, safety_approved_at, safety_comments,
                                   require_approver2, require_safety_approver,
                                   current_step, overall_status, rejection_reason,
                                   version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, $21, $22)
            RETURNING *
            "#,
        )
        .bind(approval.id)
        .bind(approval.trip_id)
        .bind(approval.hod_approver_id)
        .bind(approval.hod_status)
        .bind(approval.hod_approved_at)
        .bind(approval.hod_comments.clone())
        .bind(approval.secondary_approver_id)
        .bind(approval.secondary_status)
        .bind(approval.secondary_approved_at)
        .bind(approval.secondary_comments.clone())
        .bind(approval.safety_approver_id)
        .bind(approval.safety_status)
        .bind(approval.safety_approved_at)
        .bind(approval.safety_comments.clone())
        .bind(approval.require_approver2)
        .bind(approval.require_safety_approver)
        .bind(approval.current_step)
        .bind(approval.overall_status)
        .bind(approval.rejection_reason.clone())
        .bind(approval.version)
        .bind(approval.created_at)
        .bind(approval.updated_at)
        .fetch_one(tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error creating approval: {}", e)))?;

        Ok(created)
    }

    pub async fn find_by_trip(&self, trip_id: Uuid) -> Result<Option<Approval>, AppError> {
        let approval = sqlx::query_as::<_, Approval>("SELECT * FROM approvals WHERE trip_id = $1")
            .bind(trip_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error finding approval: {}", e)))?;

        Ok(approval)
    }

    pub async fn find_by_trip_for_update(
        &self,
        tx: &mut PgConnection,
        trip_id: Uuid,
    ) -> Result<Option<Approval>, AppError> {
        let approval =
            sqlx::query_as::<_, Approval>("SELECT * FROM approvals WHERE trip_id = $1 FOR UPDATE")
                .bind(trip_id)
                .fetch_optional(tx)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Error locking approval: {}", e)))?;

        Ok(approval)
    }

    /// Persiste las sub-aprobaciones mutadas con chequeo optimista de
    /// versión. Devuelve Conflict si otra decisión concurrente ganó.
    pub async fn update_tx(
        &self,
        tx: &mut PgConnection,
        approval: &Approval,
        expected_version: i32,
    ) -> Result<Approval, AppError> {
        let updated = sqlx::query_as::<_, Approval>(
            r#"
            UPDATE approvals
            SET hod_approver_id = $3, hod_status = $4, hod_approved_at = $5, hod_comments = $6,
                secondary_approver_id = $7, secondary_status = $8, secondary_approved_at = $9,
                secondary_comments = $10,
                safety_approver_id = $11, safety_status = $12, safety_approved_at = $13,
                safety_comments = $14,
                current_step = $15, overall_status = $16, rejection_reason = $17,
                version = version + 1, updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(approval.id)
        .bind(expected_version)
        .bind(approval.hod_approver_id)
        .bind(approval.hod_status)
        .bind(approval.hod_approved_at)
        .bind(approval.hod_comments.clone())
        .bind(approval.secondary_approver_id)
        .bind(approval.secondary_status)
        .bind(approval.secondary_approved_at)
        .bind(approval.secondary_comments.clone())
        .bind(approval.safety_approver_id)
        .bind(approval.safety_status)
        .bind(approval.safety_approved_at)
        .bind(approval.safety_comments.clone())
        .bind(approval.current_step)
        .bind(approval.overall_status)
        .bind(approval.rejection_reason.clone())
        .fetch_optional(tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error updating approval: {}", e)))?;

        updated.ok_or_else(|| {
            AppError::Conflict(
                "Approval was modified concurrently, retry the decision".to_string(),
            )
        })
    }

    /// La cancelación del viaje elimina su approval
    pub async fn delete_by_trip_tx(
        &self,
        tx: &mut PgConnection,
        trip_id: Uuid,
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM approvals WHERE trip_id = $1")
            .bind(trip_id)
            .execute(tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error deleting approval: {}", e)))?;

        Ok(())
    }
}
