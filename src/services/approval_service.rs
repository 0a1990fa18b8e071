//! Servicio de decisiones de aprobación
//!
//! Aplica la máquina de estados pura sobre el registro persistido, con
//! chequeo optimista de versión contra decisiones concurrentes, propaga
//! el estado al viaje y replica la aprobación del maestro a todas sus
//! instancias generadas.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::approval::{Approval, ApprovalStatus, ApprovalStep};
use crate::models::trip::{Trip, TripStatus};
use crate::models::user::ActingUser;
use crate::repositories::approval_repository::ApprovalRepository;
use crate::repositories::trip_repository::TripRepository;
use crate::services::approval_workflow::{self, Decision};
use crate::services::events::{DomainEvent, EventPublisher, LogEventPublisher};
use crate::services::schedule_instancer;
use crate::utils::errors::{AppError, AppResult};

#[derive(Debug)]
pub struct ApprovalResult {
    pub approval: Approval,
    pub trip: Trip,
}

pub struct ApprovalService {
    pool: PgPool,
    trips: TripRepository,
    approvals: ApprovalRepository,
    events: Arc<dyn EventPublisher>,
}

impl ApprovalService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            trips: TripRepository::new(pool.clone()),
            approvals: ApprovalRepository::new(pool.clone()),
            events: Arc::new(LogEventPublisher),
            pool,
        }
    }

    pub async fn find_by_trip(&self, trip_id: Uuid) -> AppResult<Approval> {
        self.approvals
            .find_by_trip(trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Approval not found for this trip".to_string()))
    }

    /// Registra la decisión de un aprobador sobre un paso del viaje.
    /// Una sola transacción: approval, estado del viaje y cascada a
    /// instancias se confirman juntos o no se confirma nada.
    pub async fn record_decision(
        &self,
        trip_id: Uuid,
        actor: &ActingUser,
        step: ApprovalStep,
        decision: Decision,
        comment: Option<String>,
    ) -> AppResult<ApprovalResult> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error starting transaction: {}", e)))?;

        let trip = self
            .trips
            .find_by_id_for_update(&mut *tx, trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;

        let mut approval = self
            .approvals
            .find_by_trip_for_update(&mut *tx, trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Approval not found for this trip".to_string()))?;

        let expected_version = approval.version;
        let effect = approval_workflow::record_decision(
            &mut approval,
            step,
            actor,
            decision,
            comment,
            Utc::now(),
        )?;

        let approval = self
            .approvals
            .update_tx(&mut *tx, &approval, expected_version)
            .await?;

        let trip = if let Some(new_status) = effect.new_trip_status {
            let updated = self
                .trips
                .update_status_tx(&mut *tx, trip_id, trip.version, new_status)
                .await?;

            // El maestro aprobado replica su aprobación a cada instancia
            // generada; las instancias nunca recorren el flujo paso a paso
            if new_status == TripStatus::Approved && updated.is_scheduled {
                self.cascade_to_instances(&mut tx, &approval, trip_id).await?;
            }

            updated
        } else {
            trip
        };

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error committing decision: {}", e)))?;

        match approval.overall_status {
            ApprovalStatus::Approved => {
                log::info!("✅ Viaje {} aprobado", trip_id);
                self.events.publish(DomainEvent::TripApproved { trip_id });
            }
            ApprovalStatus::Rejected => {
                log::info!("⛔ Viaje {} rechazado", trip_id);
                self.events.publish(DomainEvent::TripRejected {
                    trip_id,
                    reason: approval.rejection_reason.clone(),
                });
            }
            ApprovalStatus::Pending => {}
        }

        Ok(ApprovalResult { approval, trip })
    }

    async fn cascade_to_instances(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        master_approval: &Approval,
        master_trip_id: Uuid,
    ) -> AppResult<()> {
        let instances = self.trips.find_instances_of(&mut **tx, master_trip_id).await?;
        let count = instances.len();

        for instance in instances {
            let replica =
                schedule_instancer::replicate_master_approval(master_approval, instance.id);
            self.approvals.create_tx(&mut **tx, &replica).await?;
            self.trips
                .update_status_tx(&mut **tx, instance.id, instance.version, TripStatus::Approved)
                .await?;
        }

        if count > 0 {
            log::info!(
                "📋 Aprobación replicada a {} instancias del viaje {}",
                count,
                master_trip_id
            );
        }

        Ok(())
    }
}
