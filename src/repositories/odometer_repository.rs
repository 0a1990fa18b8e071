use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::odometer::OdometerLog;
use crate::utils::errors::AppError;

pub struct OdometerRepository {
    pool: PgPool,
}

impl OdometerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_trip(&self, trip_id: Uuid) -> Result<Option<OdometerLog>, AppError> {
        let log = sqlx::query_as::<_, OdometerLog>(
            "SELECT * FROM odometer_logs WHERE trip_id = $1",
        )
        .bind(trip_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error finding odometer log: {}", e)))?;

        Ok(log)
    }

    pub async fn find_by_trip_for_update(
        &self,
        tx: &mut PgConnection,
        trip_id: Uuid,
    ) -> Result<Option<OdometerLog>, AppError> {
        let log = sqlx::query_as::<_, OdometerLog>(
            "SELECT * FROM odometer_logs WHERE trip_id = $1 FOR UPDATE",
        )
        .bind(trip_id)
        .fetch_optional(tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error locking odometer log: {}", e)))?;

        Ok(log)
    }

    /// Lectura de inicio: crea la fila 1:1 del viaje
    pub async fn record_start_tx(
        &self,
        tx: &mut PgConnection,
        trip_id: Uuid,
        reading: Decimal,
        recorded_by: Uuid,
        recorded_at: DateTime<Utc>,
    ) -> Result<OdometerLog, AppError> {
        let log = sqlx::query_as::<_, OdometerLog>(
            r#"
            INSERT INTO odometer_logs (id, trip_id, start_reading, start_recorded_by,
                                       start_recorded_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(trip_id)
        .bind(reading)
        .bind(recorded_by)
        .bind(recorded_at)
        .fetch_one(tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error recording start reading: {}", e)))?;

        Ok(log)
    }

    /// Lectura de fin sobre la fila existente
    pub async fn record_end_tx(
        &self,
        tx: &mut PgConnection,
        trip_id: Uuid,
        reading: Decimal,
        recorded_by: Uuid,
        recorded_at: DateTime<Utc>,
    ) -> Result<OdometerLog, AppError> {
        let log = sqlx::query_as::<_, OdometerLog>(
            r#"
            UPDATE odometer_logs
            SET end_reading = $2, end_recorded_by = $3, end_recorded_at = $4
            WHERE trip_id = $1
            RETURNING *
            "#,
        )
        .bind(trip_id)
        .bind(reading)
        .bind(recorded_by)
        .bind(recorded_at)
        .fetch_one(tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error recording end reading: {}", e)))?;

        Ok(log)
    }

    pub async fn delete_by_trip_tx(
        &self,
        tx: &mut PgConnection,
        trip_id: Uuid,
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM odometer_logs WHERE trip_id = $1")
            .bind(trip_id)
            .execute(tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error deleting odometer log: {}", e)))?;

        Ok(())
    }
}
