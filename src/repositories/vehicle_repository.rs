use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::vehicle::Vehicle;
use crate::utils::errors::AppError;

pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error finding vehicle: {}", e)))?;

        Ok(vehicle)
    }

    pub async fn find_active(&self) -> Result<Vec<Vehicle>, AppError> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles WHERE is_active = TRUE ORDER BY registration",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error listing vehicles: {}", e)))?;

        Ok(vehicles)
    }

    /// Serializa la asignación de franjas del vehículo dentro de la
    /// transacción actual: dos asignaciones concurrentes sobre el mismo
    /// vehículo se ejecutan una después de la otra.
    pub async fn advisory_lock_tx(
        &self,
        tx: &mut PgConnection,
        vehicle_id: Uuid,
    ) -> Result<(), AppError> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(vehicle_id.to_string())
            .execute(tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error locking vehicle slot: {}", e)))?;

        Ok(())
    }

    /// Actualiza la última lectura de odómetro del vehículo al cerrar un viaje
    pub async fn update_odometer_tx(
        &self,
        tx: &mut PgConnection,
        vehicle_id: Uuid,
        reading: Decimal,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE vehicles SET odometer_last_reading = $2 WHERE id = $1")
            .bind(vehicle_id)
            .bind(reading)
            .execute(tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error updating odometer: {}", e)))?;

        Ok(())
    }
}
