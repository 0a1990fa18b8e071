use chrono::{NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::trip::{Trip, TripStatus};
use crate::services::conflict_detector::TripWithLocation;
use crate::utils::errors::AppError;

/// Campos de un viaje nuevo; el id y la versión los pone el repositorio
#[derive(Debug, Clone)]
pub struct NewTrip {
    pub status: TripStatus,
    pub start_date: NaiveDate,
    pub start_time: NaiveTime,
    pub location_id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub requester_id: Uuid,
    pub passenger_type: String,
    pub passenger_count: i32,
    pub is_scheduled: bool,
    pub is_instance: bool,
    pub master_trip_id: Option<Uuid>,
    pub instance_date: Option<NaiveDate>,
    pub schedule_id: Option<Uuid>,
}

pub struct TripRepository {
    pool: PgPool,
}

impl TripRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_tx(
        &self,
        tx: &mut PgConnection,
        new_trip: NewTrip,
    ) -> Result<Trip, AppError> {
        let trip = sqlx::query_as::<_, Trip>(
            r#"
            INSERT INTO trips (id, status, start_date, start_time, location_id, vehicle_id,
                               requester_id, passenger_type, passenger_count, is_scheduled,
                               is_instance, master_trip_id, instance_date, schedule_id,
                               cost, end_passenger_count, version, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, NULL, NULL, 1, $15)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_trip.status)
        .bind(new_trip.start_date)
        .bind(new_trip.start_time)
        .bind(new_trip.location_id)
        .bind(new_trip.vehicle_id)
        .bind(new_trip.requester_id)
        .bind(new_trip.passenger_type)
        .bind(new_trip.passenger_count)
        .bind(new_trip.is_scheduled)
        .bind(new_trip.is_instance)
        .bind(new_trip.master_trip_id)
        .bind(new_trip.instance_date)
        .bind(new_trip.schedule_id)
        .bind(Utc::now())
        .fetch_one(tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error creating trip: {}", e)))?;

        Ok(trip)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Trip>, AppError> {
        let trip = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error finding trip: {}", e)))?;

        Ok(trip)
    }

    /// Lectura con lock de fila, para mutaciones dentro de una transacción
    pub async fn find_by_id_for_update(
        &self,
        tx: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<Trip>, AppError> {
        let trip = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error locking trip: {}", e)))?;

        Ok(trip)
    }

    pub async fn find_by_requester(&self, requester_id: Uuid) -> Result<Vec<Trip>, AppError> {
        let trips = sqlx::query_as::<_, Trip>(
            "SELECT * FROM trips WHERE requester_id = $1 ORDER BY start_date DESC, start_time DESC",
        )
        .bind(requester_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error listing trips: {}", e)))?;

        Ok(trips)
    }

    /// Viajes activos de un vehículo (los que cuentan para conflictos),
    /// junto con su recorrido
    pub async fn find_active_by_vehicle_with_location(
        &self,
        vehicle_id: Uuid,
    ) -> Result<Vec<TripWithLocation>, AppError> {
        let trips = sqlx::query_as::<_, Trip>(
            r#"
            SELECT * FROM trips
            WHERE vehicle_id = $1 AND status IN ('pending', 'approved', 'ongoing')
            ORDER BY start_date, start_time, id
            "#,
        )
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error listing vehicle trips: {}", e)))?;

        let mut result = Vec::with_capacity(trips.len());
        for trip in trips {
            let location = sqlx::query_as::<_, crate::models::location::Location>(
                "SELECT * FROM locations WHERE id = $1",
            )
            .bind(trip.location_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error loading trip location: {}", e)))?;

            result.push(TripWithLocation { trip, location });
        }

        Ok(result)
    }

    /// Instancias generadas de un viaje maestro
    pub async fn find_instances_of(
        &self,
        tx: &mut PgConnection,
        master_trip_id: Uuid,
    ) -> Result<Vec<Trip>, AppError> {
        let trips = sqlx::query_as::<_, Trip>(
            "SELECT * FROM trips WHERE master_trip_id = $1 ORDER BY instance_date",
        )
        .bind(master_trip_id)
        .fetch_all(tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error listing trip instances: {}", e)))?;

        Ok(trips)
    }

    /// Cambio de estado con chequeo optimista de versión. Devuelve el
    /// viaje actualizado o Conflict si otra transacción ganó la carrera.
    pub async fn update_status_tx(
        &self,
        tx: &mut PgConnection,
        id: Uuid,
        expected_version: i32,
        status: TripStatus,
    ) -> Result<Trip, AppError> {
        let trip = sqlx::query_as::<_, Trip>(
            r#"
            UPDATE trips
            SET status = $3, version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(status)
        .fetch_optional(tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error updating trip status: {}", e)))?;

        trip.ok_or_else(|| {
            AppError::Conflict("Trip was modified concurrently, retry the operation".to_string())
        })
    }

    pub async fn assign_vehicle_tx(
        &self,
        tx: &mut PgConnection,
        id: Uuid,
        expected_version: i32,
        vehicle_id: Uuid,
    ) -> Result<Trip, AppError> {
        let trip = sqlx::query_as::<_, Trip>(
            r#"
            UPDATE trips
            SET vehicle_id = $3, version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(vehicle_id)
        .fetch_optional(tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error assigning vehicle: {}", e)))?;

        trip.ok_or_else(|| {
            AppError::Conflict("Trip was modified concurrently, retry the operation".to_string())
        })
    }

    /// Cierre del viaje: costo calculado y pasajeros finales
    pub async fn complete_tx(
        &self,
        tx: &mut PgConnection,
        id: Uuid,
        expected_version: i32,
        cost: Decimal,
        end_passenger_count: i32,
    ) -> Result<Trip, AppError> {
        let trip = sqlx::query_as::<_, Trip>(
            r#"
            UPDATE trips
            SET status = 'completed', cost = $3, end_passenger_count = $4, version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(cost)
        .bind(end_passenger_count)
        .fetch_optional(tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error completing trip: {}", e)))?;

        trip.ok_or_else(|| {
            AppError::Conflict("Trip was modified concurrently, retry the operation".to_string())
        })
    }
}
