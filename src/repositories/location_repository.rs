use chrono::Utc;
use sqlx::{types::Json, PgConnection, PgPool};
use uuid::Uuid;

use crate::models::location::{Location, Stop};
use crate::utils::errors::AppError;

/// Campos de un recorrido nuevo
#[derive(Debug, Clone)]
pub struct NewLocation {
    pub start_address: String,
    pub start_latitude: f64,
    pub start_longitude: f64,
    pub end_address: String,
    pub end_latitude: f64,
    pub end_longitude: f64,
    pub stops: Vec<Stop>,
    pub route_geometry: Vec<[f64; 2]>,
    pub distance_km: f64,
    pub estimated_duration_minutes: i32,
    pub estimated_resting_minutes: i32,
}

pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_tx(
        &self,
        tx: &mut PgConnection,
        new_location: NewLocation,
    ) -> Result<Location, AppError> {
        let location = sqlx::query_as::<_, Location>(
            r#"
            INSERT INTO locations (id, start_address, start_latitude, start_longitude,
                                   end_address, end_latitude, end_longitude, stops,
                                   route_geometry, distance_km, estimated_duration_minutes,
                                   estimated_resting_minutes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_location.start_address)
        .bind(new_location.start_latitude)
        .bind(new_location.start_longitude)
        .bind(new_location.end_address)
        .bind(new_location.end_latitude)
        .bind(new_location.end_longitude)
        .bind(Json(new_location.stops))
        .bind(Json(new_location.route_geometry))
        .bind(new_location.distance_km)
        .bind(new_location.estimated_duration_minutes)
        .bind(new_location.estimated_resting_minutes)
        .bind(Utc::now())
        .fetch_one(tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error creating location: {}", e)))?;

        Ok(location)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Location>, AppError> {
        let location = sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error finding location: {}", e)))?;

        Ok(location)
    }

    /// Clon profundo de un recorrido, para las instancias de viajes
    /// programados (cada instancia es dueña de su propia fila)
    pub async fn clone_tx(
        &self,
        tx: &mut PgConnection,
        source_id: Uuid,
    ) -> Result<Location, AppError> {
        let location = sqlx::query_as::<_, Location>(
            r#"
            INSERT INTO locations (id, start_address, start_latitude, start_longitude,
                                   end_address, end_latitude, end_longitude, stops,
                                   route_geometry, distance_km, estimated_duration_minutes,
                                   estimated_resting_minutes, created_at)
            SELECT $1, start_address, start_latitude, start_longitude,
                   end_address, end_latitude, end_longitude, stops,
                   route_geometry, distance_km, estimated_duration_minutes,
                   estimated_resting_minutes, $2
            FROM locations WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(Utc::now())
        .bind(source_id)
        .fetch_one(tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error cloning location: {}", e)))?;

        Ok(location)
    }
}
