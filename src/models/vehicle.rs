//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle del catálogo de flota.
//! Mapea exactamente al schema PostgreSQL con primary key 'id'.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::location::GeoPoint;

/// Vehicle principal - mapea exactamente a la tabla vehicles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub registration: String,
    pub vehicle_type: String,
    pub seating_capacity: i32,
    /// Disponibilidad nominal de asientos; mayormente informativa,
    /// la capacidad efectiva se calcula contra los viajes solapados
    pub seating_availability: i32,
    pub is_active: bool,
    pub assigned_driver_id: Option<Uuid>,
    pub cost_per_km: Decimal,
    pub odometer_last_reading: Decimal,
    pub last_latitude: Option<f64>,
    pub last_longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    /// Última posición conocida almacenada (fallback del oráculo)
    pub fn last_known_point(&self) -> Option<GeoPoint> {
        match (self.last_latitude, self.last_longitude) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        }
    }
}
