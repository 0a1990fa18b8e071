//! Modelo de Location
//!
//! Recorrido de un viaje: origen, destino, paradas intermedias y la
//! geometría de ruta cruda que devuelve el proveedor de rutas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

/// Punto geográfico (grados decimales)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Parada intermedia del recorrido
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Stop {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Location - mapea exactamente a la tabla locations
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Location {
    pub id: Uuid,
    pub start_address: String,
    pub start_latitude: f64,
    pub start_longitude: f64,
    pub end_address: String,
    pub end_latitude: f64,
    pub end_longitude: f64,
    /// Paradas intermedias ordenadas (JSONB)
    pub stops: Json<Vec<Stop>>,
    /// Geometría de ruta cruda como pares [lng, lat] (JSONB)
    pub route_geometry: Json<Vec<[f64; 2]>>,
    /// Distancia de ida en kilómetros
    pub distance_km: f64,
    /// Duración estimada de ida en minutos
    pub estimated_duration_minutes: i32,
    /// Minutos de descanso obligatorio del conductor para el viaje redondo
    pub estimated_resting_minutes: i32,
    pub created_at: DateTime<Utc>,
}

impl Location {
    pub fn start_point(&self) -> GeoPoint {
        GeoPoint::new(self.start_latitude, self.start_longitude)
    }

    pub fn end_point(&self) -> GeoPoint {
        GeoPoint::new(self.end_latitude, self.end_longitude)
    }
}
