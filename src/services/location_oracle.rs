//! Oráculo de posición de vehículos
//!
//! Abstracción sobre el servicio externo de rastreo de flota. El motor
//! de disponibilidad solo necesita "dónde está este vehículo ahora";
//! cualquier fallo degrada a None y el scoring simplemente pierde el
//! bono de cercanía.

use async_trait::async_trait;
use serde::Deserialize;

use crate::models::location::GeoPoint;
use crate::models::vehicle::Vehicle;

#[async_trait]
pub trait VehicleLocationOracle: Send + Sync {
    async fn locate(&self, vehicle: &Vehicle) -> Option<GeoPoint>;
}

/// Respuesta del servicio de rastreo
#[derive(Debug, Deserialize)]
struct TrackingResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// Oráculo HTTP contra el servicio de rastreo de flota, con fallback a
/// la última posición almacenada del vehículo.
pub struct HttpLocationOracle {
    base_url: String,
    client: reqwest::Client,
}

impl HttpLocationOracle {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .expect("Failed to create HTTP client");

        Self { base_url, client }
    }
}

#[async_trait]
impl VehicleLocationOracle for HttpLocationOracle {
    async fn locate(&self, vehicle: &Vehicle) -> Option<GeoPoint> {
        let url = format!(
            "{}/fleet/position?registration={}",
            self.base_url,
            urlencoding::encode(&vehicle.registration)
        );

        let response = match self.client.get(&url).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                log::warn!("⚠️ Tracking service status {} for {}", r.status(), vehicle.registration);
                return vehicle.last_known_point();
            }
            Err(e) => {
                log::warn!("⚠️ Tracking service unreachable: {}", e);
                return vehicle.last_known_point();
            }
        };

        match response.json::<TrackingResponse>().await {
            Ok(TrackingResponse {
                latitude: Some(lat),
                longitude: Some(lng),
            }) => Some(GeoPoint::new(lat, lng)),
            _ => vehicle.last_known_point(),
        }
    }
}

/// Oráculo que responde con la última posición almacenada del vehículo.
/// Es el default cuando no hay servicio de rastreo configurado y el que
/// usan los tests.
pub struct StoredPositionOracle;

#[async_trait]
impl VehicleLocationOracle for StoredPositionOracle {
    async fn locate(&self, vehicle: &Vehicle) -> Option<GeoPoint> {
        vehicle.last_known_point()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn vehicle(lat: Option<f64>, lng: Option<f64>) -> Vehicle {
        Vehicle {
            id: Uuid::new_v4(),
            registration: "AB-123-CD".to_string(),
            vehicle_type: "van".to_string(),
            seating_capacity: 7,
            seating_availability: 7,
            is_active: true,
            assigned_driver_id: None,
            cost_per_km: Decimal::ONE,
            odometer_last_reading: Decimal::ZERO,
            last_latitude: lat,
            last_longitude: lng,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_stored_position_oracle() {
        let oracle = StoredPositionOracle;
        let located = oracle.locate(&vehicle(Some(48.85), Some(2.35))).await;
        assert_eq!(located, Some(GeoPoint::new(48.85, 2.35)));

        let unknown = oracle.locate(&vehicle(None, None)).await;
        assert!(unknown.is_none());
    }
}
