use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::location::GeoPoint;
use crate::models::vehicle::Vehicle;
use crate::services::availability::RankedVehicle;
use crate::services::conflict_detector::TripCandidate;

// Request de disponibilidad: atributos del viaje candidato
#[derive(Debug, Deserialize, Validate)]
pub struct AvailabilityRequest {
    pub start_date: NaiveDate,
    pub start_time: NaiveTime,

    #[validate(range(min = 1, max = 1440))]
    pub estimated_duration_minutes: i32,

    pub distance_km: f64,

    #[validate(range(min = 1, max = 60))]
    pub passenger_count: i32,

    pub start_latitude: f64,
    pub start_longitude: f64,
    pub end_latitude: f64,
    pub end_longitude: f64,
}

impl AvailabilityRequest {
    pub fn into_candidate(self) -> TripCandidate {
        TripCandidate {
            start_date: self.start_date,
            start_time: self.start_time,
            one_way_minutes: self.estimated_duration_minutes as i64,
            distance_km: self.distance_km,
            passenger_count: self.passenger_count,
            start_point: GeoPoint::new(self.start_latitude, self.start_longitude),
            end_point: GeoPoint::new(self.end_latitude, self.end_longitude),
        }
    }
}

// Response de vehículo
#[derive(Debug, Serialize)]
pub struct VehicleResponse {
    pub id: Uuid,
    pub registration: String,
    pub vehicle_type: String,
    pub seating_capacity: i32,
    pub is_active: bool,
    pub cost_per_km: Decimal,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            id: vehicle.id,
            registration: vehicle.registration,
            vehicle_type: vehicle.vehicle_type,
            seating_capacity: vehicle.seating_capacity,
            is_active: vehicle.is_active,
            cost_per_km: vehicle.cost_per_km,
        }
    }
}

/// Viaje compartible con el que el candidato entraría en conflicto real
#[derive(Debug, Serialize)]
pub struct ConflictingTripResponse {
    pub trip_id: Uuid,
    pub start_date: NaiveDate,
    pub start_time: NaiveTime,
    pub start_address: String,
    pub end_address: String,
}

// Fila del ranking de disponibilidad
#[derive(Debug, Serialize)]
pub struct RankedVehicleResponse {
    pub vehicle: VehicleResponse,
    pub is_recommended: bool,
    pub recommendation_reason: String,
    pub score: i64,
    pub leftover_capacity: i32,
    pub distance_from_start_meters: Option<f64>,
    pub estimated_arrival_minutes: Option<i64>,
    pub is_in_conflict: bool,
    pub conflicting_trip: Option<ConflictingTripResponse>,
}

impl From<RankedVehicle> for RankedVehicleResponse {
    fn from(ranked: RankedVehicle) -> Self {
        let conflicting_trip = ranked.conflicting_trip.map(|c| ConflictingTripResponse {
            trip_id: c.trip.id,
            start_date: c.trip.start_date,
            start_time: c.trip.start_time,
            start_address: c.location.start_address,
            end_address: c.location.end_address,
        });

        Self {
            vehicle: ranked.vehicle.into(),
            is_recommended: ranked.is_recommended,
            recommendation_reason: ranked.recommendation_reason,
            score: ranked.score,
            leftover_capacity: ranked.leftover_capacity,
            distance_from_start_meters: ranked.distance_from_start_meters,
            estimated_arrival_minutes: ranked.estimated_arrival_minutes,
            is_in_conflict: ranked.is_in_conflict,
            conflicting_trip,
        }
    }
}
