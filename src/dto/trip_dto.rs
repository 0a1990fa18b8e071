use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::location::Stop;
use crate::models::schedule::Repetition;
use crate::models::trip::{Trip, TripStatus};
use crate::repositories::location_repository::NewLocation;
use crate::services::trip_service::{
    CancelResult, CreateTripInput, ReadingKind, ReadingResult, ScheduleInput, TripResult,
};

/// Recorrido del viaje tal como lo manda el cliente
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LocationRequest {
    #[validate(length(min = 5, max = 200))]
    pub start_address: String,
    pub start_latitude: f64,
    pub start_longitude: f64,

    #[validate(length(min = 5, max = 200))]
    pub end_address: String,
    pub end_latitude: f64,
    pub end_longitude: f64,

    #[serde(default)]
    pub stops: Vec<Stop>,
    /// Geometría cruda del proveedor de rutas, pares [lng, lat]
    #[serde(default)]
    pub route_geometry: Vec<[f64; 2]>,

    pub distance_km: f64,
    #[validate(range(min = 1, max = 1440))]
    pub estimated_duration_minutes: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleRequest {
    pub repetition: Repetition,
    pub valid_till_date: Option<NaiveDate>,
    #[serde(default)]
    pub include_weekends: bool,
    pub repeat_after_days: Option<i32>,
}

// Request para crear un viaje
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTripRequest {
    pub start_date: NaiveDate,
    pub start_time: NaiveTime,

    #[validate]
    pub location: LocationRequest,

    #[validate(length(min = 2, max = 50))]
    pub passenger_type: String,

    #[validate(range(min = 1, max = 60))]
    pub passenger_count: i32,

    pub vehicle_id: Option<Uuid>,

    #[serde(default)]
    pub save_as_draft: bool,

    pub schedule: Option<ScheduleRequest>,
}

impl CreateTripRequest {
    pub fn into_input(self) -> CreateTripInput {
        CreateTripInput {
            start_date: self.start_date,
            start_time: self.start_time,
            location: NewLocation {
                start_address: self.location.start_address,
                start_latitude: self.location.start_latitude,
                start_longitude: self.location.start_longitude,
                end_address: self.location.end_address,
                end_latitude: self.location.end_latitude,
                end_longitude: self.location.end_longitude,
                stops: self.location.stops,
                route_geometry: self.location.route_geometry,
                distance_km: self.location.distance_km,
                estimated_duration_minutes: self.location.estimated_duration_minutes,
                // lo calcula el servicio a partir de la duración
                estimated_resting_minutes: 0,
            },
            passenger_type: self.passenger_type,
            passenger_count: self.passenger_count,
            vehicle_id: self.vehicle_id,
            save_as_draft: self.save_as_draft,
            schedule: self.schedule.map(|s| ScheduleInput {
                repetition: s.repetition,
                valid_till_date: s.valid_till_date,
                include_weekends: s.include_weekends,
                repeat_after_days: s.repeat_after_days,
            }),
        }
    }
}

// Response de viaje para la API
#[derive(Debug, Serialize)]
pub struct TripResponse {
    pub id: Uuid,
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
    pub cost: Option<Decimal>,
    pub end_passenger_count: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<Trip> for TripResponse {
    fn from(trip: Trip) -> Self {
        Self {
            id: trip.id,
            status: trip.status,
            start_date: trip.start_date,
            start_time: trip.start_time,
            location_id: trip.location_id,
            vehicle_id: trip.vehicle_id,
            requester_id: trip.requester_id,
            passenger_type: trip.passenger_type,
            passenger_count: trip.passenger_count,
            is_scheduled: trip.is_scheduled,
            is_instance: trip.is_instance,
            master_trip_id: trip.master_trip_id,
            instance_date: trip.instance_date,
            cost: trip.cost,
            end_passenger_count: trip.end_passenger_count,
            created_at: trip.created_at,
        }
    }
}

// Response de creación: viaje + instancias generadas
#[derive(Debug, Serialize)]
pub struct TripResultResponse {
    pub trip: TripResponse,
    pub requires_approval: bool,
    pub instance_ids: Vec<Uuid>,
}

impl From<TripResult> for TripResultResponse {
    fn from(result: TripResult) -> Self {
        Self {
            trip: result.trip.into(),
            requires_approval: result.requires_approval,
            instance_ids: result.instance_ids,
        }
    }
}

// Request de cancelación
#[derive(Debug, Deserialize)]
pub struct CancelTripRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CancelTripResponse {
    pub trip: TripResponse,
    pub removed_links: u64,
}

impl From<CancelResult> for CancelTripResponse {
    fn from(result: CancelResult) -> Self {
        Self {
            trip: result.trip.into(),
            removed_links: result.removed_links,
        }
    }
}

// Request de asignación de vehículo
#[derive(Debug, Deserialize)]
pub struct AssignVehicleRequest {
    pub vehicle_id: Uuid,
}

/// Tipo de lectura en el request de odómetro
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReadingKindRequest {
    Start,
    End,
}

impl From<ReadingKindRequest> for ReadingKind {
    fn from(kind: ReadingKindRequest) -> Self {
        match kind {
            ReadingKindRequest::Start => ReadingKind::Start,
            ReadingKindRequest::End => ReadingKind::End,
        }
    }
}

// Request de lectura de odómetro
#[derive(Debug, Deserialize)]
pub struct OdometerReadingRequest {
    pub reading: Decimal,
    pub kind: ReadingKindRequest,
    pub end_passenger_count: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct OdometerReadingResponse {
    pub trip: TripResponse,
    pub start_reading: Option<Decimal>,
    pub end_reading: Option<Decimal>,
    pub cost: Option<Decimal>,
}

impl From<ReadingResult> for OdometerReadingResponse {
    fn from(result: ReadingResult) -> Self {
        Self {
            trip: result.trip.into(),
            start_reading: result.log.start_reading,
            end_reading: result.log.end_reading,
            cost: result.cost,
        }
    }
}
