//! Modelo de Trip
//!
//! Este módulo contiene el struct Trip y su máquina de estados.
//! Mapea exactamente al schema PostgreSQL con primary key 'id'.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado del viaje - mapea al ENUM trip_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "trip_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TripStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    Ongoing,
    Completed,
    Cancelled,
}

impl TripStatus {
    /// Estados que ocupan el vehículo y cuentan para detección de conflictos
    pub const ACTIVE: [TripStatus; 3] =
        [TripStatus::Pending, TripStatus::Approved, TripStatus::Ongoing];

    /// Estados desde los que un viaje aún puede cancelarse
    pub const CANCELABLE: [TripStatus; 3] =
        [TripStatus::Draft, TripStatus::Pending, TripStatus::Approved];

    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Draft => "draft",
            TripStatus::Pending => "pending",
            TripStatus::Approved => "approved",
            TripStatus::Rejected => "rejected",
            TripStatus::Ongoing => "ongoing",
            TripStatus::Completed => "completed",
            TripStatus::Cancelled => "cancelled",
        }
    }
}

/// Trip principal - mapea exactamente a la tabla trips
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trip {
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
    pub schedule_id: Option<Uuid>,
    pub cost: Option<Decimal>,
    pub end_passenger_count: Option<i32>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

impl Trip {
    /// Instante de salida del viaje
    pub fn starts_at(&self) -> NaiveDateTime {
        self.start_date.and_time(self.start_time)
    }
}
