//! Modelo de OdometerLog
//!
//! Lecturas de odómetro de inicio y fin de un viaje, con identidad
//! del registrador. La lectura de fin dispara el cálculo de costo.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// OdometerLog - mapea exactamente a la tabla odometer_logs (1:1 con trips)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OdometerLog {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub start_reading: Option<Decimal>,
    pub start_recorded_by: Option<Uuid>,
    pub start_recorded_at: Option<DateTime<Utc>>,
    pub end_reading: Option<Decimal>,
    pub end_recorded_by: Option<Uuid>,
    pub end_recorded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
