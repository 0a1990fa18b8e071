//! Modelo de Schedule
//!
//! Definición de repetición de un viaje programado.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Tipo de repetición - mapea al ENUM repetition_kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "repetition_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Repetition {
    Once,
    Daily,
    Weekly,
    Monthly,
}

/// Schedule - mapea exactamente a la tabla schedules
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Schedule {
    pub id: Uuid,
    pub repetition: Repetition,
    pub start_date: NaiveDate,
    pub valid_till_date: Option<NaiveDate>,
    pub include_weekends: bool,
    /// Solo para repetición diaria
    pub repeat_after_days: Option<i32>,
    pub created_at: DateTime<Utc>,
}
