use chrono::{NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::schedule::{Repetition, Schedule};
use crate::utils::errors::AppError;

pub struct ScheduleRepository {
    pool: PgPool,
}

impl ScheduleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_tx(
        &self,
        tx: &mut PgConnection,
        repetition: Repetition,
        start_date: NaiveDate,
        valid_till_date: Option<NaiveDate>,
        include_weekends: bool,
        repeat_after_days: Option<i32>,
    ) -> Result<Schedule, AppError> {
        let schedule = sqlx::query_as::<_, Schedule>(
            r#"
            INSERT INTO schedules (id, repetition, start_date, valid_till_date,
                                   include_weekends, repeat_after_days, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(repetition)
        .bind(start_date)
        .bind(valid_till_date)
        .bind(include_weekends)
        .bind(repeat_after_days)
        .bind(Utc::now())
        .fetch_one(tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Error creating schedule: {}", e)))?;

        Ok(schedule)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Schedule>, AppError> {
        let schedule = sqlx::query_as::<_, Schedule>("SELECT * FROM schedules WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error finding schedule: {}", e)))?;

        Ok(schedule)
    }
}
