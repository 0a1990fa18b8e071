//! Expansión de viajes programados
//!
//! Convierte una definición de repetición en fechas concretas de
//! ocurrencia y construye los registros de aprobación replicados que
//! reciben las instancias cuando el viaje maestro queda aprobado.

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use uuid::Uuid;

use crate::models::approval::{Approval, ApprovalStatus, ApprovalStep};
use crate::models::schedule::{Repetition, Schedule};

/// Horizontes por defecto cuando no hay fecha de fin explícita
const DAILY_HORIZON_DAYS: u64 = 30;
const WEEKLY_HORIZON_DAYS: u64 = 90;
const MONTHLY_HORIZON_MONTHS: u32 = 6;

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Fechas de ocurrencia de un schedule: estrictamente posteriores a la
/// fecha de inicio y hasta la fecha de fin inclusive (o el horizonte por
/// defecto del tipo de repetición).
pub fn expand_occurrences(schedule: &Schedule) -> Vec<NaiveDate> {
    let start = schedule.start_date;

    let horizon = schedule.valid_till_date.unwrap_or(match schedule.repetition {
        Repetition::Daily => start + Days::new(DAILY_HORIZON_DAYS),
        Repetition::Weekly => start + Days::new(WEEKLY_HORIZON_DAYS),
        Repetition::Monthly => start
            .checked_add_months(Months::new(MONTHLY_HORIZON_MONTHS))
            .unwrap_or(start),
        Repetition::Once => start,
    });

    let mut occurrences = Vec::new();

    match schedule.repetition {
        Repetition::Once => {}
        Repetition::Daily => {
            let step = schedule.repeat_after_days.unwrap_or(1).max(1) as u64;
            let mut date = start + Days::new(step);
            while date <= horizon {
                if schedule.include_weekends || !is_weekend(date) {
                    occurrences.push(date);
                }
                date = date + Days::new(step);
            }
        }
        Repetition::Weekly => {
            let mut date = start + Days::new(7);
            while date <= horizon {
                occurrences.push(date);
                date = date + Days::new(7);
            }
        }
        Repetition::Monthly => {
            let mut months = 1u32;
            while let Some(date) = start.checked_add_months(Months::new(months)) {
                if date > horizon {
                    break;
                }
                occurrences.push(date);
                months += 1;
            }
        }
    }

    occurrences
}

/// Approval replicado para una instancia a partir del approval maestro
/// aprobado: mismas identidades, estados, timestamps y comentarios
/// (copiados, no reevaluados). Las instancias nunca recorren el flujo
/// paso a paso.
pub fn replicate_master_approval(master: &Approval, instance_trip_id: Uuid) -> Approval {
    Approval {
        id: Uuid::new_v4(),
        trip_id: instance_trip_id,

        hod_approver_id: master.hod_approver_id,
        hod_status: master.hod_status,
        hod_approved_at: master.hod_approved_at,
        hod_comments: master.hod_comments.clone(),

        secondary_approver_id: master.secondary_approver_id,
        secondary_status: master.secondary_status,
        secondary_approved_at: master.secondary_approved_at,
        secondary_comments: master.secondary_comments.clone(),

        safety_approver_id: master.safety_approver_id,
        safety_status: master.safety_status,
        safety_approved_at: master.safety_approved_at,
        safety_comments: master.safety_comments.clone(),

        require_approver2: master.require_approver2,
        require_safety_approver: master.require_safety_approver,

        current_step: ApprovalStep::Completed,
        overall_status: ApprovalStatus::Approved,
        rejection_reason: None,

        version: 1,
        created_at: master.created_at,
        updated_at: master.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn schedule(
        repetition: Repetition,
        start: NaiveDate,
        valid_till: Option<NaiveDate>,
        include_weekends: bool,
        repeat_after_days: Option<i32>,
    ) -> Schedule {
        Schedule {
            id: Uuid::new_v4(),
            repetition,
            start_date: start,
            valid_till_date: valid_till,
            include_weekends,
            repeat_after_days,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_daily_skips_weekends() {
        // 2024-01-01 es lunes; 2024-01-05 es viernes y entra en el rango
        let s = schedule(
            Repetition::Daily,
            date(2024, 1, 1),
            Some(date(2024, 1, 5)),
            false,
            None,
        );
        assert_eq!(
            expand_occurrences(&s),
            vec![date(2024, 1, 2), date(2024, 1, 3), date(2024, 1, 4), date(2024, 1, 5)]
        );
    }

    #[test]
    fn test_daily_never_includes_start_date() {
        let s = schedule(
            Repetition::Daily,
            date(2024, 1, 1),
            Some(date(2024, 1, 3)),
            true,
            None,
        );
        let dates = expand_occurrences(&s);
        assert!(!dates.contains(&date(2024, 1, 1)));
        assert_eq!(dates, vec![date(2024, 1, 2), date(2024, 1, 3)]);
    }

    #[test]
    fn test_daily_with_weekends_included() {
        // 2024-01-06 y 2024-01-07 son sábado y domingo
        let s = schedule(
            Repetition::Daily,
            date(2024, 1, 5),
            Some(date(2024, 1, 8)),
            true,
            None,
        );
        assert_eq!(
            expand_occurrences(&s),
            vec![date(2024, 1, 6), date(2024, 1, 7), date(2024, 1, 8)]
        );
    }

    #[test]
    fn test_daily_repeat_after_days() {
        let s = schedule(
            Repetition::Daily,
            date(2024, 1, 1),
            Some(date(2024, 1, 10)),
            true,
            Some(3),
        );
        assert_eq!(
            expand_occurrences(&s),
            vec![date(2024, 1, 4), date(2024, 1, 7), date(2024, 1, 10)]
        );
    }

    #[test]
    fn test_daily_default_horizon() {
        let s = schedule(Repetition::Daily, date(2024, 1, 1), None, true, None);
        let dates = expand_occurrences(&s);
        assert_eq!(dates.first(), Some(&date(2024, 1, 2)));
        assert_eq!(dates.last(), Some(&date(2024, 1, 31)));
    }

    #[test]
    fn test_weekly_steps_seven_days() {
        let s = schedule(
            Repetition::Weekly,
            date(2024, 1, 1),
            Some(date(2024, 1, 31)),
            false,
            None,
        );
        assert_eq!(
            expand_occurrences(&s),
            vec![
                date(2024, 1, 8),
                date(2024, 1, 15),
                date(2024, 1, 22),
                date(2024, 1, 29)
            ]
        );
    }

    #[test]
    fn test_monthly_clamps_short_months() {
        // 31 de enero: febrero se recorta al 29 (2024 es bisiesto)
        let s = schedule(
            Repetition::Monthly,
            date(2024, 1, 31),
            Some(date(2024, 4, 30)),
            false,
            None,
        );
        assert_eq!(
            expand_occurrences(&s),
            vec![date(2024, 2, 29), date(2024, 3, 31), date(2024, 4, 30)]
        );
    }

    #[test]
    fn test_once_has_no_occurrences() {
        let s = schedule(Repetition::Once, date(2024, 1, 1), None, false, None);
        assert!(expand_occurrences(&s).is_empty());
    }

    #[test]
    fn test_replicated_approval_is_completed_copy() {
        use crate::models::approval::Approval;
        let master = Approval {
            id: Uuid::new_v4(),
            trip_id: Uuid::new_v4(),
            hod_approver_id: Some(Uuid::new_v4()),
            hod_status: ApprovalStatus::Approved,
            hod_approved_at: Some(Utc::now()),
            hod_comments: Some("fine".to_string()),
            secondary_approver_id: None,
            secondary_status: ApprovalStatus::Pending,
            secondary_approved_at: None,
            secondary_comments: None,
            safety_approver_id: None,
            safety_status: ApprovalStatus::Pending,
            safety_approved_at: None,
            safety_comments: None,
            require_approver2: false,
            require_safety_approver: false,
            current_step: ApprovalStep::Completed,
            overall_status: ApprovalStatus::Approved,
            rejection_reason: None,
            version: 3,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let instance_trip = Uuid::new_v4();
        let replica = replicate_master_approval(&master, instance_trip);

        assert_eq!(replica.trip_id, instance_trip);
        assert_ne!(replica.id, master.id);
        assert_eq!(replica.hod_approver_id, master.hod_approver_id);
        assert_eq!(replica.hod_status, ApprovalStatus::Approved);
        assert_eq!(replica.hod_approved_at, master.hod_approved_at);
        assert_eq!(replica.hod_comments, master.hod_comments);
        assert_eq!(replica.current_step, ApprovalStep::Completed);
        assert_eq!(replica.overall_status, ApprovalStatus::Approved);
        assert_eq!(replica.version, 1);
    }
}
