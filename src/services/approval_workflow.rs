//! Máquina de estados de aprobación
//!
//! Cálculo de pasos requeridos a partir de los atributos del viaje y
//! transición de una decisión sobre el registro de Approval. Funciones
//! puras sobre el modelo; la persistencia y los eventos viven en
//! `approval_service`.

use chrono::{DateTime, NaiveTime, Utc};

use crate::models::approval::{Approval, ApprovalConfig, ApprovalStatus, ApprovalStep};
use crate::models::trip::TripStatus;
use crate::models::user::ActingUser;
use crate::utils::errors::{AppError, AppResult};

/// Pasos requeridos además del HOD (que siempre es obligatorio)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredSteps {
    pub approver2: bool,
    pub safety: bool,
}

/// Decisión de un aprobador sobre un paso
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

/// Efecto de una decisión sobre el viaje asociado
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionEffect {
    /// Nuevo estado del Trip si la decisión lo cambió
    pub new_trip_status: Option<TripStatus>,
}

/// Si una hora de salida cae dentro de la ventana restringida.
/// La ventana puede cruzar medianoche: con from > to se interpreta
/// como t >= from O t < to.
pub fn in_restricted_window(t: NaiveTime, from: NaiveTime, to: NaiveTime) -> bool {
    if from <= to {
        t >= from && t < to
    } else {
        t >= from || t < to
    }
}

/// Pasos requeridos para un viaje según la política vigente
pub fn required_steps(
    trip_distance_km: f64,
    start_time: NaiveTime,
    config: &ApprovalConfig,
) -> RequiredSteps {
    RequiredSteps {
        approver2: trip_distance_km > config.distance_limit_km,
        safety: in_restricted_window(start_time, config.restricted_from, config.restricted_to),
    }
}

/// Aplica una decisión sobre el approval. Valida autorización y estado,
/// muta las sub-aprobaciones y recalcula cursor y resultado agregado.
pub fn record_decision(
    approval: &mut Approval,
    step: ApprovalStep,
    actor: &ActingUser,
    decision: Decision,
    comment: Option<String>,
    now: DateTime<Utc>,
) -> AppResult<DecisionEffect> {
    if approval.is_terminal() {
        return Err(AppError::BadRequest(
            "Approval already reached a terminal status".to_string(),
        ));
    }

    if step == ApprovalStep::Completed || !approval.step_required(step) {
        return Err(AppError::BadRequest(format!(
            "Step {:?} is not part of this approval",
            step
        )));
    }

    let authorized = actor.is_sysadmin() || approval.step_approver(step) == Some(actor.id);
    if !authorized {
        return Err(AppError::Forbidden(
            "Acting user is not the assigned approver for this step".to_string(),
        ));
    }

    match decision {
        Decision::Reject => {
            // El rechazo corta el flujo sin importar el orden de pasos
            set_step(approval, step, ApprovalStatus::Rejected, now, comment.clone());
            approval.overall_status = ApprovalStatus::Rejected;
            approval.current_step = ApprovalStep::Completed;
            approval.rejection_reason =
                Some(comment.unwrap_or_else(|| "Rejected without comment".to_string()));
            Ok(DecisionEffect {
                new_trip_status: Some(TripStatus::Rejected),
            })
        }
        Decision::Approve => {
            if actor.is_sysadmin() {
                // SYSADMIN resuelve en una sola llamada todos los pasos
                // requeridos que sigan pendientes
                for s in [ApprovalStep::Hod, ApprovalStep::Secondary, ApprovalStep::Safety] {
                    if approval.step_required(s)
                        && approval.step_status(s) == ApprovalStatus::Pending
                    {
                        set_step(approval, s, ApprovalStatus::Approved, now, comment.clone());
                    }
                }
            } else {
                set_step(approval, step, ApprovalStatus::Approved, now, comment);
            }

            if approval.all_required_approved() {
                approval.overall_status = ApprovalStatus::Approved;
                approval.current_step = ApprovalStep::Completed;
                Ok(DecisionEffect {
                    new_trip_status: Some(TripStatus::Approved),
                })
            } else {
                approval.current_step = approval.next_required_pending_step();
                Ok(DecisionEffect::default())
            }
        }
    }
}

fn set_step(
    approval: &mut Approval,
    step: ApprovalStep,
    status: ApprovalStatus,
    now: DateTime<Utc>,
    comment: Option<String>,
) {
    match step {
        ApprovalStep::Hod => {
            approval.hod_status = status;
            approval.hod_approved_at = Some(now);
            approval.hod_comments = comment;
        }
        ApprovalStep::Secondary => {
            approval.secondary_status = status;
            approval.secondary_approved_at = Some(now);
            approval.secondary_comments = comment;
        }
        ApprovalStep::Safety => {
            approval.safety_status = status;
            approval.safety_approved_at = Some(now);
            approval.safety_comments = comment;
        }
        ApprovalStep::Completed => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;
    use uuid::Uuid;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn config(limit: f64, from: (u32, u32), to: (u32, u32)) -> ApprovalConfig {
        ApprovalConfig {
            id: Uuid::new_v4(),
            distance_limit_km: limit,
            restricted_from: time(from.0, from.1),
            restricted_to: time(to.0, to.1),
            secondary_user_id: Uuid::new_v4(),
            safety_user_id: Uuid::new_v4(),
            updated_at: Utc::now(),
        }
    }

    fn approval(require2: bool, require_safety: bool) -> (Approval, Uuid, Uuid, Uuid) {
        let hod = Uuid::new_v4();
        let secondary = Uuid::new_v4();
        let safety = Uuid::new_v4();
        let approval = Approval {
            id: Uuid::new_v4(),
            trip_id: Uuid::new_v4(),
            hod_approver_id: Some(hod),
            hod_status: ApprovalStatus::Pending,
            hod_approved_at: None,
            hod_comments: None,
            secondary_approver_id: require2.then_some(secondary),
            secondary_status: ApprovalStatus::Pending,
            secondary_approved_at: None,
            secondary_comments: None,
            safety_approver_id: require_safety.then_some(safety),
            safety_status: ApprovalStatus::Pending,
            safety_approved_at: None,
            safety_comments: None,
            require_approver2: require2,
            require_safety_approver: require_safety,
            current_step: ApprovalStep::Hod,
            overall_status: ApprovalStatus::Pending,
            rejection_reason: None,
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        (approval, hod, secondary, safety)
    }

    fn approver(id: Uuid) -> ActingUser {
        ActingUser {
            id,
            role: UserRole::Approver,
        }
    }

    #[test]
    fn test_required_steps_distance_limit() {
        let cfg = config(100.0, (22, 0), (5, 0));
        let steps = required_steps(150.0, time(10, 0), &cfg);
        assert!(steps.approver2);
        assert!(!steps.safety);

        let steps = required_steps(100.0, time(10, 0), &cfg);
        assert!(!steps.approver2); // el límite es estrictamente mayor
    }

    #[test]
    fn test_restricted_window_wraps_midnight() {
        let from = time(22, 0);
        let to = time(5, 0);
        assert!(in_restricted_window(time(23, 30), from, to));
        assert!(in_restricted_window(time(2, 0), from, to));
        assert!(in_restricted_window(time(22, 0), from, to));
        assert!(!in_restricted_window(time(5, 0), from, to)); // extremo superior excluido
        assert!(!in_restricted_window(time(12, 0), from, to));
    }

    #[test]
    fn test_restricted_window_plain() {
        let from = time(9, 0);
        let to = time(17, 0);
        assert!(in_restricted_window(time(9, 0), from, to));
        assert!(in_restricted_window(time(12, 0), from, to));
        assert!(!in_restricted_window(time(17, 0), from, to));
        assert!(!in_restricted_window(time(8, 59), from, to));
    }

    #[test]
    fn test_simple_hod_path() {
        let (mut a, hod, _, _) = approval(false, false);
        let effect = record_decision(
            &mut a,
            ApprovalStep::Hod,
            &approver(hod),
            Decision::Approve,
            Some("ok".to_string()),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(a.overall_status, ApprovalStatus::Approved);
        assert_eq!(a.current_step, ApprovalStep::Completed);
        assert_eq!(a.hod_comments.as_deref(), Some("ok"));
        assert!(a.hod_approved_at.is_some());
        assert_eq!(effect.new_trip_status, Some(TripStatus::Approved));
    }

    #[test]
    fn test_rejection_short_circuits_after_hod_approval() {
        let (mut a, hod, secondary, _) = approval(true, false);

        let effect = record_decision(
            &mut a,
            ApprovalStep::Hod,
            &approver(hod),
            Decision::Approve,
            None,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(a.current_step, ApprovalStep::Secondary);
        assert_eq!(a.overall_status, ApprovalStatus::Pending);
        assert!(effect.new_trip_status.is_none());

        let effect = record_decision(
            &mut a,
            ApprovalStep::Secondary,
            &approver(secondary),
            Decision::Reject,
            Some("budget".to_string()),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(a.overall_status, ApprovalStatus::Rejected);
        assert_eq!(a.current_step, ApprovalStep::Completed);
        assert_eq!(a.rejection_reason.as_deref(), Some("budget"));
        assert_eq!(effect.new_trip_status, Some(TripStatus::Rejected));
    }

    #[test]
    fn test_rejection_does_not_require_step_order() {
        // safety puede rechazar aunque el HOD no haya actuado todavía
        let (mut a, _, _, safety) = approval(false, true);
        let effect = record_decision(
            &mut a,
            ApprovalStep::Safety,
            &approver(safety),
            Decision::Reject,
            None,
            Utc::now(),
        )
        .unwrap();

        assert_eq!(a.overall_status, ApprovalStatus::Rejected);
        assert_eq!(effect.new_trip_status, Some(TripStatus::Rejected));
    }

    #[test]
    fn test_wrong_identity_is_forbidden() {
        let (mut a, _, _, _) = approval(false, false);
        let err = record_decision(
            &mut a,
            ApprovalStep::Hod,
            &approver(Uuid::new_v4()),
            Decision::Approve,
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_terminal_approval_rejects_further_decisions() {
        let (mut a, hod, _, _) = approval(false, false);
        record_decision(
            &mut a,
            ApprovalStep::Hod,
            &approver(hod),
            Decision::Approve,
            None,
            Utc::now(),
        )
        .unwrap();

        let err = record_decision(
            &mut a,
            ApprovalStep::Hod,
            &approver(hod),
            Decision::Approve,
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_non_required_step_is_bad_request() {
        let (mut a, hod, _, _) = approval(false, false);
        let err = record_decision(
            &mut a,
            ApprovalStep::Secondary,
            &approver(hod),
            Decision::Approve,
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_sysadmin_resolves_all_steps_in_one_call() {
        let (mut a, _, _, _) = approval(true, true);
        let sysadmin = ActingUser {
            id: Uuid::new_v4(),
            role: UserRole::Sysadmin,
        };

        let effect = record_decision(
            &mut a,
            ApprovalStep::Hod,
            &sysadmin,
            Decision::Approve,
            Some("override".to_string()),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(a.overall_status, ApprovalStatus::Approved);
        assert_eq!(a.current_step, ApprovalStep::Completed);
        assert_eq!(a.hod_status, ApprovalStatus::Approved);
        assert_eq!(a.secondary_status, ApprovalStatus::Approved);
        assert_eq!(a.safety_status, ApprovalStatus::Approved);
        assert_eq!(effect.new_trip_status, Some(TripStatus::Approved));
    }

    #[test]
    fn test_approve_advances_to_next_required_step() {
        let (mut a, hod, _, safety) = approval(false, true);

        record_decision(
            &mut a,
            ApprovalStep::Hod,
            &approver(hod),
            Decision::Approve,
            None,
            Utc::now(),
        )
        .unwrap();
        // approver2 no es requerido: el cursor salta directo a safety
        assert_eq!(a.current_step, ApprovalStep::Safety);

        let effect = record_decision(
            &mut a,
            ApprovalStep::Safety,
            &approver(safety),
            Decision::Approve,
            None,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(a.overall_status, ApprovalStatus::Approved);
        assert_eq!(effect.new_trip_status, Some(TripStatus::Approved));
    }
}
