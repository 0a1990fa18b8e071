//! Tests de integración del motor puro: detección de conflictos,
//! scoring, máquina de aprobación y expansión de viajes programados
//! trabajando juntos, sin base de datos.

use chrono::{NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use uuid::Uuid;

use fleet_scheduling::models::approval::{Approval, ApprovalConfig, ApprovalStatus, ApprovalStep};
use fleet_scheduling::models::location::{GeoPoint, Location};
use fleet_scheduling::models::schedule::{Repetition, Schedule};
use fleet_scheduling::models::trip::{Trip, TripStatus};
use fleet_scheduling::models::user::{ActingUser, UserRole};
use fleet_scheduling::services::approval_workflow::{
    self, required_steps, Decision,
};
use fleet_scheduling::services::availability::{
    rank_scored, DynamicCapacityScorer, VehicleEvaluation, VehicleScorer,
};
use fleet_scheduling::services::conflict_detector::{
    detect_conflicts, TripCandidate, TripWithLocation,
};
use fleet_scheduling::services::conflict_graph;
use fleet_scheduling::services::schedule_instancer::{expand_occurrences, replicate_master_approval};
use fleet_scheduling::models::vehicle::Vehicle;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn location(start: (f64, f64), end: (f64, f64)) -> Location {
    Location {
        id: Uuid::new_v4(),
        start_address: "Origen 123".to_string(),
        start_latitude: start.0,
        start_longitude: start.1,
        end_address: "Destino 456".to_string(),
        end_latitude: end.0,
        end_longitude: end.1,
        stops: Json(vec![]),
        route_geometry: Json(vec![]),
        distance_km: 18.0,
        estimated_duration_minutes: 45,
        estimated_resting_minutes: 0,
        created_at: Utc::now(),
    }
}

fn trip_on(vehicle_id: Uuid, loc: &Location, day: u32, hour: u32, passengers: i32) -> Trip {
    Trip {
        id: Uuid::new_v4(),
        status: TripStatus::Approved,
        start_date: date(2024, 3, day),
        start_time: time(hour, 0),
        location_id: loc.id,
        vehicle_id: Some(vehicle_id),
        requester_id: Uuid::new_v4(),
        passenger_type: "staff".to_string(),
        passenger_count: passengers,
        is_scheduled: false,
        is_instance: false,
        master_trip_id: None,
        instance_date: None,
        schedule_id: None,
        cost: None,
        end_passenger_count: None,
        version: 1,
        created_at: Utc::now(),
    }
}

fn vehicle(seats: i32, id_seed: u128) -> Vehicle {
    Vehicle {
        id: Uuid::from_u128(id_seed),
        registration: format!("FL-{:03}", id_seed),
        vehicle_type: "van".to_string(),
        seating_capacity: seats,
        seating_availability: seats,
        is_active: true,
        assigned_driver_id: None,
        cost_per_km: Decimal::new(15, 1),
        odometer_last_reading: Decimal::ZERO,
        last_latitude: None,
        last_longitude: None,
        created_at: Utc::now(),
    }
}

fn candidate(passengers: i32) -> TripCandidate {
    TripCandidate {
        start_date: date(2024, 3, 4),
        start_time: time(8, 0),
        one_way_minutes: 45,
        distance_km: 18.0,
        passenger_count: passengers,
        start_point: GeoPoint::new(48.8566, 2.3522),
        end_point: GeoPoint::new(48.7262, 2.3652),
    }
}

fn config() -> ApprovalConfig {
    ApprovalConfig {
        id: Uuid::new_v4(),
        distance_limit_km: 50.0,
        restricted_from: time(22, 0),
        restricted_to: time(5, 0),
        secondary_user_id: Uuid::new_v4(),
        safety_user_id: Uuid::new_v4(),
        updated_at: Utc::now(),
    }
}

fn pending_approval(trip_id: Uuid, require2: bool, require_safety: bool, cfg: &ApprovalConfig, hod: Uuid) -> Approval {
    let now = Utc::now();
    Approval {
        id: Uuid::new_v4(),
        trip_id,
        hod_approver_id: Some(hod),
        hod_status: ApprovalStatus::Pending,
        hod_approved_at: None,
        hod_comments: None,
        secondary_approver_id: require2.then_some(cfg.secondary_user_id),
        secondary_status: ApprovalStatus::Pending,
        secondary_approved_at: None,
        secondary_comments: None,
        safety_approver_id: require_safety.then_some(cfg.safety_user_id),
        safety_status: ApprovalStatus::Pending,
        safety_approved_at: None,
        safety_comments: None,
        require_approver2: require2,
        require_safety_approver: require_safety,
        current_step: ApprovalStep::Hod,
        overall_status: ApprovalStatus::Pending,
        rejection_reason: None,
        version: 1,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn far_routes_at_same_time_never_share_a_vehicle() {
    let vehicle_id = Uuid::new_v4();
    // El viaje existente recorre otra ciudad: ambos extremos del candidato
    // quedan a cientos de kilómetros de su ruta
    let far_location = location((45.7640, 4.8357), (45.7000, 4.9000));
    let existing = TripWithLocation {
        trip: trip_on(vehicle_id, &far_location, 4, 8, 3),
        location: far_location,
    };

    let report = detect_conflicts(&candidate(2), &[existing], 10.0);
    assert!(report.has_overlap);
    assert!(report.real_conflicts.is_empty());
    assert!(report.blocking_conflict);

    // El scorer excluye al vehículo por completo para esa franja
    let scorer = DynamicCapacityScorer;
    let eval = VehicleEvaluation {
        vehicle: vehicle(7, 1),
        report,
        position: None,
    };
    assert!(scorer.score(&candidate(2), &eval).is_none());
}

#[test]
fn shared_route_flows_from_detection_to_recommendation() {
    let vehicle_id = Uuid::from_u128(10);
    let near_location = location((48.8570, 2.3520), (48.7260, 2.3650));
    let existing = TripWithLocation {
        trip: trip_on(vehicle_id, &near_location, 4, 8, 2),
        location: near_location,
    };

    let report = detect_conflicts(&candidate(2), &[existing], 10.0);
    assert_eq!(report.real_conflicts.len(), 1);
    assert!(!report.blocking_conflict);

    let scorer = DynamicCapacityScorer;
    let shared = scorer
        .score(
            &candidate(2),
            &VehicleEvaluation {
                vehicle: vehicle(7, 10),
                report,
                position: None,
            },
        )
        .unwrap();
    let free = scorer
        .score(
            &candidate(2),
            &VehicleEvaluation {
                vehicle: vehicle(7, 11),
                report: Default::default(),
                position: None,
            },
        )
        .unwrap();

    let ranked = rank_scored(vec![free, shared]);
    assert_eq!(ranked.iter().filter(|r| r.is_recommended).count(), 1);
    assert_eq!(ranked[0].vehicle.id, Uuid::from_u128(10));
    assert!(ranked[0].is_in_conflict);
    assert!(ranked[0].conflicting_trip.is_some());
}

#[test]
fn approval_policy_drives_required_steps() {
    let cfg = config();

    // Corto y diurno: solo HOD
    let steps = required_steps(18.0, time(10, 0), &cfg);
    assert!(!steps.approver2);
    assert!(!steps.safety);

    // Largo y nocturno (la ventana cruza medianoche): los tres pasos
    let steps = required_steps(80.0, time(23, 30), &cfg);
    assert!(steps.approver2);
    assert!(steps.safety);
}

#[test]
fn full_approval_chain_with_rejection_short_circuit() {
    let cfg = config();
    let hod = Uuid::new_v4();
    let trip_id = Uuid::new_v4();
    let mut approval = pending_approval(trip_id, true, false, &cfg, hod);

    let hod_user = ActingUser { id: hod, role: UserRole::Approver };
    let effect = approval_workflow::record_decision(
        &mut approval,
        ApprovalStep::Hod,
        &hod_user,
        Decision::Approve,
        Some("ok".to_string()),
        Utc::now(),
    )
    .unwrap();
    assert!(effect.new_trip_status.is_none());
    assert_eq!(approval.current_step, ApprovalStep::Secondary);
    assert_eq!(approval.overall_status, ApprovalStatus::Pending);

    let secondary_user = ActingUser { id: cfg.secondary_user_id, role: UserRole::Approver };
    let effect = approval_workflow::record_decision(
        &mut approval,
        ApprovalStep::Secondary,
        &secondary_user,
        Decision::Reject,
        Some("fuera de presupuesto".to_string()),
        Utc::now(),
    )
    .unwrap();

    // El rechazo es terminal aunque el HOD ya hubiera aprobado
    assert_eq!(approval.overall_status, ApprovalStatus::Rejected);
    assert_eq!(approval.current_step, ApprovalStep::Completed);
    assert_eq!(effect.new_trip_status, Some(TripStatus::Rejected));
    assert_eq!(approval.hod_status, ApprovalStatus::Approved);
}

#[test]
fn scheduled_master_expands_and_replicates_approval_to_instances() {
    // Lunes 2024-01-01, diario hasta el viernes, sin fines de semana
    let schedule = Schedule {
        id: Uuid::new_v4(),
        repetition: Repetition::Daily,
        start_date: date(2024, 1, 1),
        valid_till_date: Some(date(2024, 1, 5)),
        include_weekends: false,
        repeat_after_days: None,
        created_at: Utc::now(),
    };

    let occurrences = expand_occurrences(&schedule);
    assert_eq!(
        occurrences,
        vec![date(2024, 1, 2), date(2024, 1, 3), date(2024, 1, 4), date(2024, 1, 5)]
    );

    // Maestro aprobado: cada instancia recibe la copia literal
    let cfg = config();
    let hod = Uuid::new_v4();
    let master_trip = Uuid::new_v4();
    let mut master = pending_approval(master_trip, false, false, &cfg, hod);
    approval_workflow::record_decision(
        &mut master,
        ApprovalStep::Hod,
        &ActingUser { id: hod, role: UserRole::Approver },
        Decision::Approve,
        Some("aprobado para toda la serie".to_string()),
        Utc::now(),
    )
    .unwrap();

    // cada instancia recibe la copia literal, sin reevaluación
    for _ in &occurrences {
        let instance_trip = Uuid::new_v4();
        let replica = replicate_master_approval(&master, instance_trip);
        assert_eq!(replica.trip_id, instance_trip);
        assert_eq!(replica.overall_status, ApprovalStatus::Approved);
        assert_eq!(replica.current_step, ApprovalStep::Completed);
        assert_eq!(replica.hod_approved_at, master.hod_approved_at);
        assert_eq!(replica.hod_comments, master.hod_comments);
    }
}

#[test]
fn conflict_graph_symmetry_and_cleanup() {
    let a = Uuid::from_u128(1);
    let b = Uuid::from_u128(2);
    let c = Uuid::from_u128(3);

    // La arista canónica es la misma sin importar el orden de los extremos
    assert_eq!(
        conflict_graph::canonical_pair(a, b),
        conflict_graph::canonical_pair(b, a)
    );

    let mut edges = vec![
        conflict_graph::canonical_pair(b, a),
        conflict_graph::canonical_pair(b, c),
    ];

    // A, B y C forman una componente; A ve a C a través de B
    let component = conflict_graph::component_of(a, &edges);
    assert!(component.contains(&b) && component.contains(&c));

    // "Cancelar" B: se eliminan todas las aristas que lo tocan, en una
    // sola operación sobre el almacén de aristas
    edges.retain(|(x, y)| *x != b && *y != b);

    let component = conflict_graph::component_of(a, &edges);
    assert_eq!(component.len(), 1);
    let component = conflict_graph::component_of(c, &edges);
    assert_eq!(component.len(), 1);
}

#[test]
fn main_trip_owns_the_run_odometer() {
    let early = Uuid::from_u128(7);
    let late = Uuid::from_u128(8);

    let starts = vec![
        conflict_graph::TripStart {
            trip_id: late,
            start_date: date(2024, 3, 4),
            start_time: time(9, 0),
        },
        conflict_graph::TripStart {
            trip_id: early,
            start_date: date(2024, 3, 4),
            start_time: time(8, 0),
        },
    ];

    assert_eq!(conflict_graph::main_trip(&starts), Some(early));
}
