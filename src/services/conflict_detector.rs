//! Detector de conflictos de ruta
//!
//! Dado un viaje candidato y los viajes activos de un vehículo, clasifica
//! cada solape temporal como conflicto real (rutas compatibles, oportunidad
//! de viaje compartido) o conflicto bloqueante (mismo horario, ruta
//! incompatible: el vehículo queda descartado para ese slot).

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::models::location::{GeoPoint, Location};
use crate::models::trip::Trip;
use crate::services::geo;
use crate::services::time_window::{self, TimeWindow};

/// Atributos del viaje candidato que participan en la detección
#[derive(Debug, Clone)]
pub struct TripCandidate {
    pub start_date: NaiveDate,
    pub start_time: NaiveTime,
    pub one_way_minutes: i64,
    pub distance_km: f64,
    pub passenger_count: i32,
    pub start_point: GeoPoint,
    pub end_point: GeoPoint,
}

impl TripCandidate {
    pub fn window(&self) -> TimeWindow {
        time_window::trip_window(self.start_date, self.start_time, self.one_way_minutes)
    }
}

/// Viaje existente junto con su recorrido
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripWithLocation {
    pub trip: Trip,
    pub location: Location,
}

impl TripWithLocation {
    pub fn window(&self) -> TimeWindow {
        time_window::trip_window(
            self.trip.start_date,
            self.trip.start_time,
            self.location.estimated_duration_minutes as i64,
        )
    }
}

/// Resultado de la detección para un vehículo
#[derive(Debug, Clone, Default)]
pub struct ConflictReport {
    pub has_overlap: bool,
    pub real_conflicts: Vec<TripWithLocation>,
    pub blocking_conflict: bool,
}

/// Clasifica los viajes activos de un vehículo contra el candidato.
/// Función pura: los viajes ya vienen filtrados a estados activos
/// (PENDING, APPROVED, ONGOING) por el repositorio.
pub fn detect_conflicts(
    candidate: &TripCandidate,
    vehicle_trips: &[TripWithLocation],
    radius_km: f64,
) -> ConflictReport {
    let candidate_window = candidate.window();
    let mut report = ConflictReport::default();

    for existing in vehicle_trips {
        // Chequeo grueso de mismo horario, luego el chequeo completo de ventanas
        let same_slot =
            time_window::within_start_tolerance(candidate_window.start, existing.window().start)
                || time_window::overlaps(&candidate_window, &existing.window());

        if !same_slot {
            continue;
        }

        report.has_overlap = true;

        if geo::routes_are_nearby(
            &candidate.start_point,
            &candidate.end_point,
            &existing.location,
            radius_km,
        ) {
            report.real_conflicts.push(existing.clone());
        } else {
            report.blocking_conflict = true;
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trip::TripStatus;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use sqlx::types::Json;
    use uuid::Uuid;

    fn candidate(start: (f64, f64), end: (f64, f64), hour: u32) -> TripCandidate {
        TripCandidate {
            start_date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            start_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            one_way_minutes: 45,
            distance_km: 20.0,
            passenger_count: 2,
            start_point: GeoPoint::new(start.0, start.1),
            end_point: GeoPoint::new(end.0, end.1),
        }
    }

    fn existing_trip(start: (f64, f64), end: (f64, f64), hour: u32) -> TripWithLocation {
        let location = Location {
            id: Uuid::new_v4(),
            start_address: "A".to_string(),
            start_latitude: start.0,
            start_longitude: start.1,
            end_address: "B".to_string(),
            end_latitude: end.0,
            end_longitude: end.1,
            stops: Json(vec![]),
            route_geometry: Json(vec![]),
            distance_km: 20.0,
            estimated_duration_minutes: 45,
            estimated_resting_minutes: 0,
            created_at: Utc::now(),
        };
        let trip = Trip {
            id: Uuid::new_v4(),
            status: TripStatus::Approved,
            start_date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            start_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            location_id: location.id,
            vehicle_id: Some(Uuid::new_v4()),
            requester_id: Uuid::new_v4(),
            passenger_type: "staff".to_string(),
            passenger_count: 3,
            is_scheduled: false,
            is_instance: false,
            master_trip_id: None,
            instance_date: None,
            schedule_id: None,
            cost: Some(Decimal::ZERO),
            end_passenger_count: None,
            version: 1,
            created_at: Utc::now(),
        };
        TripWithLocation { trip, location }
    }

    #[test]
    fn test_same_route_same_time_is_real_conflict() {
        let cand = candidate((48.8566, 2.3522), (48.7262, 2.3652), 8);
        let existing = existing_trip((48.8570, 2.3520), (48.7260, 2.3650), 8);

        let report = detect_conflicts(&cand, &[existing], 10.0);
        assert!(report.has_overlap);
        assert_eq!(report.real_conflicts.len(), 1);
        assert!(!report.blocking_conflict);
    }

    #[test]
    fn test_far_route_same_time_is_blocking() {
        // mismos horarios, pero los extremos del candidato quedan a más de
        // 10 km de la ruta existente: el vehículo está ocupado en otra cosa
        let cand = candidate((45.7640, 4.8357), (45.7000, 4.9000), 8);
        let existing = existing_trip((48.8566, 2.3522), (48.7262, 2.3652), 8);

        let report = detect_conflicts(&cand, &[existing], 10.0);
        assert!(report.has_overlap);
        assert!(report.real_conflicts.is_empty());
        assert!(report.blocking_conflict);
    }

    #[test]
    fn test_disjoint_windows_do_not_conflict() {
        let cand = candidate((48.8566, 2.3522), (48.7262, 2.3652), 8);
        // mismo recorrido pero 6 horas más tarde: fuera de ventana y de tolerancia
        let existing = existing_trip((48.8566, 2.3522), (48.7262, 2.3652), 14);

        let report = detect_conflicts(&cand, &[existing], 10.0);
        assert!(!report.has_overlap);
        assert!(report.real_conflicts.is_empty());
        assert!(!report.blocking_conflict);
    }

    #[test]
    fn test_start_tolerance_catches_near_misses() {
        // ventanas que apenas se tocan: la tolerancia de 60 min los trata
        // como mismo horario aunque el solape estricto sea dudoso
        let cand = candidate((48.8566, 2.3522), (48.7262, 2.3652), 8);
        let existing = existing_trip((48.8566, 2.3522), (48.7262, 2.3652), 9);

        let report = detect_conflicts(&cand, &[existing], 10.0);
        assert!(report.has_overlap);
        assert_eq!(report.real_conflicts.len(), 1);
    }

    #[test]
    fn test_mixed_conflicts_accumulate() {
        let cand = candidate((48.8566, 2.3522), (48.7262, 2.3652), 8);
        let shareable = existing_trip((48.8570, 2.3520), (48.7260, 2.3650), 8);
        let incompatible = existing_trip((45.7640, 4.8357), (45.7000, 4.9000), 8);

        let report = detect_conflicts(&cand, &[shareable, incompatible], 10.0);
        assert!(report.has_overlap);
        assert_eq!(report.real_conflicts.len(), 1);
        assert!(report.blocking_conflict);
    }
}
