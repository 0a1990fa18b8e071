//! Ventanas temporales de viajes
//!
//! Cálculo de descanso obligatorio del conductor, ventana ocupada por un
//! viaje redondo y solape entre ventanas. Funciones puras.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Tolerancia del chequeo grueso de "mismo horario" entre dos viajes
const START_TOLERANCE_MINUTES: i64 = 60;

/// Ventana temporal ocupada por un viaje (semiabierta: [start, end))
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Minutos de descanso obligatorio para un viaje cuya ida dura
/// `one_way_minutes`. El viaje redondo dura el doble de la ida:
/// hasta 3 horas no hay descanso; entre 3 y 8 horas se acumulan 15
/// minutos por cada 2 horas por encima de las 3; más de 8 horas es
/// una jornada larga con descanso plano de 4 horas.
pub fn resting_minutes(one_way_minutes: i64) -> i64 {
    let round_trip = one_way_minutes * 2;
    if round_trip <= 180 {
        0
    } else if round_trip <= 480 {
        ((round_trip - 180) / 120) * 15
    } else {
        240
    }
}

/// Ventana completa que el viaje ocupa sobre el vehículo:
/// ida + vuelta + descanso obligatorio.
pub fn trip_window(
    start_date: NaiveDate,
    start_time: NaiveTime,
    one_way_minutes: i64,
) -> TimeWindow {
    let start = start_date.and_time(start_time);
    let occupied = one_way_minutes * 2 + resting_minutes(one_way_minutes);
    TimeWindow {
        start,
        end: start + Duration::minutes(occupied),
    }
}

/// Solape de intervalos semiabiertos
pub fn overlaps(a: &TimeWindow, b: &TimeWindow) -> bool {
    a.start < b.end && b.start < a.end
}

/// Chequeo grueso: dos viajes cuentan como "al mismo horario" si sus
/// horas de salida crudas difieren en una hora o menos. Se aplica antes
/// del chequeo completo de ventanas.
pub fn within_start_tolerance(a: NaiveDateTime, b: NaiveDateTime) -> bool {
    (a - b).num_minutes().abs() <= START_TOLERANCE_MINUTES
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_resting_minutes_boundary_at_three_hours() {
        // ida de 90 min -> redondo exactamente 180 min -> sin descanso
        assert_eq!(resting_minutes(90), 0);
    }

    #[test]
    fn test_resting_minutes_mid_tier() {
        // ida de 150 min -> redondo 300 min -> floor((300-180)/120)*15 = 15
        assert_eq!(resting_minutes(150), 15);
    }

    #[test]
    fn test_resting_minutes_long_day() {
        // ida de 300 min -> redondo 600 min -> jornada larga, 240 min
        assert_eq!(resting_minutes(300), 240);
    }

    #[test]
    fn test_resting_minutes_upper_tier_boundary() {
        // redondo exactamente 480 -> todavía en el tramo escalonado
        assert_eq!(resting_minutes(240), ((480 - 180) / 120) * 15);
        // un minuto más de ida ya cae en jornada larga
        assert_eq!(resting_minutes(241), 240);
    }

    #[test]
    fn test_trip_window_includes_return_and_rest() {
        // ida 150 min: ventana = 300 + 15 de descanso = 315 min
        let w = trip_window(date(2024, 3, 4), time(8, 0), 150);
        assert_eq!(w.start, date(2024, 3, 4).and_time(time(8, 0)));
        assert_eq!(w.end, date(2024, 3, 4).and_time(time(13, 15)));
    }

    #[test]
    fn test_overlaps() {
        let a = trip_window(date(2024, 3, 4), time(8, 0), 60);
        let b = trip_window(date(2024, 3, 4), time(9, 0), 60);
        let c = trip_window(date(2024, 3, 4), time(12, 0), 60);

        assert!(overlaps(&a, &b));
        assert!(overlaps(&b, &a));
        assert!(!overlaps(&a, &c));
    }

    #[test]
    fn test_adjacent_windows_do_not_overlap() {
        // a termina 10:00, b empieza 10:00: semiabierto, no hay solape
        let a = trip_window(date(2024, 3, 4), time(8, 0), 60);
        let b = trip_window(date(2024, 3, 4), time(10, 0), 60);
        assert!(!overlaps(&a, &b));
    }

    #[test]
    fn test_within_start_tolerance() {
        let base = date(2024, 3, 4).and_time(time(8, 0));
        let close = date(2024, 3, 4).and_time(time(9, 0));
        let far = date(2024, 3, 4).and_time(time(9, 1));

        assert!(within_start_tolerance(base, close));
        assert!(within_start_tolerance(close, base));
        assert!(!within_start_tolerance(base, far));
    }
}
