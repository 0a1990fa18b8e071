//! Primitivas geoespaciales
//!
//! Distancia de círculo máximo y proximidad de un punto a la ruta de un
//! viaje existente. Funciones puras, sin I/O ni logging.

use crate::models::location::{GeoPoint, Location};

/// Radio medio de la Tierra en kilómetros
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Cantidad de muestras uniformes tomadas de la geometría de ruta.
/// El muestreo existe solo para acotar el costo en polilíneas largas.
const ROUTE_GEOMETRY_SAMPLES: usize = 20;

/// Distancia haversine entre dos coordenadas, en kilómetros
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Distancia entre dos puntos, en kilómetros
pub fn distance_between(a: &GeoPoint, b: &GeoPoint) -> f64 {
    distance_km(a.latitude, a.longitude, b.latitude, b.longitude)
}

/// Si `point` queda a `radius_km` o menos de la ruta descrita por `location`:
/// origen, destino, cada parada intermedia y una submuestra uniforme de la
/// geometría de ruta.
pub fn is_point_near_route(point: &GeoPoint, location: &Location, radius_km: f64) -> bool {
    let mut min_distance = distance_between(point, &location.start_point());

    let to_end = distance_between(point, &location.end_point());
    if to_end < min_distance {
        min_distance = to_end;
    }

    for stop in location.stops.0.iter() {
        let d = distance_between(point, &stop.point());
        if d < min_distance {
            min_distance = d;
        }
    }

    let geometry = &location.route_geometry.0;
    if !geometry.is_empty() {
        let step = (geometry.len() / ROUTE_GEOMETRY_SAMPLES).max(1);
        for pair in geometry.iter().step_by(step) {
            // la geometría viene como pares [lng, lat]
            let sample = GeoPoint::new(pair[1], pair[0]);
            let d = distance_between(point, &sample);
            if d < min_distance {
                min_distance = d;
            }
        }
    }

    min_distance <= radius_km
}

/// Si AMBOS extremos del viaje nuevo quedan cerca de la ruta existente.
/// Esta es la condición para que dos viajes puedan compartir un mismo
/// recorrido de vehículo; un solo extremo cercano no alcanza.
pub fn routes_are_nearby(
    new_start: &GeoPoint,
    new_end: &GeoPoint,
    existing: &Location,
    radius_km: f64,
) -> bool {
    is_point_near_route(new_start, existing, radius_km)
        && is_point_near_route(new_end, existing, radius_km)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::location::Stop;
    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    fn location(start: (f64, f64), end: (f64, f64), geometry: Vec<[f64; 2]>) -> Location {
        Location {
            id: Uuid::new_v4(),
            start_address: "Origen".to_string(),
            start_latitude: start.0,
            start_longitude: start.1,
            end_address: "Destino".to_string(),
            end_latitude: end.0,
            end_longitude: end.1,
            stops: Json(vec![]),
            route_geometry: Json(geometry),
            distance_km: 10.0,
            estimated_duration_minutes: 30,
            estimated_resting_minutes: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_distance_known_pair() {
        // Paris centro -> Orly, ~15 km en línea recta
        let d = distance_km(48.8566, 2.3522, 48.7262, 2.3652);
        assert!(d > 13.0 && d < 16.0, "distance was {}", d);
    }

    #[test]
    fn test_distance_zero_for_same_point() {
        let d = distance_km(48.8566, 2.3522, 48.8566, 2.3522);
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn test_point_on_start_is_always_near() {
        let loc = location((48.8566, 2.3522), (48.7262, 2.3652), vec![]);
        let point = GeoPoint::new(48.8566, 2.3522);
        assert!(is_point_near_route(&point, &loc, 0.001));
    }

    #[test]
    fn test_far_point_is_not_near() {
        let loc = location((48.8566, 2.3522), (48.7262, 2.3652), vec![]);
        // Marsella, a ~660 km
        let point = GeoPoint::new(43.2965, 5.3698);
        assert!(!is_point_near_route(&point, &loc, 10.0));
    }

    #[test]
    fn test_geometry_samples_count_toward_proximity() {
        // Origen y destino lejos del punto, pero la geometría pasa al lado
        let loc = location(
            (48.8566, 2.3522),
            (48.7262, 2.3652),
            vec![[2.36, 48.80], [2.37, 48.79]],
        );
        let point = GeoPoint::new(48.80, 2.36);
        assert!(is_point_near_route(&point, &loc, 1.0));
    }

    #[test]
    fn test_stops_count_toward_proximity() {
        let mut loc = location((48.8566, 2.3522), (48.7262, 2.3652), vec![]);
        loc.stops = Json(vec![Stop {
            address: "Parada".to_string(),
            latitude: 48.80,
            longitude: 2.40,
        }]);
        let point = GeoPoint::new(48.801, 2.401);
        assert!(is_point_near_route(&point, &loc, 1.0));
    }

    #[test]
    fn test_routes_nearby_requires_both_endpoints() {
        let loc = location((48.8566, 2.3522), (48.7262, 2.3652), vec![]);
        let near_start = GeoPoint::new(48.8570, 2.3520);
        let near_end = GeoPoint::new(48.7260, 2.3650);
        // Lyon, lejos de todo el recorrido
        let far = GeoPoint::new(45.7640, 4.8357);

        assert!(routes_are_nearby(&near_start, &near_end, &loc, 5.0));
        assert!(!routes_are_nearby(&near_start, &far, &loc, 5.0));
        assert!(!routes_are_nearby(&far, &near_end, &loc, 5.0));
    }
}
