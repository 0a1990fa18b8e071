//! Motor de disponibilidad de vehículos
//!
//! Filtra, puntúa y ordena la flota para un viaje candidato. La
//! evaluación por vehículo es concurrente (el detector y el scoring son
//! puros) y el resultado se mezcla en un orden determinista: puntaje,
//! menor capacidad sobrante, proximidad y por último id, de modo que la
//! concurrencia nunca cambia el orden final.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use sqlx::PgPool;

use crate::models::location::GeoPoint;
use crate::models::vehicle::Vehicle;
use crate::repositories::trip_repository::TripRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::services::conflict_detector::{
    detect_conflicts, ConflictReport, TripCandidate, TripWithLocation,
};
use crate::services::geo;
use crate::services::location_oracle::VehicleLocationOracle;
use crate::utils::errors::AppResult;

/// Radio de búsqueda para considerar dos rutas compatibles
pub const DEFAULT_ROUTE_RADIUS_KM: f64 = 10.0;

/// Puntaje base cuando existe oportunidad de viaje compartido
const RIDE_SHARE_BASE_SCORE: i64 = 1000;
/// Bono máximo por cercanía de horarios entre viajes compartibles
const TIME_PROXIMITY_MAX_BONUS: i64 = 300;
/// Bono máximo por ajuste exacto de capacidad
const CAPACITY_FIT_MAX_BONUS: i64 = 500;
/// Decaimiento del bono de capacidad por cada asiento sobrante
const CAPACITY_FIT_DECAY_PER_SEAT: i64 = 100;
/// Bono máximo por vehículo estacionado cerca del punto de recogida
const PICKUP_DISTANCE_MAX_BONUS: i64 = 200;
/// Radio dentro del cual aplica el bono de cercanía
const PICKUP_DISTANCE_RADIUS_KM: f64 = 5.0;
/// Velocidad media urbana para estimar llegada del vehículo
const AVERAGE_SPEED_KMH: f64 = 30.0;

/// Evaluación cruda de un vehículo contra el candidato
#[derive(Debug, Clone)]
pub struct VehicleEvaluation {
    pub vehicle: Vehicle,
    pub report: ConflictReport,
    pub position: Option<GeoPoint>,
}

/// Vehículo puntuado, todavía sin ordenar
#[derive(Debug, Clone)]
pub struct ScoredVehicle {
    pub vehicle: Vehicle,
    pub score: i64,
    pub leftover_capacity: i32,
    pub reason: String,
    pub distance_from_start_km: Option<f64>,
    pub is_in_conflict: bool,
    pub conflicting_trip: Option<TripWithLocation>,
}

/// Fila final del ranking devuelta al caller
#[derive(Debug, Clone, Serialize)]
pub struct RankedVehicle {
    pub vehicle: Vehicle,
    pub is_recommended: bool,
    pub recommendation_reason: String,
    pub score: i64,
    pub leftover_capacity: i32,
    pub distance_from_start_meters: Option<f64>,
    pub estimated_arrival_minutes: Option<i64>,
    pub is_in_conflict: bool,
    pub conflicting_trip: Option<TripWithLocation>,
}

/// Estrategia de puntuación de vehículos. `None` significa que el
/// vehículo queda excluido para este candidato.
pub trait VehicleScorer: Send + Sync {
    fn score(&self, candidate: &TripCandidate, eval: &VehicleEvaluation) -> Option<ScoredVehicle>;
}

/// Estrategia canónica: la capacidad disponible se calcula dinámicamente
/// contra los pasajeros de los viajes compartibles solapados, y el límite
/// de asientos sí se aplica.
pub struct DynamicCapacityScorer;

impl VehicleScorer for DynamicCapacityScorer {
    fn score(&self, candidate: &TripCandidate, eval: &VehicleEvaluation) -> Option<ScoredVehicle> {
        let report = &eval.report;

        // Solape con una ruta incompatible: el vehículo está ocupado en
        // otro recorrido y queda fuera para esta franja
        if report.blocking_conflict {
            return None;
        }

        let shared_passengers: i32 = report
            .real_conflicts
            .iter()
            .map(|t| t.trip.passenger_count)
            .sum();

        // Un asiento siempre se descuenta para el conductor
        let remaining = eval.vehicle.seating_capacity - 1 - shared_passengers;
        let leftover = remaining - candidate.passenger_count;
        if leftover < 0 {
            return None;
        }

        let mut score = 0i64;
        let mut reasons: Vec<String> = Vec::new();

        if !report.real_conflicts.is_empty() {
            score += RIDE_SHARE_BASE_SCORE;
            reasons.push("oportunidad de viaje compartido con un viaje existente".to_string());

            let candidate_start = candidate.start_date.and_time(candidate.start_time);
            let nearest_diff = report
                .real_conflicts
                .iter()
                .map(|t| (t.trip.starts_at() - candidate_start).num_minutes().abs())
                .min()
                .unwrap_or(i64::MAX);
            score += (TIME_PROXIMITY_MAX_BONUS - nearest_diff).max(0);
        }

        let capacity_bonus =
            (CAPACITY_FIT_MAX_BONUS - leftover as i64 * CAPACITY_FIT_DECAY_PER_SEAT).max(0);
        score += capacity_bonus;
        if leftover == 0 {
            reasons.push("capacidad exacta para el grupo".to_string());
        }

        let distance_from_start_km = eval
            .position
            .map(|p| geo::distance_between(&p, &candidate.start_point));
        if let Some(d) = distance_from_start_km {
            if d <= PICKUP_DISTANCE_RADIUS_KM {
                score += ((PICKUP_DISTANCE_RADIUS_KM - d) / PICKUP_DISTANCE_RADIUS_KM
                    * PICKUP_DISTANCE_MAX_BONUS as f64) as i64;
                reasons.push(format!("vehículo a {:.1} km del punto de recogida", d));
            }
        }

        if reasons.is_empty() {
            reasons.push("vehículo libre en la franja solicitada".to_string());
        }

        let conflicting_trip = report.real_conflicts.first().cloned();

        Some(ScoredVehicle {
            vehicle: eval.vehicle.clone(),
            score,
            leftover_capacity: leftover,
            reason: reasons.join("; "),
            distance_from_start_km,
            is_in_conflict: !report.real_conflicts.is_empty(),
            conflicting_trip,
        })
    }
}

/// Orden de desempate determinista para elegir el recomendado:
/// mayor puntaje, menor sobrante, menor distancia, menor id.
fn recommendation_key(v: &ScoredVehicle) -> (i64, i32, u64, uuid::Uuid) {
    let distance_rank = v
        .distance_from_start_km
        .map(|d| (d * 1000.0) as u64)
        .unwrap_or(u64::MAX);
    (-v.score, v.leftover_capacity, distance_rank, v.vehicle.id)
}

/// Ordena los vehículos puntuados: exactamente uno queda recomendado
/// (el de mayor puntaje, desempatado por menor sobrante y proximidad) y
/// el resto se ordena por capacidad sobrante ascendente.
pub fn rank_scored(mut scored: Vec<ScoredVehicle>) -> Vec<RankedVehicle> {
    if scored.is_empty() {
        return Vec::new();
    }

    scored.sort_by_key(recommendation_key);
    let recommended = scored.remove(0);
    scored.sort_by_key(|v| (v.leftover_capacity, v.vehicle.id));

    let mut ranked = Vec::with_capacity(scored.len() + 1);
    ranked.push(to_ranked(recommended, true));
    ranked.extend(scored.into_iter().map(|v| to_ranked(v, false)));
    ranked
}

fn to_ranked(v: ScoredVehicle, is_recommended: bool) -> RankedVehicle {
    let estimated_arrival_minutes = v
        .distance_from_start_km
        .map(|d| (d / AVERAGE_SPEED_KMH * 60.0).ceil() as i64);
    RankedVehicle {
        vehicle: v.vehicle,
        is_recommended,
        recommendation_reason: v.reason,
        score: v.score,
        leftover_capacity: v.leftover_capacity,
        distance_from_start_meters: v.distance_from_start_km.map(|d| d * 1000.0),
        estimated_arrival_minutes,
        is_in_conflict: v.is_in_conflict,
        conflicting_trip: v.conflicting_trip,
    }
}

/// Motor de disponibilidad: orquesta repositorios, oráculo de posición,
/// detector de conflictos y scoring.
pub struct AvailabilityEngine {
    vehicle_repository: VehicleRepository,
    trip_repository: TripRepository,
    oracle: Arc<dyn VehicleLocationOracle>,
    scorer: Box<dyn VehicleScorer>,
    route_radius_km: f64,
}

impl AvailabilityEngine {
    pub fn new(pool: PgPool, oracle: Arc<dyn VehicleLocationOracle>) -> Self {
        Self {
            vehicle_repository: VehicleRepository::new(pool.clone()),
            trip_repository: TripRepository::new(pool),
            oracle,
            scorer: Box::new(DynamicCapacityScorer),
            route_radius_km: DEFAULT_ROUTE_RADIUS_KM,
        }
    }

    /// Evalúa toda la flota activa contra el candidato y devuelve el
    /// ranking con exactamente un vehículo recomendado (si hay alguno
    /// disponible).
    pub async fn rank_vehicles(&self, candidate: &TripCandidate) -> AppResult<Vec<RankedVehicle>> {
        let vehicles = self.vehicle_repository.find_active().await?;
        log::info!(
            "🚐 Evaluando {} vehículos activos para el candidato",
            vehicles.len()
        );

        let evaluations = join_all(vehicles.into_iter().map(|vehicle| async move {
            let trips = self
                .trip_repository
                .find_active_by_vehicle_with_location(vehicle.id)
                .await?;
            let report = detect_conflicts(candidate, &trips, self.route_radius_km);
            let position = self.oracle.locate(&vehicle).await;
            Ok::<VehicleEvaluation, crate::utils::errors::AppError>(VehicleEvaluation {
                vehicle,
                report,
                position,
            })
        }))
        .await;

        let mut scored = Vec::new();
        for evaluation in evaluations {
            let evaluation = evaluation?;
            if let Some(s) = self.scorer.score(candidate, &evaluation) {
                scored.push(s);
            }
        }

        let ranked = rank_scored(scored);
        log::info!(
            "✅ Ranking calculado: {} vehículos elegibles",
            ranked.len()
        );
        Ok(ranked)
    }
}
