//! Servicio de viajes
//!
//! Orquesta la creación de viajes (con instancias programadas), la
//! cancelación, la asignación de vehículo y las lecturas de odómetro.
//! Toda mutación multi-paso corre dentro de una única transacción: no
//! quedan aristas de grafo a medias ni approvals huérfanos.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::approval::{Approval, ApprovalStatus, ApprovalStep};
use crate::models::location::Location;
use crate::models::schedule::Repetition;
use crate::models::trip::{Trip, TripStatus};
use crate::models::user::ActingUser;
use crate::repositories::approval_repository::ApprovalRepository;
use crate::repositories::conflict_repository::ConflictRepository;
use crate::repositories::location_repository::{LocationRepository, NewLocation};
use crate::repositories::odometer_repository::OdometerRepository;
use crate::repositories::schedule_repository::ScheduleRepository;
use crate::repositories::trip_repository::{NewTrip, TripRepository};
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::services::availability::DEFAULT_ROUTE_RADIUS_KM;
use crate::services::conflict_detector::{detect_conflicts, TripCandidate};
use crate::services::conflict_graph::{self, TripStart};
use crate::services::events::{DomainEvent, EventPublisher, LogEventPublisher};
use crate::services::identity::{
    ApprovalConfigProvider, IdentityLookup, PgApprovalConfigProvider, PgIdentityLookup,
};
use crate::services::schedule_instancer;
use crate::services::time_window;
use crate::services::approval_workflow;
use crate::utils::errors::{AppError, AppResult};

/// Datos de entrada para crear un viaje
#[derive(Debug, Clone)]
pub struct CreateTripInput {
    pub start_date: NaiveDate,
    pub start_time: NaiveTime,
    pub location: NewLocation,
    pub passenger_type: String,
    pub passenger_count: i32,
    pub vehicle_id: Option<Uuid>,
    pub save_as_draft: bool,
    pub schedule: Option<ScheduleInput>,
}

#[derive(Debug, Clone)]
pub struct ScheduleInput {
    pub repetition: Repetition,
    pub valid_till_date: Option<NaiveDate>,
    pub include_weekends: bool,
    pub repeat_after_days: Option<i32>,
}

/// Resultado de la creación
#[derive(Debug)]
pub struct TripResult {
    pub trip: Trip,
    pub requires_approval: bool,
    pub instance_ids: Vec<Uuid>,
}

#[derive(Debug)]
pub struct CancelResult {
    pub trip: Trip,
    pub removed_links: u64,
}

/// Tipo de lectura de odómetro
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingKind {
    Start,
    End,
}

#[derive(Debug)]
pub struct ReadingResult {
    pub trip: Trip,
    pub log: crate::models::odometer::OdometerLog,
    pub cost: Option<Decimal>,
}

pub struct TripService {
    pool: PgPool,
    trips: TripRepository,
    locations: LocationRepository,
    schedules: ScheduleRepository,
    approvals: ApprovalRepository,
    vehicles: VehicleRepository,
    conflicts: ConflictRepository,
    odometers: OdometerRepository,
    identity: Arc<dyn IdentityLookup>,
    approval_config: Arc<dyn ApprovalConfigProvider>,
    events: Arc<dyn EventPublisher>,
}

impl TripService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            trips: TripRepository::new(pool.clone()),
            locations: LocationRepository::new(pool.clone()),
            schedules: ScheduleRepository::new(pool.clone()),
            approvals: ApprovalRepository::new(pool.clone()),
            vehicles: VehicleRepository::new(pool.clone()),
            conflicts: ConflictRepository::new(pool.clone()),
            odometers: OdometerRepository::new(pool.clone()),
            identity: Arc::new(PgIdentityLookup::new(pool.clone())),
            approval_config: Arc::new(PgApprovalConfigProvider::new(pool.clone())),
            events: Arc::new(LogEventPublisher),
            pool,
        }
    }

    /// Crea el viaje, su recorrido, el approval requerido y, si es un
    /// viaje programado, todas sus instancias. Una sola transacción.
    pub async fn create_trip(
        &self,
        input: CreateTripInput,
        requester: &ActingUser,
    ) -> AppResult<TripResult> {
        if input.passenger_count < 1 {
            return Err(AppError::BadRequest(
                "Passenger count must be at least 1".to_string(),
            ));
        }
        if let Some(schedule) = &input.schedule {
            if let Some(valid_till) = schedule.valid_till_date {
                if valid_till <= input.start_date {
                    return Err(AppError::BadRequest(
                        "Schedule end date must be after the start date".to_string(),
                    ));
                }
            }
        }

        let config = self.approval_config.current().await?;

        let mut location = input.location.clone();
        location.estimated_resting_minutes =
            time_window::resting_minutes(location.estimated_duration_minutes as i64) as i32;

        let status = if input.save_as_draft {
            TripStatus::Draft
        } else {
            TripStatus::Pending
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error starting transaction: {}", e)))?;

        let location = self.locations.create_tx(&mut *tx, location).await?;

        let schedule_row = match &input.schedule {
            Some(s) if s.repetition != Repetition::Once => Some(
                self.schedules
                    .create_tx(
                        &mut *tx,
                        s.repetition,
                        input.start_date,
                        s.valid_till_date,
                        s.include_weekends,
                        s.repeat_after_days,
                    )
                    .await?,
            ),
            _ => None,
        };

        let trip = self
            .trips
            .create_tx(
                &mut *tx,
                NewTrip {
                    status,
                    start_date: input.start_date,
                    start_time: input.start_time,
                    location_id: location.id,
                    vehicle_id: input.vehicle_id,
                    requester_id: requester.id,
                    passenger_type: input.passenger_type.clone(),
                    passenger_count: input.passenger_count,
                    is_scheduled: schedule_row.is_some(),
                    is_instance: false,
                    master_trip_id: None,
                    instance_date: None,
                    schedule_id: schedule_row.as_ref().map(|s| s.id),
                },
            )
            .await?;

        // Los borradores no entran al flujo de aprobación hasta enviarse
        let requires_approval = !input.save_as_draft;
        if requires_approval {
            let head = self
                .identity
                .department_head_of(requester.id)
                .await?
                .ok_or_else(|| {
                    AppError::BadRequest(
                        "Requester has no department head to approve the trip".to_string(),
                    )
                })?;

            let required = approval_workflow::required_steps(
                location.distance_km,
                input.start_time,
                &config,
            );

            let now = Utc::now();
            let approval = Approval {
                id: Uuid::new_v4(),
                trip_id: trip.id,
                hod_approver_id: Some(head),
                hod_status: ApprovalStatus::Pending,
                hod_approved_at: None,
                hod_comments: None,
                secondary_approver_id: required.approver2.then_some(config.secondary_user_id),
                secondary_status: ApprovalStatus::Pending,
                secondary_approved_at: None,
                secondary_comments: None,
                safety_approver_id: required.safety.then_some(config.safety_user_id),
                safety_status: ApprovalStatus::Pending,
                safety_approved_at: None,
                safety_comments: None,
                require_approver2: required.approver2,
                require_safety_approver: required.safety,
                current_step: ApprovalStep::Hod,
                overall_status: ApprovalStatus::Pending,
                rejection_reason: None,
                version: 1,
                created_at: now,
                updated_at: now,
            };
            self.approvals.create_tx(&mut *tx, &approval).await?;
        }

        // Vehículo elegido al crear: serializar la franja y verificar
        // conflictos antes de ligarlo
        if let Some(vehicle_id) = input.vehicle_id {
            self.vehicles.advisory_lock_tx(&mut *tx, vehicle_id).await?;
            let vehicle = self
                .vehicles
                .find_by_id(vehicle_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;
            if !vehicle.is_active {
                return Err(AppError::BadRequest("Vehicle is not active".to_string()));
            }

            let candidate = candidate_from_parts(&trip, &location);
            let existing = self
                .trips
                .find_active_by_vehicle_with_location(vehicle_id)
                .await?;
            let report = detect_conflicts(&candidate, &existing, DEFAULT_ROUTE_RADIUS_KM);

            if report.blocking_conflict {
                return Err(AppError::Conflict(
                    "Vehicle is busy on an incompatible route in that time slot".to_string(),
                ));
            }

            let shared: i32 = report
                .real_conflicts
                .iter()
                .map(|t| t.trip.passenger_count)
                .sum();
            if vehicle.seating_capacity - 1 - shared < trip.passenger_count {
                return Err(AppError::Conflict(
                    "Vehicle has no remaining seats for that time slot".to_string(),
                ));
            }

            for partner in &report.real_conflicts {
                self.conflicts.link_tx(&mut *tx, trip.id, partner.trip.id).await?;
            }
        }

        // Expansión de instancias del viaje programado
        let mut instance_ids = Vec::new();
        if let Some(schedule_row) = &schedule_row {
            for occurrence in schedule_instancer::expand_occurrences(schedule_row) {
                let instance_location = self.locations.clone_tx(&mut *tx, location.id).await?;
                let instance = self
                    .trips
                    .create_tx(
                        &mut *tx,
                        NewTrip {
                            status: TripStatus::Pending,
                            start_date: occurrence,
                            start_time: input.start_time,
                            location_id: instance_location.id,
                            vehicle_id: input.vehicle_id,
                            requester_id: requester.id,
                            passenger_type: input.passenger_type.clone(),
                            passenger_count: input.passenger_count,
                            is_scheduled: false,
                            is_instance: true,
                            master_trip_id: Some(trip.id),
                            instance_date: Some(occurrence),
                            schedule_id: Some(schedule_row.id),
                        },
                    )
                    .await?;
                instance_ids.push(instance.id);
            }
        }

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error committing trip: {}", e)))?;

        log::info!(
            "🧾 Viaje {} creado con {} instancias",
            trip.id,
            instance_ids.len()
        );
        self.events.publish(DomainEvent::TripCreated {
            trip_id: trip.id,
            requester_id: requester.id,
        });

        Ok(TripResult {
            trip,
            requires_approval,
            instance_ids,
        })
    }

    /// Cancela el viaje: borra su approval, desengancha todas sus aristas
    /// del grafo de conflictos y marca el estado. Una sola transacción.
    pub async fn cancel_trip(
        &self,
        trip_id: Uuid,
        actor: &ActingUser,
        reason: Option<String>,
    ) -> AppResult<CancelResult> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error starting transaction: {}", e)))?;

        let trip = self
            .trips
            .find_by_id_for_update(&mut *tx, trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;

        if trip.requester_id != actor.id && !actor.is_sysadmin() {
            return Err(AppError::Forbidden(
                "Only the requester or a sysadmin can cancel a trip".to_string(),
            ));
        }

        if !TripStatus::CANCELABLE.contains(&trip.status) {
            return Err(AppError::BadRequest(format!(
                "Trip in status '{}' can no longer be cancelled",
                trip.status.as_str()
            )));
        }

        self.approvals.delete_by_trip_tx(&mut *tx, trip_id).await?;
        let removed_links = self.conflicts.unlink_all_tx(&mut *tx, trip_id).await?;
        let trip = self
            .trips
            .update_status_tx(&mut *tx, trip_id, trip.version, TripStatus::Cancelled)
            .await?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error committing cancellation: {}", e)))?;

        log::info!("🚫 Viaje {} cancelado ({} enlaces removidos)", trip_id, removed_links);
        self.events.publish(DomainEvent::TripCancelled {
            trip_id,
            reason,
        });

        Ok(CancelResult {
            trip,
            removed_links,
        })
    }

    /// Asigna un vehículo verificando conflictos bajo el lock de franja
    /// del vehículo, y liga en el grafo los viajes compartibles.
    pub async fn assign_vehicle(
        &self,
        trip_id: Uuid,
        vehicle_id: Uuid,
        actor: &ActingUser,
    ) -> AppResult<Trip> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error starting transaction: {}", e)))?;

        self.vehicles.advisory_lock_tx(&mut *tx, vehicle_id).await?;

        let trip = self
            .trips
            .find_by_id_for_update(&mut *tx, trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;

        if trip.requester_id != actor.id && !actor.is_sysadmin() {
            return Err(AppError::Forbidden(
                "Only the requester or a sysadmin can assign a vehicle".to_string(),
            ));
        }

        if !matches!(trip.status, TripStatus::Draft | TripStatus::Pending) {
            return Err(AppError::BadRequest(format!(
                "Cannot change vehicle for a trip in status '{}'",
                trip.status.as_str()
            )));
        }

        let vehicle = self
            .vehicles
            .find_by_id(vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;
        if !vehicle.is_active {
            return Err(AppError::BadRequest("Vehicle is not active".to_string()));
        }

        let location = self
            .locations
            .find_by_id(trip.location_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip location not found".to_string()))?;

        let candidate = candidate_from_parts(&trip, &location);
        let existing = self
            .trips
            .find_active_by_vehicle_with_location(vehicle_id)
            .await?;
        let report = detect_conflicts(&candidate, &existing, DEFAULT_ROUTE_RADIUS_KM);

        if report.blocking_conflict {
            return Err(AppError::Conflict(
                "Vehicle is busy on an incompatible route in that time slot".to_string(),
            ));
        }

        let shared: i32 = report
            .real_conflicts
            .iter()
            .map(|t| t.trip.passenger_count)
            .sum();
        if vehicle.seating_capacity - 1 - shared < trip.passenger_count {
            return Err(AppError::Conflict(
                "Vehicle has no remaining seats for that time slot".to_string(),
            ));
        }

        let trip = self
            .trips
            .assign_vehicle_tx(&mut *tx, trip_id, trip.version, vehicle_id)
            .await?;

        for partner in &report.real_conflicts {
            self.conflicts.link_tx(&mut *tx, trip.id, partner.trip.id).await?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error committing assignment: {}", e)))?;

        log::info!("🚐 Vehículo {} asignado al viaje {}", vehicle_id, trip_id);
        self.events.publish(DomainEvent::VehicleAssigned {
            trip_id,
            vehicle_id,
        });

        Ok(trip)
    }

    /// Vincula explícitamente dos viajes como parte del mismo recorrido
    pub async fn link_trips(
        &self,
        trip_id: Uuid,
        other_trip_id: Uuid,
        actor: &ActingUser,
    ) -> AppResult<Vec<Uuid>> {
        let trip = self
            .trips
            .find_by_id(trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;
        let other = self
            .trips
            .find_by_id(other_trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Linked trip not found".to_string()))?;

        if trip.requester_id != actor.id && !actor.is_sysadmin() {
            return Err(AppError::Forbidden(
                "Only the requester or a sysadmin can link trips".to_string(),
            ));
        }

        if trip.vehicle_id.is_none() || trip.vehicle_id != other.vehicle_id {
            return Err(AppError::BadRequest(
                "Linked trips must share the same vehicle".to_string(),
            ));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error starting transaction: {}", e)))?;
        self.conflicts.link_tx(&mut *tx, trip_id, other_trip_id).await?;
        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error committing link: {}", e)))?;

        self.conflicts.partners_of(trip_id).await
    }

    /// Registra una lectura de odómetro. La lectura de inicio pasa el
    /// viaje a ONGOING; la de fin calcula el costo, cierra el viaje y
    /// actualiza el odómetro del vehículo. Una sola transacción.
    pub async fn record_odometer_reading(
        &self,
        trip_id: Uuid,
        actor: &ActingUser,
        reading: Decimal,
        kind: ReadingKind,
        end_passenger_count: Option<i32>,
    ) -> AppResult<ReadingResult> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error starting transaction: {}", e)))?;

        let trip = self
            .trips
            .find_by_id_for_update(&mut *tx, trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;

        let vehicle_id = trip.vehicle_id.ok_or_else(|| {
            AppError::BadRequest("Trip has no vehicle assigned".to_string())
        })?;
        let vehicle = self
            .vehicles
            .find_by_id(vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        let is_driver = vehicle.assigned_driver_id == Some(actor.id);
        if !is_driver && trip.requester_id != actor.id && !actor.is_sysadmin() {
            return Err(AppError::Forbidden(
                "Only the driver, the requester or a sysadmin can record readings".to_string(),
            ));
        }

        // La lectura canónica del recorrido completo pertenece al viaje
        // principal de la componente (el que sale primero)
        self.ensure_main_trip(&trip).await?;

        if reading < vehicle.odometer_last_reading {
            return Err(AppError::BadRequest(format!(
                "Reading {} is below the vehicle's last odometer value {}",
                reading, vehicle.odometer_last_reading
            )));
        }

        let now = Utc::now();
        let existing_log = self.odometers.find_by_trip_for_update(&mut *tx, trip_id).await?;

        let result = match kind {
            ReadingKind::Start => {
                if trip.status != TripStatus::Approved {
                    return Err(AppError::BadRequest(
                        "Start reading requires an approved trip".to_string(),
                    ));
                }
                if existing_log.is_some() {
                    return Err(AppError::BadRequest(
                        "Start reading was already recorded".to_string(),
                    ));
                }

                let log = self
                    .odometers
                    .record_start_tx(&mut *tx, trip_id, reading, actor.id, now)
                    .await?;
                let trip = self
                    .trips
                    .update_status_tx(&mut *tx, trip_id, trip.version, TripStatus::Ongoing)
                    .await?;
                self.vehicles
                    .update_odometer_tx(&mut *tx, vehicle_id, reading)
                    .await?;

                ReadingResult {
                    trip,
                    log,
                    cost: None,
                }
            }
            ReadingKind::End => {
                if trip.status != TripStatus::Ongoing {
                    return Err(AppError::BadRequest(
                        "End reading requires an ongoing trip".to_string(),
                    ));
                }
                let log = existing_log.ok_or_else(|| {
                    AppError::BadRequest("Start reading was never recorded".to_string())
                })?;
                if log.end_reading.is_some() {
                    return Err(AppError::BadRequest(
                        "End reading was already recorded".to_string(),
                    ));
                }
                let start_reading = log.start_reading.ok_or_else(|| {
                    AppError::BadRequest("Start reading was never recorded".to_string())
                })?;
                if reading < start_reading {
                    return Err(AppError::BadRequest(
                        "End reading cannot be below the start reading".to_string(),
                    ));
                }

                let cost = (reading - start_reading) * vehicle.cost_per_km;
                let log = self
                    .odometers
                    .record_end_tx(&mut *tx, trip_id, reading, actor.id, now)
                    .await?;
                let trip = self
                    .trips
                    .complete_tx(
                        &mut *tx,
                        trip_id,
                        trip.version,
                        cost,
                        end_passenger_count.unwrap_or(trip.passenger_count),
                    )
                    .await?;
                self.vehicles
                    .update_odometer_tx(&mut *tx, vehicle_id, reading)
                    .await?;

                ReadingResult {
                    trip,
                    log,
                    cost: Some(cost),
                }
            }
        };

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Error committing reading: {}", e)))?;

        if kind == ReadingKind::Start {
            self.events.publish(DomainEvent::TripConfirmed { trip_id });
        }
        log::info!("🧮 Lectura de odómetro registrada para el viaje {}", trip_id);

        Ok(result)
    }

    /// Verifica que el viaje sea el principal de su componente conexa
    async fn ensure_main_trip(&self, trip: &Trip) -> AppResult<()> {
        let component_ids = self.conflicts.component_of(trip.id).await?;
        if component_ids.len() <= 1 {
            return Ok(());
        }

        let mut starts = Vec::with_capacity(component_ids.len());
        for id in &component_ids {
            if *id == trip.id {
                starts.push(TripStart {
                    trip_id: trip.id,
                    start_date: trip.start_date,
                    start_time: trip.start_time,
                });
                continue;
            }
            if let Some(t) = self.trips.find_by_id(*id).await? {
                starts.push(TripStart {
                    trip_id: t.id,
                    start_date: t.start_date,
                    start_time: t.start_time,
                });
            }
        }

        match conflict_graph::main_trip(&starts) {
            Some(main) if main == trip.id => Ok(()),
            Some(main) => Err(AppError::BadRequest(format!(
                "Odometer readings for this run belong to the main trip {}",
                main
            ))),
            None => Ok(()),
        }
    }
}

/// Candidato de detección construido desde un viaje persistido
fn candidate_from_parts(trip: &Trip, location: &Location) -> TripCandidate {
    TripCandidate {
        start_date: trip.start_date,
        start_time: trip.start_time,
        one_way_minutes: location.estimated_duration_minutes as i64,
        distance_km: location.distance_km,
        passenger_count: trip.passenger_count,
        start_point: location.start_point(),
        end_point: location.end_point(),
    }
}
