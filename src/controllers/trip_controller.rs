use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::api_response::ApiResponse;
use crate::dto::trip_dto::{
    AssignVehicleRequest, CancelTripRequest, CancelTripResponse, CreateTripRequest,
    OdometerReadingRequest, OdometerReadingResponse, TripResponse, TripResultResponse,
};
use crate::models::user::ActingUser;
use crate::repositories::trip_repository::TripRepository;
use crate::services::trip_service::TripService;
use crate::utils::errors::AppError;

pub struct TripController {
    service: TripService,
    repository: TripRepository,
}

impl TripController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            service: TripService::new(pool.clone()),
            repository: TripRepository::new(pool),
        }
    }

    pub async fn create(
        &self,
        request: CreateTripRequest,
        actor: &ActingUser,
    ) -> Result<ApiResponse<TripResultResponse>, AppError> {
        request.validate()?;

        let result = self.service.create_trip(request.into_input(), actor).await?;
        Ok(ApiResponse::success_with_message(
            result.into(),
            "Viaje creado exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<TripResponse, AppError> {
        let trip = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;

        Ok(trip.into())
    }

    pub async fn list_by_requester(
        &self,
        actor: &ActingUser,
    ) -> Result<Vec<TripResponse>, AppError> {
        let trips = self.repository.find_by_requester(actor.id).await?;
        Ok(trips.into_iter().map(TripResponse::from).collect())
    }

    pub async fn cancel(
        &self,
        id: Uuid,
        request: CancelTripRequest,
        actor: &ActingUser,
    ) -> Result<ApiResponse<CancelTripResponse>, AppError> {
        let result = self.service.cancel_trip(id, actor, request.reason).await?;
        Ok(ApiResponse::success_with_message(
            result.into(),
            "Viaje cancelado exitosamente".to_string(),
        ))
    }

    pub async fn assign_vehicle(
        &self,
        id: Uuid,
        request: AssignVehicleRequest,
        actor: &ActingUser,
    ) -> Result<ApiResponse<TripResponse>, AppError> {
        let trip = self
            .service
            .assign_vehicle(id, request.vehicle_id, actor)
            .await?;
        Ok(ApiResponse::success_with_message(
            trip.into(),
            "Vehículo asignado exitosamente".to_string(),
        ))
    }

    pub async fn record_reading(
        &self,
        id: Uuid,
        request: OdometerReadingRequest,
        actor: &ActingUser,
    ) -> Result<ApiResponse<OdometerReadingResponse>, AppError> {
        let result = self
            .service
            .record_odometer_reading(
                id,
                actor,
                request.reading,
                request.kind.into(),
                request.end_passenger_count,
            )
            .await?;
        Ok(ApiResponse::success(result.into()))
    }

    pub async fn link(
        &self,
        id: Uuid,
        other_id: Uuid,
        actor: &ActingUser,
    ) -> Result<ApiResponse<Vec<Uuid>>, AppError> {
        let partners = self.service.link_trips(id, other_id, actor).await?;
        Ok(ApiResponse::success(partners))
    }
}
