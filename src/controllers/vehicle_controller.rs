use std::sync::Arc;

use sqlx::PgPool;
use validator::Validate;

use crate::dto::vehicle_dto::{AvailabilityRequest, RankedVehicleResponse, VehicleResponse};
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::services::availability::AvailabilityEngine;
use crate::services::location_oracle::VehicleLocationOracle;
use crate::utils::errors::AppError;

pub struct VehicleController {
    engine: AvailabilityEngine,
    repository: VehicleRepository,
}

impl VehicleController {
    pub fn new(pool: PgPool, oracle: Arc<dyn VehicleLocationOracle>) -> Self {
        Self {
            engine: AvailabilityEngine::new(pool.clone(), oracle),
            repository: VehicleRepository::new(pool),
        }
    }

    /// Ranking de disponibilidad para un viaje candidato
    pub async fn availability(
        &self,
        request: AvailabilityRequest,
    ) -> Result<Vec<RankedVehicleResponse>, AppError> {
        request.validate()?;

        let ranked = self.engine.rank_vehicles(&request.into_candidate()).await?;
        Ok(ranked.into_iter().map(RankedVehicleResponse::from).collect())
    }

    pub async fn list_active(&self) -> Result<Vec<VehicleResponse>, AppError> {
        let vehicles = self.repository.find_active().await?;
        Ok(vehicles.into_iter().map(VehicleResponse::from).collect())
    }
}
