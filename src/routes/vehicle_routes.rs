use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::controllers::vehicle_controller::VehicleController;
use crate::dto::vehicle_dto::{AvailabilityRequest, RankedVehicleResponse, VehicleResponse};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles))
        .route("/availability", post(get_available_vehicles))
}

async fn list_vehicles(
    State(state): State<AppState>,
) -> Result<Json<Vec<VehicleResponse>>, AppError> {
    let controller = VehicleController::new(state.pool.clone(), state.oracle.clone());
    let response = controller.list_active().await?;
    Ok(Json(response))
}

async fn get_available_vehicles(
    State(state): State<AppState>,
    Json(request): Json<AvailabilityRequest>,
) -> Result<Json<Vec<RankedVehicleResponse>>, AppError> {
    let controller = VehicleController::new(state.pool.clone(), state.oracle.clone());
    let response = controller.availability(request).await?;
    Ok(Json(response))
}
