use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::approval_controller::ApprovalController;
use crate::controllers::trip_controller::TripController;
use crate::dto::api_response::ApiResponse;
use crate::dto::approval_dto::{
    ApprovalDecisionRequest, ApprovalResponse, ApprovalResultResponse,
};
use crate::dto::trip_dto::{
    AssignVehicleRequest, CancelTripRequest, CancelTripResponse, CreateTripRequest,
    OdometerReadingRequest, OdometerReadingResponse, TripResponse, TripResultResponse,
};
use crate::models::user::ActingUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_trip_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_trip))
        .route("/", get(list_trips))
        .route("/:id", get(get_trip))
        .route("/:id/cancel", post(cancel_trip))
        .route("/:id/approval", post(record_approval_decision))
        .route("/:id/approval", get(get_approval))
        .route("/:id/odometer", post(record_odometer_reading))
        .route("/:id/assign-vehicle", post(assign_vehicle))
        .route("/:id/link/:other_id", post(link_trips))
}

async fn create_trip(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Json(request): Json<CreateTripRequest>,
) -> Result<Json<ApiResponse<TripResultResponse>>, AppError> {
    let controller = TripController::new(state.pool.clone());
    let response = controller.create(request, &actor).await?;
    Ok(Json(response))
}

async fn get_trip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TripResponse>, AppError> {
    let controller = TripController::new(state.pool.clone());
    let response = controller.get_by_id(id).await?;
    Ok(Json(response))
}

async fn list_trips(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
) -> Result<Json<Vec<TripResponse>>, AppError> {
    let controller = TripController::new(state.pool.clone());
    let response = controller.list_by_requester(&actor).await?;
    Ok(Json(response))
}

async fn cancel_trip(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<CancelTripRequest>,
) -> Result<Json<ApiResponse<CancelTripResponse>>, AppError> {
    let controller = TripController::new(state.pool.clone());
    let response = controller.cancel(id, request, &actor).await?;
    Ok(Json(response))
}

async fn record_approval_decision(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<ApprovalDecisionRequest>,
) -> Result<Json<ApiResponse<ApprovalResultResponse>>, AppError> {
    let controller = ApprovalController::new(state.pool.clone());
    let response = controller.record_decision(id, request, &actor).await?;
    Ok(Json(response))
}

async fn get_approval(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApprovalResponse>, AppError> {
    let controller = ApprovalController::new(state.pool.clone());
    let response = controller.get_by_trip(id).await?;
    Ok(Json(response))
}

async fn record_odometer_reading(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<OdometerReadingRequest>,
) -> Result<Json<ApiResponse<OdometerReadingResponse>>, AppError> {
    let controller = TripController::new(state.pool.clone());
    let response = controller.record_reading(id, request, &actor).await?;
    Ok(Json(response))
}

async fn assign_vehicle(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignVehicleRequest>,
) -> Result<Json<ApiResponse<TripResponse>>, AppError> {
    let controller = TripController::new(state.pool.clone());
    let response = controller.assign_vehicle(id, request, &actor).await?;
    Ok(Json(response))
}

async fn link_trips(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path((id, other_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<Vec<Uuid>>>, AppError> {
    let controller = TripController::new(state.pool.clone());
    let response = controller.link(id, other_id, &actor).await?;
    Ok(Json(response))
}
