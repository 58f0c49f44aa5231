//! Bus endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        bus::{CreateBus, UpdateBus},
        settings::SeatMap,
        Bus,
    },
};

use super::{bookings::MessageResponse, AuthenticatedAdmin, DataResponse};

/// Active buses (public)
#[utoipa::path(
    get,
    path = "/buses",
    tag = "buses",
    responses(
        (status = 200, description = "Active buses, wrapped in {success, data}", body = [Bus])
    )
)]
pub async fn list_active_buses(
    State(state): State<crate::AppState>,
) -> AppResult<Json<DataResponse<Vec<Bus>>>> {
    let buses = state.services.buses.list_active().await?;
    Ok(Json(DataResponse::new(buses)))
}

/// Seats left per active route (public)
#[utoipa::path(
    get,
    path = "/buses/availability",
    tag = "buses",
    responses(
        (status = 200, description = "Route code to available seats, wrapped in {success, data}", body = Object)
    )
)]
pub async fn availability(
    State(state): State<crate::AppState>,
) -> AppResult<Json<DataResponse<SeatMap>>> {
    let seats = state
        .services
        .buses
        .availability()
        .await?
        .into_iter()
        .map(|bus| (bus.route_code, bus.available_seats))
        .collect();
    Ok(Json(DataResponse::new(seats)))
}

/// All buses
#[utoipa::path(
    get,
    path = "/admin/buses",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Buses, wrapped in {success, data}", body = [Bus])
    )
)]
pub async fn list_buses(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
) -> AppResult<Json<DataResponse<Vec<Bus>>>> {
    let buses = state.services.buses.list_all().await?;
    Ok(Json(DataResponse::new(buses)))
}

/// Get bus by ID
#[utoipa::path(
    get,
    path = "/admin/buses/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Bus ID")),
    responses(
        (status = 200, description = "Bus, wrapped in {success, data}", body = Bus),
        (status = 404, description = "Bus not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_bus(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
    Path(id): Path<i32>,
) -> AppResult<Json<DataResponse<Bus>>> {
    let bus = state.services.buses.get_by_id(id).await?;
    Ok(Json(DataResponse::new(bus)))
}

/// Create a bus
#[utoipa::path(
    post,
    path = "/admin/buses",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateBus,
    responses(
        (status = 201, description = "Bus created, wrapped in {success, data}", body = Bus),
        (status = 409, description = "Route code already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_bus(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
    Json(data): Json<CreateBus>,
) -> AppResult<(StatusCode, Json<DataResponse<Bus>>)> {
    data.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let bus = state.services.buses.create(&data).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(bus))))
}

/// Update a bus
#[utoipa::path(
    put,
    path = "/admin/buses/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Bus ID")),
    request_body = UpdateBus,
    responses(
        (status = 200, description = "Bus updated, wrapped in {success, data}", body = Bus),
        (status = 404, description = "Bus not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_bus(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
    Path(id): Path<i32>,
    Json(data): Json<UpdateBus>,
) -> AppResult<Json<DataResponse<Bus>>> {
    data.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let bus = state.services.buses.update(id, &data).await?;
    Ok(Json(DataResponse::new(bus)))
}

/// Delete a bus and its stops
#[utoipa::path(
    delete,
    path = "/admin/buses/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Bus ID")),
    responses(
        (status = 200, description = "Bus deleted, wrapped in {success, data}", body = MessageResponse),
        (status = 404, description = "Bus not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_bus(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
    Path(id): Path<i32>,
) -> AppResult<Json<DataResponse<MessageResponse>>> {
    state.services.buses.delete(id).await?;
    Ok(Json(DataResponse::new(MessageResponse {
        message: "Bus deleted".to_string(),
    })))
}
