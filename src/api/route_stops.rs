//! Route stop endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        route_stop::{CreateRouteStop, RouteStopQuery, UpdateRouteStop},
        RouteStop,
    },
};

use super::{bookings::MessageResponse, AuthenticatedAdmin, DataResponse};

/// Active stops, optionally for one route (public)
#[utoipa::path(
    get,
    path = "/route-stops",
    tag = "route-stops",
    params(RouteStopQuery),
    responses(
        (status = 200, description = "Active stops, wrapped in {success, data}", body = [RouteStop])
    )
)]
pub async fn list_active_stops(
    State(state): State<crate::AppState>,
    Query(query): Query<RouteStopQuery>,
) -> AppResult<Json<DataResponse<Vec<RouteStop>>>> {
    let stops = state.services.route_stops.list_active(&query).await?;
    Ok(Json(DataResponse::new(stops)))
}

/// All stops, optionally for one route
#[utoipa::path(
    get,
    path = "/admin/route-stops",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(RouteStopQuery),
    responses(
        (status = 200, description = "Stops, wrapped in {success, data}", body = [RouteStop])
    )
)]
pub async fn list_stops(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
    Query(query): Query<RouteStopQuery>,
) -> AppResult<Json<DataResponse<Vec<RouteStop>>>> {
    let stops = state.services.route_stops.list(&query).await?;
    Ok(Json(DataResponse::new(stops)))
}

/// Create a stop
#[utoipa::path(
    post,
    path = "/admin/route-stops",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateRouteStop,
    responses(
        (status = 201, description = "Stop created, wrapped in {success, data}", body = RouteStop),
        (status = 400, description = "Invalid route code", body = crate::error::ErrorResponse),
        (status = 409, description = "Duplicate stop name or order", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_stop(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
    Json(data): Json<CreateRouteStop>,
) -> AppResult<(StatusCode, Json<DataResponse<RouteStop>>)> {
    data.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let stop = state.services.route_stops.create(&data).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(stop))))
}

/// Update a stop
#[utoipa::path(
    put,
    path = "/admin/route-stops/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Route stop ID")),
    request_body = UpdateRouteStop,
    responses(
        (status = 200, description = "Stop updated, wrapped in {success, data}", body = RouteStop),
        (status = 404, description = "Stop not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Stop order already used", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_stop(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
    Path(id): Path<i32>,
    Json(data): Json<UpdateRouteStop>,
) -> AppResult<Json<DataResponse<RouteStop>>> {
    data.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let stop = state.services.route_stops.update(id, &data).await?;
    Ok(Json(DataResponse::new(stop)))
}

/// Delete a stop
#[utoipa::path(
    delete,
    path = "/admin/route-stops/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Route stop ID")),
    responses(
        (status = 200, description = "Stop deleted, wrapped in {success, data}", body = MessageResponse),
        (status = 404, description = "Stop not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_stop(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
    Path(id): Path<i32>,
) -> AppResult<Json<DataResponse<MessageResponse>>> {
    state.services.route_stops.delete(id).await?;
    Ok(Json(DataResponse::new(MessageResponse {
        message: "Route stop deleted".to_string(),
    })))
}
