//! Analytics and report endpoints

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::{AppError, AppResult},
    models::RouteCode,
    services::analytics::{DashboardStats, RevenueReport, RoutesReport, StopsReport},
};

use super::{AuthenticatedAdmin, DataResponse};

const REPORT_CACHE: &str = "max-age=300";
const DASHBOARD_CACHE: &str = "public, max-age=30, stale-while-revalidate=15";

#[derive(Debug, Deserialize, IntoParams)]
pub struct StopsReportQuery {
    /// Route to break down by destination
    pub bus_route: Option<String>,
}

/// Headline numbers for the admin dashboard
#[utoipa::path(
    get,
    path = "/admin/analytics/dashboard",
    tag = "reports",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard figures, wrapped in {success, data}", body = DashboardStats)
    )
)]
pub async fn dashboard(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
) -> AppResult<impl IntoResponse> {
    let stats = state.services.analytics.dashboard().await?;
    Ok((
        [(header::CACHE_CONTROL, DASHBOARD_CACHE)],
        Json(DataResponse::new(stats)),
    ))
}

/// Paid revenue per route
#[utoipa::path(
    get,
    path = "/admin/reports/revenue",
    tag = "reports",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Revenue report, wrapped in {success, data}", body = RevenueReport)
    )
)]
pub async fn revenue_report(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
) -> AppResult<impl IntoResponse> {
    let report = state.services.analytics.revenue().await?;
    Ok((
        [(header::CACHE_CONTROL, REPORT_CACHE)],
        Json(DataResponse::new(report)),
    ))
}

/// Booking demand per route
#[utoipa::path(
    get,
    path = "/admin/reports/routes",
    tag = "reports",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Routes report, wrapped in {success, data}", body = RoutesReport)
    )
)]
pub async fn routes_report(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
) -> AppResult<impl IntoResponse> {
    let report = state.services.analytics.routes().await?;
    Ok((
        [(header::CACHE_CONTROL, REPORT_CACHE)],
        Json(DataResponse::new(report)),
    ))
}

/// Bookings per destination on one route
#[utoipa::path(
    get,
    path = "/admin/reports/stops",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(StopsReportQuery),
    responses(
        (status = 200, description = "Stops report, wrapped in {success, data}", body = StopsReport),
        (status = 400, description = "Missing bus_route", body = crate::error::ErrorResponse),
        (status = 404, description = "Invalid or inactive bus route", body = crate::error::ErrorResponse)
    )
)]
pub async fn stops_report(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
    Query(query): Query<StopsReportQuery>,
) -> AppResult<impl IntoResponse> {
    let route = query
        .bus_route
        .ok_or_else(|| AppError::Validation("bus_route parameter is required".to_string()))?;
    let route = RouteCode::parse(&route)?;
    let report = state.services.analytics.stops(&route).await?;
    Ok((
        [(header::CACHE_CONTROL, REPORT_CACHE)],
        Json(DataResponse::new(report)),
    ))
}
