//! Settings endpoints: public booking gate and travel dates, admin settings

use axum::{extract::State, Json};
use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::settings::{SettingsView, UpdateSettings},
};

use super::{AuthenticatedAdmin, DataResponse};

#[derive(Serialize, ToSchema)]
pub struct BookingStatusResponse {
    pub enabled: bool,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TravelDatesResponse {
    pub go_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
}

/// Whether public booking is open; unreadable settings count as closed
#[utoipa::path(
    get,
    path = "/booking-status",
    tag = "settings",
    responses(
        (status = 200, description = "Booking gate", body = BookingStatusResponse)
    )
)]
pub async fn booking_status(State(state): State<crate::AppState>) -> Json<BookingStatusResponse> {
    let settings = state.services.settings.snapshot().await;
    Json(BookingStatusResponse {
        enabled: settings.booking_enabled,
    })
}

/// Current travel dates
#[utoipa::path(
    get,
    path = "/travel-dates",
    tag = "settings",
    responses(
        (status = 200, description = "Travel dates, wrapped in {success, data}", body = TravelDatesResponse)
    )
)]
pub async fn travel_dates(
    State(state): State<crate::AppState>,
) -> Json<DataResponse<TravelDatesResponse>> {
    let settings = state.services.settings.snapshot().await;
    Json(DataResponse::new(TravelDatesResponse {
        go_date: settings.go_date,
        return_date: settings.return_date,
    }))
}

/// Get admin settings
#[utoipa::path(
    get,
    path = "/admin/settings",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Settings, wrapped in {success, data}", body = SettingsView)
    )
)]
pub async fn get_settings(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
) -> AppResult<Json<DataResponse<SettingsView>>> {
    let settings = state.services.settings.get().await?;
    Ok(Json(DataResponse::new(settings)))
}

/// Update admin settings and optional seat overrides
#[utoipa::path(
    patch,
    path = "/admin/settings",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = UpdateSettings,
    responses(
        (status = 200, description = "Settings updated, wrapped in {success, data}", body = SettingsView),
        (status = 400, description = "Unknown route or invalid dates", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_settings(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(claims): AuthenticatedAdmin,
    Json(request): Json<UpdateSettings>,
) -> AppResult<Json<DataResponse<SettingsView>>> {
    tracing::debug!(admin = %claims.sub, "updating settings");
    let settings = state.services.settings.update(request).await?;
    Ok(Json(DataResponse::new(settings)))
}
