//! Booking endpoints: public booking flow and admin ledger management

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{
        booking::{BookingQuery, BookingSearchQuery, CreateBookingRequest, UpdatePaymentStatus},
        Booking,
    },
    repository::bookings::BookingStats,
};

use super::{AuthenticatedAdmin, ClientIp, DataResponse};

/// `{success, booking}` envelope returned by booking creation
#[derive(Serialize, ToSchema)]
pub struct BookingCreatedResponse {
    pub success: bool,
    pub booking: Booking,
}

#[derive(Serialize, ToSchema)]
pub struct BookingSearchResult {
    pub bookings: Vec<Booking>,
    pub count: usize,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: if limit > 0 { (total + limit - 1) / limit } else { 0 },
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct BookingsPage {
    pub bookings: Vec<Booking>,
    pub pagination: Pagination,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Create a booking (public)
#[utoipa::path(
    post,
    path = "/bookings",
    tag = "bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = BookingCreatedResponse),
        (status = 400, description = "Invalid input, bus fully booked or unavailable", body = crate::error::ErrorResponse),
        (status = 403, description = "Booking is disabled", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_booking(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<BookingCreatedResponse>)> {
    let settings = state.services.settings.snapshot().await;
    let booking = state
        .services
        .bookings
        .create_booking(&settings, request)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(BookingCreatedResponse {
            success: true,
            booking,
        }),
    ))
}

/// Search bookings by admission number (public, rate limited per client IP)
#[utoipa::path(
    get,
    path = "/bookings/search",
    tag = "bookings",
    params(BookingSearchQuery),
    responses(
        (status = 200, description = "Matching bookings, wrapped in {success, data}", body = BookingSearchResult),
        (status = 400, description = "Malformed admission number", body = crate::error::ErrorResponse),
        (status = 429, description = "Too many searches", body = crate::error::ErrorResponse)
    )
)]
pub async fn search_bookings(
    State(state): State<crate::AppState>,
    ClientIp(ip): ClientIp,
    Query(query): Query<BookingSearchQuery>,
) -> AppResult<Json<DataResponse<BookingSearchResult>>> {
    state
        .services
        .rate_limiter
        .check("booking_search", &ip.to_string())
        .await?;

    let admission_number = query
        .admission_number
        .ok_or_else(|| AppError::Validation("Admission number is required".to_string()))?;
    let bookings = state.services.bookings.search(&admission_number).await?;
    Ok(Json(DataResponse::new(BookingSearchResult {
        count: bookings.len(),
        bookings,
    })))
}

/// List bookings with filters and pagination
#[utoipa::path(
    get,
    path = "/admin/bookings",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(BookingQuery),
    responses(
        (status = 200, description = "Bookings page, wrapped in {success, data}", body = BookingsPage)
    )
)]
pub async fn list_bookings(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
    Query(query): Query<BookingQuery>,
) -> AppResult<Json<DataResponse<BookingsPage>>> {
    let (bookings, total) = state.services.bookings.list(&query).await?;
    Ok(Json(DataResponse::new(BookingsPage {
        bookings,
        pagination: Pagination::new(query.page(), query.limit(), total),
    })))
}

/// Booking statistics
#[utoipa::path(
    get,
    path = "/admin/bookings/stats",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Booking statistics, wrapped in {success, data}", body = BookingStats)
    )
)]
pub async fn booking_stats(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
) -> AppResult<Json<DataResponse<BookingStats>>> {
    let stats = state.services.bookings.stats().await?;
    Ok(Json(DataResponse::new(stats)))
}

/// Get a booking by ID
#[utoipa::path(
    get,
    path = "/admin/bookings/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking, wrapped in {success, data}", body = Booking),
        (status = 404, description = "Booking not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_booking(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
    Path(id): Path<i32>,
) -> AppResult<Json<DataResponse<Booking>>> {
    let booking = state.services.bookings.get_by_id(id).await?;
    Ok(Json(DataResponse::new(booking)))
}

/// Set the payment status of a booking
#[utoipa::path(
    patch,
    path = "/admin/bookings/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Booking ID")),
    request_body = UpdatePaymentStatus,
    responses(
        (status = 200, description = "Booking updated, wrapped in {success, data}", body = Booking),
        (status = 404, description = "Booking not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_payment_status(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
    Path(id): Path<i32>,
    Json(data): Json<UpdatePaymentStatus>,
) -> AppResult<Json<DataResponse<Booking>>> {
    let booking = state
        .services
        .bookings
        .update_payment_status(id, data.payment_status)
        .await?;
    Ok(Json(DataResponse::new(booking)))
}

/// Delete a booking and restore its seat
#[utoipa::path(
    delete,
    path = "/admin/bookings/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking deleted, wrapped in {success, data}", body = MessageResponse),
        (status = 404, description = "Booking not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_booking(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
    Path(id): Path<i32>,
) -> AppResult<Json<DataResponse<MessageResponse>>> {
    state.services.bookings.delete(id).await?;
    Ok(Json(DataResponse::new(MessageResponse {
        message: "Booking deleted".to_string(),
    })))
}
