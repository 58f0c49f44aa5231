//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{
    analytics, auth, bookings, buses, health, payments, rounds, route_stops, settings,
};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bus Pass API",
        version = "1.0.0",
        description = "Student bus-pass booking REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Public booking flow
        bookings::create_booking,
        bookings::search_bookings,
        settings::booking_status,
        settings::travel_dates,
        buses::list_active_buses,
        buses::availability,
        route_stops::list_active_stops,
        payments::create_order,
        payments::verify_payment,
        // Auth
        auth::login,
        auth::logout,
        auth::validate,
        // Admin
        buses::list_buses,
        buses::get_bus,
        buses::create_bus,
        buses::update_bus,
        buses::delete_bus,
        route_stops::list_stops,
        route_stops::create_stop,
        route_stops::update_stop,
        route_stops::delete_stop,
        bookings::list_bookings,
        bookings::booking_stats,
        bookings::get_booking,
        bookings::update_payment_status,
        bookings::delete_booking,
        settings::get_settings,
        settings::update_settings,
        rounds::reset_round,
        rounds::reconcile,
        // Reports
        rounds::round_history,
        analytics::dashboard,
        analytics::revenue_report,
        analytics::routes_report,
        analytics::stops_report,
    ),
    components(
        schemas(
            // Models
            crate::models::Bus,
            crate::models::bus::CreateBus,
            crate::models::bus::UpdateBus,
            crate::models::RouteStop,
            crate::models::route_stop::CreateRouteStop,
            crate::models::route_stop::UpdateRouteStop,
            crate::models::Booking,
            crate::models::booking::CreateBookingRequest,
            crate::models::booking::UpdatePaymentStatus,
            crate::models::settings::SettingsView,
            crate::models::settings::UpdateSettings,
            crate::models::BookingRound,
            crate::models::RouteCode,
            crate::models::AdmissionNumber,
            crate::models::admin::AdminUser,
            crate::models::admin::LoginRequest,
            // Bookings
            bookings::BookingCreatedResponse,
            bookings::BookingSearchResult,
            bookings::BookingsPage,
            bookings::Pagination,
            bookings::MessageResponse,
            crate::repository::bookings::BookingStats,
            crate::repository::bookings::RouteBookingCount,
            crate::repository::bookings::DailyBookingCount,
            // Settings
            settings::BookingStatusResponse,
            settings::TravelDatesResponse,
            // Auth
            auth::LoginResponse,
            // Rounds
            rounds::ResetResponse,
            rounds::ReconcileResponse,
            crate::repository::seats::SeatCorrection,
            // Reports
            crate::services::analytics::DashboardStats,
            crate::services::analytics::RevenueReport,
            crate::services::analytics::RouteRevenue,
            crate::services::analytics::RoutesReport,
            crate::services::analytics::RouteDemand,
            crate::services::analytics::DemandLevel,
            crate::services::analytics::StopsReport,
            crate::services::analytics::StopDemand,
            // Payment
            payments::CreateOrderRequest,
            payments::CreateOrderResponse,
            payments::VerifyPaymentRequest,
            payments::VerifyPaymentResponse,
            crate::services::payments::PaymentOrder,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "bookings", description = "Public booking flow"),
        (name = "buses", description = "Public bus information"),
        (name = "route-stops", description = "Public stops and fares"),
        (name = "settings", description = "Booking gate and travel dates"),
        (name = "payment", description = "Payment gateway"),
        (name = "auth", description = "Admin authentication"),
        (name = "admin", description = "Admin management"),
        (name = "reports", description = "Analytics and reports")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
