//! Bus-pass server binary

use axum::{
    routing::{get, post, put},
    Router,
};
use sqlx::{postgres::PgPoolOptions, Executor};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use buspass_server::{
    api,
    config::AppConfig,
    repository::Repository,
    services::{rate_limit::RateLimiter, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("buspass_server={},tower_http=debug", config.logging.level).into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting bus-pass server v{}", env!("CARGO_PKG_VERSION"));

    // Every pooled connection cancels statements server-side after the timeout
    let statement_timeout = format!("SET statement_timeout = {}", config.database.statement_timeout_ms);
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
        .after_connect(move |conn, _meta| {
            let statement_timeout = statement_timeout.clone();
            Box::pin(async move {
                conn.execute(statement_timeout.as_str()).await?;
                Ok(())
            })
        })
        .connect(&config.database.url)
        .await?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!("Database migrations completed");

    let rate_limiter = RateLimiter::new(&config.redis.url, &config.booking).await?;

    tracing::info!("Connected to Redis");

    let repository = Repository::new(pool);
    let services = Services::new(repository, &config, rate_limiter);
    services.auth.bootstrap_admin().await?;

    spawn_reconciliation(services.clone(), config.booking.reconcile_interval_secs);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let app = create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}

/// Periodically correct seat counters that drifted from the ledger
fn spawn_reconciliation(services: Services, interval_secs: u64) {
    if interval_secs == 0 {
        tracing::info!("Seat reconciliation disabled");
        return;
    }

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match services.rounds.reconcile().await {
                Ok(corrections) if corrections.is_empty() => {
                    tracing::debug!("seat counters consistent");
                }
                Ok(corrections) => {
                    tracing::info!(corrected = corrections.len(), "seat reconciliation pass finished");
                }
                Err(err) => {
                    tracing::error!(error = %err, "seat reconciliation pass failed");
                }
            }
        }
    });
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Public booking flow
        .route("/bookings", post(api::bookings::create_booking))
        .route("/bookings/search", get(api::bookings::search_bookings))
        .route("/booking-status", get(api::settings::booking_status))
        .route("/travel-dates", get(api::settings::travel_dates))
        .route("/buses", get(api::buses::list_active_buses))
        .route("/buses/availability", get(api::buses::availability))
        .route("/route-stops", get(api::route_stops::list_active_stops))
        .route("/payment/order", post(api::payments::create_order))
        .route("/payment/verify", post(api::payments::verify_payment))
        // Admin authentication
        .route("/admin/login", post(api::auth::login))
        .route("/admin/logout", post(api::auth::logout))
        .route("/admin/validate", get(api::auth::validate))
        // Admin buses
        .route(
            "/admin/buses",
            get(api::buses::list_buses).post(api::buses::create_bus),
        )
        .route(
            "/admin/buses/:id",
            get(api::buses::get_bus)
                .put(api::buses::update_bus)
                .delete(api::buses::delete_bus),
        )
        // Admin route stops
        .route(
            "/admin/route-stops",
            get(api::route_stops::list_stops).post(api::route_stops::create_stop),
        )
        .route(
            "/admin/route-stops/:id",
            put(api::route_stops::update_stop).delete(api::route_stops::delete_stop),
        )
        // Admin bookings
        .route("/admin/bookings", get(api::bookings::list_bookings))
        .route("/admin/bookings/stats", get(api::bookings::booking_stats))
        .route(
            "/admin/bookings/:id",
            get(api::bookings::get_booking)
                .patch(api::bookings::update_payment_status)
                .delete(api::bookings::delete_booking),
        )
        // Admin settings
        .route(
            "/admin/settings",
            get(api::settings::get_settings).patch(api::settings::update_settings),
        )
        // Booking rounds
        .route("/admin/reset", post(api::rounds::reset_round))
        .route("/admin/reconcile", post(api::rounds::reconcile))
        // Reports
        .route("/admin/analytics/dashboard", get(api::analytics::dashboard))
        .route("/admin/reports/revenue", get(api::analytics::revenue_report))
        .route("/admin/reports/routes", get(api::analytics::routes_report))
        .route("/admin/reports/stops", get(api::analytics::stops_report))
        .route("/admin/reports/rounds", get(api::rounds::round_history))
        .with_state(state);

    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
}
