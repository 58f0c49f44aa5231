//! Business logic services

pub mod analytics;
pub mod auth;
pub mod bookings;
pub mod buses;
pub mod fares;
pub mod payments;
pub mod rate_limit;
pub mod rounds;
pub mod route_stops;
pub mod seats;
pub mod settings;

use std::sync::Arc;

use crate::{config::AppConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub buses: buses::BusesService,
    pub route_stops: route_stops::RouteStopsService,
    pub bookings: bookings::BookingsService,
    pub rounds: rounds::RoundsService,
    pub analytics: analytics::AnalyticsService,
    pub settings: settings::SettingsService,
    pub payments: Arc<dyn payments::PaymentGateway>,
    pub rate_limiter: rate_limit::RateLimiter,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig, rate_limiter: rate_limit::RateLimiter) -> Self {
        let payments: Arc<dyn payments::PaymentGateway> =
            Arc::new(payments::RazorpayGateway::new(config.payment.clone()));
        let fares = fares::FareCatalog::new(Arc::new(repository.route_stops.clone()));

        Self {
            auth: auth::AuthService::new(repository.clone(), config.auth.clone()),
            buses: buses::BusesService::new(repository.clone()),
            route_stops: route_stops::RouteStopsService::new(repository.clone()),
            bookings: bookings::BookingsService::new(
                repository.clone(),
                fares,
                Arc::new(repository.bookings.clone()),
                payments.clone(),
            ),
            rounds: rounds::RoundsService::new(repository.clone(), config.booking.reconcile_grace_secs),
            analytics: analytics::AnalyticsService::new(repository.clone()),
            settings: settings::SettingsService::new(repository.clone()),
            payments,
            rate_limiter,
            repository,
        }
    }

    /// Round-trip to the database, used by the readiness probe
    pub async fn ping_database(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.repository.pool).await?;
        Ok(())
    }
}
