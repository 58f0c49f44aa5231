//! Repository layer for database operations

pub mod admins;
pub mod bookings;
pub mod buses;
pub mod rounds;
pub mod route_stops;
pub mod seats;
pub mod settings;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub buses: buses::BusesRepository,
    pub seats: seats::SeatsRepository,
    pub route_stops: route_stops::RouteStopsRepository,
    pub bookings: bookings::BookingsRepository,
    pub settings: settings::SettingsRepository,
    pub rounds: rounds::RoundsRepository,
    pub admins: admins::AdminsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            buses: buses::BusesRepository::new(pool.clone()),
            seats: seats::SeatsRepository::new(pool.clone()),
            route_stops: route_stops::RouteStopsRepository::new(pool.clone()),
            bookings: bookings::BookingsRepository::new(pool.clone()),
            settings: settings::SettingsRepository::new(pool.clone()),
            rounds: rounds::RoundsRepository::new(pool.clone()),
            admins: admins::AdminsRepository::new(pool.clone()),
            pool,
        }
    }
}
