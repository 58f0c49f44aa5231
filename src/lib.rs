//! Student bus-pass booking server
//!
//! REST JSON API for the public booking flow (student details, bus,
//! destination, payment, ticket) and the admin back office: buses, route
//! stops, bookings, settings, booking rounds and reports.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
