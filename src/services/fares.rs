//! Fare catalog lookups

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Fare, RouteCode},
    repository::route_stops::FareSource,
};

#[derive(Clone)]
pub struct FareCatalog {
    source: Arc<dyn FareSource>,
}

impl FareCatalog {
    pub fn new(source: Arc<dyn FareSource>) -> Self {
        Self { source }
    }

    /// Fare and bus name for a stop.
    ///
    /// Inactive or missing routes and stops are `NotFound`; no default fare is
    /// ever substituted.
    pub async fn get_fare(&self, route: &RouteCode, stop_name: &str) -> AppResult<Fare> {
        self.source
            .active_fare(route, stop_name.trim())
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No fare for destination {} on route {}",
                    stop_name.trim(),
                    route
                ))
            })
    }
}
