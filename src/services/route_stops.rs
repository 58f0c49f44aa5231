//! Route stops administration

use crate::{
    error::AppResult,
    models::{
        route_stop::{CreateRouteStop, RouteStopQuery, UpdateRouteStop},
        RouteStop,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct RouteStopsService {
    repository: Repository,
}

impl RouteStopsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// All stops (admin)
    pub async fn list(&self, query: &RouteStopQuery) -> AppResult<Vec<RouteStop>> {
        self.repository.route_stops.list(query, false).await
    }

    /// Active stops only (public booking flow)
    pub async fn list_active(&self, query: &RouteStopQuery) -> AppResult<Vec<RouteStop>> {
        self.repository.route_stops.list(query, true).await
    }

    pub async fn create(&self, data: &CreateRouteStop) -> AppResult<RouteStop> {
        let stop = self.repository.route_stops.create(data).await?;
        tracing::info!(stop_id = stop.id, route = %stop.route_code, stop = %stop.stop_name, fare = stop.fare, "route stop created");
        Ok(stop)
    }

    /// Fare changes apply to future bookings only
    pub async fn update(&self, id: i32, data: &UpdateRouteStop) -> AppResult<RouteStop> {
        let stop = self.repository.route_stops.update(id, data).await?;
        tracing::info!(stop_id = id, route = %stop.route_code, fare = stop.fare, "route stop updated");
        Ok(stop)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.route_stops.delete(id).await?;
        tracing::info!(stop_id = id, "route stop deleted");
        Ok(())
    }
}
