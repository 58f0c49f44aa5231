//! Bus inventory service

use crate::{
    error::{AppError, AppResult},
    models::{
        bus::{BusAvailability, CreateBus, UpdateBus},
        Bus,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct BusesService {
    repository: Repository,
}

impl BusesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_all(&self) -> AppResult<Vec<Bus>> {
        self.repository.buses.list_all().await
    }

    pub async fn list_active(&self) -> AppResult<Vec<Bus>> {
        self.repository.buses.list_active().await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Bus> {
        self.repository.buses.get_by_id(id).await
    }

    pub async fn create(&self, data: &CreateBus) -> AppResult<Bus> {
        if data.name.trim().is_empty() {
            return Err(AppError::Validation("Bus name is required".to_string()));
        }
        let bus = self.repository.buses.create(data).await?;
        tracing::info!(bus_id = bus.id, route = %bus.route_code, total_seats = bus.total_seats, "bus created");
        Ok(bus)
    }

    pub async fn update(&self, id: i32, data: &UpdateBus) -> AppResult<Bus> {
        if data.route_code.is_some() {
            let current = self.repository.buses.get_by_id(id).await?;
            data.check_route_code(&current.route_code)?;
        }
        let bus = self.repository.buses.update(id, data).await?;
        tracing::info!(
            bus_id = id,
            route = %bus.route_code,
            total_seats = bus.total_seats,
            available_seats = bus.available_seats,
            "bus updated"
        );
        Ok(bus)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let route = self.repository.buses.delete(id).await?;
        tracing::info!(bus_id = id, route = %route, "bus deleted with its stops");
        Ok(())
    }

    pub async fn availability(&self) -> AppResult<Vec<BusAvailability>> {
        self.repository.buses.availability().await
    }
}
