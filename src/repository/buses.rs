//! Buses repository

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        bus::{clamp_seats, BusAvailability, CreateBus, UpdateBus},
        Bus, RouteCode,
    },
};

/// Seat count used when an admin creates a bus without one
pub const DEFAULT_TOTAL_SEATS: i32 = 10;

#[derive(Clone)]
pub struct BusesRepository {
    pool: Pool<Postgres>,
}

impl BusesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// All buses, oldest first
    pub async fn list_all(&self) -> AppResult<Vec<Bus>> {
        let rows = sqlx::query_as::<_, Bus>("SELECT * FROM buses ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn list_active(&self) -> AppResult<Vec<Bus>> {
        let rows = sqlx::query_as::<_, Bus>(
            "SELECT * FROM buses WHERE is_active = TRUE ORDER BY route_code",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Bus> {
        sqlx::query_as::<_, Bus>("SELECT * FROM buses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Bus {} not found", id)))
    }

    /// Active bus serving `route`, if any
    pub async fn find_active_by_route(&self, route: &RouteCode) -> AppResult<Option<Bus>> {
        let bus = sqlx::query_as::<_, Bus>(
            "SELECT * FROM buses WHERE route_code = $1 AND is_active = TRUE",
        )
        .bind(route)
        .fetch_optional(&self.pool)
        .await?;
        Ok(bus)
    }

    pub async fn route_exists(&self, route: &RouteCode) -> AppResult<bool> {
        let exists = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM buses WHERE route_code = $1)")
            .bind(route)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Create a bus; the counter starts full unless an initial value is given
    pub async fn create(&self, data: &CreateBus) -> AppResult<Bus> {
        let total_seats = data.total_seats.unwrap_or(DEFAULT_TOTAL_SEATS);
        let available_seats = clamp_seats(data.available_seats.unwrap_or(total_seats), total_seats);

        sqlx::query_as::<_, Bus>(
            r#"
            INSERT INTO buses (name, route_code, total_seats, available_seats, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(data.name.trim())
        .bind(&data.route_code)
        .bind(total_seats)
        .bind(available_seats)
        .bind(data.is_active.unwrap_or(true))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::on_unique_violation(e, &format!("Route code {} already exists", data.route_code))
        })
    }

    /// Update a bus.
    ///
    /// A supplied `available_seats` is clamped to `0..=total_seats`, and a
    /// smaller `total_seats` pulls the live counter down in the same statement.
    pub async fn update(&self, id: i32, data: &UpdateBus) -> AppResult<Bus> {
        sqlx::query_as::<_, Bus>(
            r#"
            UPDATE buses
            SET name = COALESCE($2, name),
                total_seats = COALESCE($3, total_seats),
                available_seats = GREATEST(0, LEAST(
                    COALESCE($4, available_seats),
                    COALESCE($3, total_seats)
                )),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.name.as_deref().map(str::trim))
        .bind(data.total_seats)
        .bind(data.available_seats)
        .bind(data.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Bus {} not found", id)))
    }

    /// Delete a bus; its stops go with it through the foreign key
    pub async fn delete(&self, id: i32) -> AppResult<RouteCode> {
        sqlx::query_scalar("DELETE FROM buses WHERE id = $1 RETURNING route_code")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Bus {} not found", id)))
    }

    /// Seat counters of active buses
    pub async fn availability(&self) -> AppResult<Vec<BusAvailability>> {
        let rows = sqlx::query_as::<_, BusAvailability>(
            r#"
            SELECT route_code, name, total_seats, available_seats
            FROM buses
            WHERE is_active = TRUE
            ORDER BY route_code
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Admin override of one counter, clamped to capacity.
    ///
    /// Returns `None` when the route does not exist.
    pub async fn set_available_on(
        conn: &mut PgConnection,
        route: &RouteCode,
        seats: i32,
    ) -> AppResult<Option<i32>> {
        let available = sqlx::query_scalar(
            r#"
            UPDATE buses
            SET available_seats = GREATEST(0, LEAST($2, total_seats)), updated_at = NOW()
            WHERE route_code = $1
            RETURNING available_seats
            "#,
        )
        .bind(route)
        .bind(seats)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(available)
    }
}
