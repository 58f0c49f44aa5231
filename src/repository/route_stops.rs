//! Route stops (fare catalog) repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult},
    models::{
        route_stop::{CreateRouteStop, RouteStopQuery, UpdateRouteStop},
        Fare, RouteCode, RouteStop,
    },
};

/// Read side of the fare catalog consumed by booking creation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FareSource: Send + Sync {
    /// Fare and bus name for an active stop on an active route
    async fn active_fare(&self, route: &RouteCode, stop_name: &str) -> AppResult<Option<Fare>>;
}

#[derive(Clone)]
pub struct RouteStopsRepository {
    pool: Pool<Postgres>,
}

impl RouteStopsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Stops ordered by route then position, optionally for one route
    pub async fn list(&self, query: &RouteStopQuery, active_only: bool) -> AppResult<Vec<RouteStop>> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM route_stops WHERE TRUE");
        if let Some(ref route) = query.route_code {
            builder.push(" AND route_code = ").push_bind(route);
        }
        if active_only {
            builder.push(" AND is_active = TRUE");
        }
        builder.push(" ORDER BY route_code, stop_order");

        let rows = builder
            .build_query_as::<RouteStop>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<RouteStop> {
        sqlx::query_as::<_, RouteStop>("SELECT * FROM route_stops WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Route stop {} not found", id)))
    }

    pub async fn create(&self, data: &CreateRouteStop) -> AppResult<RouteStop> {
        let route_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM buses WHERE route_code = $1)")
                .bind(&data.route_code)
                .fetch_one(&self.pool)
                .await?;
        if !route_exists {
            return Err(AppError::Validation("Invalid route code".to_string()));
        }

        sqlx::query_as::<_, RouteStop>(
            r#"
            INSERT INTO route_stops (route_code, stop_name, fare, stop_order, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&data.route_code)
        .bind(data.stop_name.trim())
        .bind(data.fare)
        .bind(data.stop_order)
        .bind(data.is_active.unwrap_or(true))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::on_unique_violation(
                e,
                &format!(
                    "Route {} already has a stop named {} or at order {}",
                    data.route_code,
                    data.stop_name.trim(),
                    data.stop_order
                ),
            )
        })
    }

    /// Update a stop; moving it onto another stop's order is a conflict
    pub async fn update(&self, id: i32, data: &UpdateRouteStop) -> AppResult<RouteStop> {
        let current = self.get_by_id(id).await?;

        let order_taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM route_stops
                WHERE route_code = $1 AND stop_order = $2 AND id <> $3
            )
            "#,
        )
        .bind(&current.route_code)
        .bind(data.stop_order)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        if order_taken {
            return Err(AppError::Conflict(format!(
                "Stop order {} is already used on route {}",
                data.stop_order, current.route_code
            )));
        }

        sqlx::query_as::<_, RouteStop>(
            r#"
            UPDATE route_stops
            SET stop_name = $2, fare = $3, stop_order = $4,
                is_active = COALESCE($5, is_active), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.stop_name.trim())
        .bind(data.fare)
        .bind(data.stop_order)
        .bind(data.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::on_unique_violation(
                e,
                &format!("Route {} already has a stop named {}", current.route_code, data.stop_name.trim()),
            )
        })?
        .ok_or_else(|| AppError::NotFound(format!("Route stop {} not found", id)))
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM route_stops WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Route stop {} not found", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl FareSource for RouteStopsRepository {
    async fn active_fare(&self, route: &RouteCode, stop_name: &str) -> AppResult<Option<Fare>> {
        let fare = sqlx::query_as::<_, Fare>(
            r#"
            SELECT rs.fare, b.name AS bus_name
            FROM route_stops rs
            JOIN buses b ON b.route_code = rs.route_code
            WHERE rs.route_code = $1
              AND rs.stop_name = $2
              AND rs.is_active = TRUE
              AND b.is_active = TRUE
            "#,
        )
        .bind(route)
        .bind(stop_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(fare)
    }
}
