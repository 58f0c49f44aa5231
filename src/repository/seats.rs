//! Seat counter persistence.
//!
//! Every booking-driven change to `buses.available_seats` lives here and is
//! expressed as a single conditional `UPDATE`. The `_on` functions run on the
//! caller's connection so a decrement commits or rolls back together with the
//! booking row it pays for.

use sqlx::{PgConnection, Pool, Postgres, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::RouteCode,
};

/// Authorization for exactly one booking insert on one route.
///
/// Issued by [`SeatsRepository::reserve_on`] inside a booking transaction and
/// only valid in that transaction. The transaction refuses to commit while a
/// permit is still unspent, so a decrement never outlives its booking.
#[must_use = "a permit holds a seat until it is spent on a booking insert"]
#[derive(Debug, PartialEq, Eq)]
pub struct SeatPermit {
    unit: Uuid,
    route: RouteCode,
    remaining: i32,
}

impl SeatPermit {
    pub(crate) fn issue(unit: Uuid, route: RouteCode, remaining: i32) -> Self {
        Self {
            unit,
            route,
            remaining,
        }
    }

    pub fn route(&self) -> &RouteCode {
        &self.route
    }

    /// Seats left on the route right after this reservation
    pub fn remaining(&self) -> i32 {
        self.remaining
    }

    /// Use the permit for a booking on `route` inside transaction `unit`
    pub(crate) fn spend(self, unit: Uuid, route: &RouteCode) -> AppResult<()> {
        if self.unit != unit {
            return Err(AppError::Internal(format!(
                "seat permit for {} was issued by another transaction",
                self.route
            )));
        }
        if &self.route != route {
            return Err(AppError::Internal(format!(
                "seat permit for {} cannot book route {}",
                self.route, route
            )));
        }
        Ok(())
    }
}

/// Result of an attempted conditional decrement
#[derive(Debug, PartialEq, Eq)]
pub enum ReserveOutcome {
    Reserved(SeatPermit),
    SoldOut,
    RouteInactive,
    RouteNotFound,
}

/// Result of an increment clamped at capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released { available: i32 },
    /// Counter was already at `total_seats`
    AtCapacity,
    RouteNotFound,
}

/// One counter corrected by the reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, utoipa::ToSchema)]
pub struct SeatCorrection {
    pub route_code: RouteCode,
    pub previous: i32,
    pub corrected: i32,
}

#[derive(Clone)]
pub struct SeatsRepository {
    pool: Pool<Postgres>,
}

impl SeatsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Take one seat on `route` inside the caller's transaction.
    ///
    /// The conditional `UPDATE` holds the bus row lock until the transaction
    /// ends, so concurrent reservations on one route are serialised.
    pub async fn reserve_on(
        conn: &mut PgConnection,
        unit: Uuid,
        route: &RouteCode,
    ) -> AppResult<ReserveOutcome> {
        let remaining: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE buses
            SET available_seats = available_seats - 1, updated_at = NOW()
            WHERE route_code = $1 AND is_active = TRUE AND available_seats > 0
            RETURNING available_seats
            "#,
        )
        .bind(route)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(remaining) = remaining {
            return Ok(ReserveOutcome::Reserved(SeatPermit::issue(
                unit,
                route.clone(),
                remaining,
            )));
        }

        let is_active: Option<bool> =
            sqlx::query_scalar("SELECT is_active FROM buses WHERE route_code = $1")
                .bind(route)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(match is_active {
            None => ReserveOutcome::RouteNotFound,
            Some(false) => ReserveOutcome::RouteInactive,
            Some(true) => ReserveOutcome::SoldOut,
        })
    }

    /// Increment on an existing connection (used inside transactions)
    pub async fn release_on(conn: &mut PgConnection, route: &RouteCode) -> AppResult<ReleaseOutcome> {
        let available: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE buses
            SET available_seats = available_seats + 1, updated_at = NOW()
            WHERE route_code = $1 AND available_seats < total_seats
            RETURNING available_seats
            "#,
        )
        .bind(route)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(available) = available {
            return Ok(ReleaseOutcome::Released { available });
        }

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM buses WHERE route_code = $1)")
                .bind(route)
                .fetch_one(&mut *conn)
                .await?;

        Ok(if exists {
            ReleaseOutcome::AtCapacity
        } else {
            ReleaseOutcome::RouteNotFound
        })
    }

    /// Restore every active bus to full capacity
    pub async fn reset_all_on(conn: &mut PgConnection) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE buses
            SET available_seats = total_seats, updated_at = NOW()
            WHERE is_active = TRUE
            "#,
        )
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Recompute drifted counters from the live ledger.
    ///
    /// Buses touched within `grace_secs` are left alone.
    pub async fn reconcile(&self, grace_secs: i64) -> AppResult<Vec<SeatCorrection>> {
        let rows = sqlx::query(
            r#"
            WITH live AS (
                SELECT bus_route, COUNT(*)::int AS booked
                FROM bookings
                GROUP BY bus_route
            ),
            expected AS (
                SELECT b.id, b.available_seats AS previous,
                       GREATEST(LEAST(b.total_seats - COALESCE(l.booked, 0), b.total_seats), 0) AS corrected
                FROM buses b
                LEFT JOIN live l ON l.bus_route = b.route_code
                WHERE b.updated_at < NOW() - make_interval(secs => $1)
            )
            UPDATE buses b
            SET available_seats = e.corrected, updated_at = NOW()
            FROM expected e
            WHERE b.id = e.id
              AND e.previous <> e.corrected
              -- re-checked against the latest row version under the row lock
              AND b.available_seats = e.previous
              AND b.updated_at < NOW() - make_interval(secs => $1)
            RETURNING b.route_code, e.previous, e.corrected
            "#,
        )
        .bind(grace_secs as f64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| SeatCorrection {
                route_code: row.get("route_code"),
                previous: row.get("previous"),
                corrected: row.get("corrected"),
            })
            .collect())
    }
}
