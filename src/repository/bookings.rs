//! Bookings (ledger) repository

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{FromRow, PgConnection, Pool, Postgres, QueryBuilder, Transaction};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{booking::BookingQuery, AdmissionNumber, Booking, NewBooking, RouteCode},
    repository::seats::{ReleaseOutcome, ReserveOutcome, SeatPermit, SeatsRepository},
};

/// Opens the unit of work used by booking creation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn begin(&self) -> AppResult<Box<dyn BookingTransaction>>;
}

/// One booking creation: reserve a seat, write the booking, commit.
///
/// Dropping the transaction before [`commit`](BookingTransaction::commit)
/// rolls back both the decrement and the insert.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingTransaction: Send {
    /// Atomically take one seat if the route is active and has one left
    async fn reserve(&mut self, route: &RouteCode) -> AppResult<ReserveOutcome>;

    /// Persist a booking, spending the permit reserved for its route
    async fn insert(&mut self, permit: SeatPermit, booking: &NewBooking) -> AppResult<Booking>;

    /// Fails, and rolls back, while a reserved permit is still unspent
    async fn commit(&mut self) -> AppResult<()>;
}

/// Postgres booking transaction
pub struct PgBookingTransaction {
    unit: Uuid,
    tx: Option<Transaction<'static, Postgres>>,
    unspent_permits: u32,
}

impl PgBookingTransaction {
    fn conn(&mut self) -> AppResult<&mut PgConnection> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| AppError::Internal("booking transaction already finished".to_string()))
    }
}

#[async_trait]
impl BookingTransaction for PgBookingTransaction {
    async fn reserve(&mut self, route: &RouteCode) -> AppResult<ReserveOutcome> {
        let unit = self.unit;
        let outcome = SeatsRepository::reserve_on(self.conn()?, unit, route).await?;
        if matches!(outcome, ReserveOutcome::Reserved(_)) {
            self.unspent_permits += 1;
        }
        Ok(outcome)
    }

    async fn insert(&mut self, permit: SeatPermit, booking: &NewBooking) -> AppResult<Booking> {
        permit.spend(self.unit, &booking.bus_route)?;
        self.unspent_permits = self.unspent_permits.saturating_sub(1);
        BookingsRepository::insert_on(self.conn()?, booking).await
    }

    async fn commit(&mut self) -> AppResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| AppError::Internal("booking transaction already finished".to_string()))?;
        if self.unspent_permits > 0 {
            // Dropping `tx` rolls the reservation back
            return Err(AppError::Internal(format!(
                "{} reserved seat(s) without a booking, transaction rolled back",
                self.unspent_permits
            )));
        }
        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct RouteBookingCount {
    pub bus_route: RouteCode,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct DailyBookingCount {
    pub date: NaiveDate,
    pub count: i64,
}

/// Ledger-wide counters for the admin bookings screen
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingStats {
    pub total_bookings: i64,
    pub paid_bookings: i64,
    pub pending_payments: i64,
    pub recent_bookings: i64,
    pub total_revenue: i64,
    pub route_stats: Vec<RouteBookingCount>,
    pub daily_stats: Vec<DailyBookingCount>,
}

#[derive(Clone)]
pub struct BookingsRepository {
    pool: Pool<Postgres>,
}

impl BookingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))
    }

    /// Exact match on the (uppercased) admission number, newest first
    pub async fn search(&self, admission_number: &AdmissionNumber) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE admission_number = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(admission_number)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &BookingQuery) {
        builder.push(" WHERE TRUE");
        if let Some(ref route) = query.bus_route {
            builder.push(" AND bus_route = ").push_bind(route.clone());
        }
        if let Some(paid) = query.payment_status {
            builder.push(" AND payment_status = ").push_bind(paid);
        }
        if let Some(start) = query.start_date {
            builder.push(" AND created_at >= ").push_bind(start);
        }
        if let Some(end) = query.end_date {
            builder.push(" AND created_at <= ").push_bind(end);
        }
    }

    /// Filtered page of bookings plus the total matching count
    pub async fn list(&self, query: &BookingQuery) -> AppResult<(Vec<Booking>, i64)> {
        let mut count_builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM bookings");
        Self::push_filters(&mut count_builder, query);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM bookings");
        Self::push_filters(&mut builder, query);
        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(query.limit())
            .push(" OFFSET ")
            .push_bind(query.offset());

        let rows = builder
            .build_query_as::<Booking>()
            .fetch_all(&self.pool)
            .await?;
        Ok((rows, total))
    }

    pub async fn update_payment_status(&self, id: i32, paid: bool) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET payment_status = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(paid)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))
    }

    /// Delete a booking and give its seat back in one transaction
    pub async fn delete_and_release(&self, id: i32) -> AppResult<(RouteCode, ReleaseOutcome)> {
        let mut tx = self.pool.begin().await?;

        let route: RouteCode =
            sqlx::query_scalar("DELETE FROM bookings WHERE id = $1 RETURNING bus_route")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))?;

        let outcome = SeatsRepository::release_on(&mut *tx, &route).await?;
        tx.commit().await?;
        Ok((route, outcome))
    }

    /// Lock the ledger against writers (reads still proceed)
    pub async fn lock_ledger_on(conn: &mut PgConnection) -> AppResult<()> {
        sqlx::query("LOCK TABLE bookings IN EXCLUSIVE MODE")
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Remove every booking without touching seat counters
    pub async fn clear_ledger_on(conn: &mut PgConnection) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM bookings")
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn stats(&self) -> AppResult<BookingStats> {
        let (total_bookings, paid_bookings, recent_bookings, total_revenue): (i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    COUNT(*) FILTER (WHERE payment_status),
                    COUNT(*) FILTER (WHERE created_at >= NOW() - INTERVAL '7 days'),
                    COALESCE(SUM(fare) FILTER (WHERE payment_status), 0)::BIGINT
                FROM bookings
                "#,
            )
            .fetch_one(&self.pool)
            .await?;

        let route_stats = sqlx::query_as::<_, RouteBookingCount>(
            r#"
            SELECT bus_route, COUNT(*) AS count
            FROM bookings
            GROUP BY bus_route
            ORDER BY count DESC, bus_route
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let daily_stats = sqlx::query_as::<_, DailyBookingCount>(
            r#"
            SELECT created_at::date AS date, COUNT(*) AS count
            FROM bookings
            WHERE created_at >= NOW() - INTERVAL '30 days'
            GROUP BY created_at::date
            ORDER BY date
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(BookingStats {
            total_bookings,
            paid_bookings,
            pending_payments: total_bookings - paid_bookings,
            recent_bookings,
            total_revenue,
            route_stats,
            daily_stats,
        })
    }

    /// Write a booking row with its snapshot fields
    pub async fn insert_on(conn: &mut PgConnection, booking: &NewBooking) -> AppResult<Booking> {
        let row = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (
                admission_number, student_name, bus_route, destination,
                payment_status, fare, bus_name, go_date, return_date,
                razorpay_payment_id, razorpay_order_id, razorpay_signature
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(&booking.admission_number)
        .bind(&booking.student_name)
        .bind(&booking.bus_route)
        .bind(&booking.destination)
        .bind(booking.payment_status)
        .bind(booking.fare)
        .bind(&booking.bus_name)
        .bind(booking.go_date)
        .bind(booking.return_date)
        .bind(&booking.payment.payment_id)
        .bind(&booking.payment.order_id)
        .bind(&booking.payment.signature)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl BookingStore for BookingsRepository {
    async fn begin(&self) -> AppResult<Box<dyn BookingTransaction>> {
        let mut tx = self.pool.begin().await?;
        // Same lock order as a round reset: ledger table first, then bus rows
        sqlx::query("LOCK TABLE bookings IN ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;
        Ok(Box::new(PgBookingTransaction {
            unit: Uuid::new_v4(),
            tx: Some(tx),
            unspent_permits: 0,
        }))
    }
}
