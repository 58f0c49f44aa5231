//! Booking rounds repository (append-only archive)

use chrono::NaiveDate;
use sqlx::{PgConnection, Pool, Postgres};

use crate::{error::AppResult, models::BookingRound};

/// Ledger totals frozen into a round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerTotals {
    pub total_bookings: i64,
    /// Sum of fares of paid bookings only
    pub total_revenue: i64,
}

#[derive(Clone)]
pub struct RoundsRepository {
    pool: Pool<Postgres>,
}

impl RoundsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Archived rounds, newest first
    pub async fn list(&self) -> AppResult<Vec<BookingRound>> {
        let rows = sqlx::query_as::<_, BookingRound>(
            "SELECT * FROM booking_rounds ORDER BY reset_date DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn totals_on(conn: &mut PgConnection) -> AppResult<LedgerTotals> {
        let (total_bookings, total_revenue): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(fare) FILTER (WHERE payment_status), 0)::BIGINT
            FROM bookings
            "#,
        )
        .fetch_one(&mut *conn)
        .await?;
        Ok(LedgerTotals {
            total_bookings,
            total_revenue,
        })
    }

    pub async fn insert_on(
        conn: &mut PgConnection,
        go_date: Option<NaiveDate>,
        return_date: Option<NaiveDate>,
        totals: LedgerTotals,
    ) -> AppResult<BookingRound> {
        let row = sqlx::query_as::<_, BookingRound>(
            r#"
            INSERT INTO booking_rounds (go_date, return_date, total_bookings, total_revenue, reset_date)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING *
            "#,
        )
        .bind(go_date)
        .bind(return_date)
        .bind(totals.total_bookings)
        .bind(totals.total_revenue)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }
}
