//! Booking round lifecycle: archive and reset, plus seat reconciliation

use crate::{
    error::AppResult,
    models::BookingRound,
    repository::{
        bookings::BookingsRepository,
        rounds::RoundsRepository,
        seats::{SeatCorrection, SeatsRepository},
        settings::SettingsRepository,
        Repository,
    },
};

#[derive(Clone)]
pub struct RoundsService {
    repository: Repository,
    reconcile_grace_secs: i64,
}

impl RoundsService {
    pub fn new(repository: Repository, reconcile_grace_secs: i64) -> Self {
        Self {
            repository,
            reconcile_grace_secs,
        }
    }

    /// Close the live round.
    ///
    /// Archives the ledger totals with the current travel dates, empties the
    /// ledger and refills every active bus, all in one transaction.
    pub async fn reset_round(&self) -> AppResult<BookingRound> {
        let mut tx = self.repository.pool.begin().await?;

        BookingsRepository::lock_ledger_on(&mut *tx).await?;
        let settings = SettingsRepository::lock_on(&mut *tx).await?;

        let totals = RoundsRepository::totals_on(&mut *tx).await?;
        let round =
            RoundsRepository::insert_on(&mut *tx, settings.go_date, settings.return_date, totals)
                .await?;
        let cleared = BookingsRepository::clear_ledger_on(&mut *tx).await?;
        let restored = SeatsRepository::reset_all_on(&mut *tx).await?;

        tx.commit().await?;

        tracing::info!(
            round_id = round.id,
            total_bookings = round.total_bookings,
            total_revenue = round.total_revenue,
            cleared,
            restored_buses = restored,
            "booking round reset"
        );
        Ok(round)
    }

    /// Archived rounds, newest first
    pub async fn history(&self) -> AppResult<Vec<BookingRound>> {
        self.repository.rounds.list().await
    }

    /// Correct counters that drifted from the live ledger
    pub async fn reconcile(&self) -> AppResult<Vec<SeatCorrection>> {
        let corrections = self
            .repository
            .seats
            .reconcile(self.reconcile_grace_secs)
            .await?;
        for c in &corrections {
            tracing::warn!(
                route = %c.route_code,
                previous = c.previous,
                corrected = c.corrected,
                "seat counter reconciled"
            );
        }
        Ok(corrections)
    }
}
