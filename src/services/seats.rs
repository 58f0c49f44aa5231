//! Seat accounting.
//!
//! A seat is taken with [`reserve`] inside a [`BookingTransaction`], which
//! hands back a [`SeatPermit`]. The permit is spent by the booking insert in
//! the same transaction; a transaction that ends any other way rolls the
//! decrement back with it.

use crate::{
    error::{AppError, AppResult},
    models::RouteCode,
    repository::{
        bookings::BookingTransaction,
        seats::{ReserveOutcome, SeatPermit},
    },
};

/// Take one seat on `route` inside `tx`
pub async fn reserve(tx: &mut dyn BookingTransaction, route: &RouteCode) -> AppResult<SeatPermit> {
    match tx.reserve(route).await? {
        ReserveOutcome::Reserved(permit) => {
            tracing::debug!(route = %route, remaining = permit.remaining(), "seat reserved");
            Ok(permit)
        }
        ReserveOutcome::SoldOut => {
            tracing::info!(route = %route, "reservation rejected, bus fully booked");
            Err(AppError::SoldOut("This bus is fully booked".to_string()))
        }
        ReserveOutcome::RouteInactive | ReserveOutcome::RouteNotFound => {
            tracing::info!(route = %route, "reservation rejected, route unavailable");
            Err(AppError::RouteUnavailable(
                "Selected bus is not available".to_string(),
            ))
        }
    }
}

/// In-memory booking store with the same commit/rollback semantics as Postgres
#[cfg(test)]
pub(crate) mod memory {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::{
        models::{Booking, NewBooking},
        repository::bookings::BookingStore,
    };

    #[derive(Debug, Clone, Copy)]
    struct Counter {
        available: i32,
        active: bool,
    }

    #[derive(Default)]
    struct State {
        counters: HashMap<RouteCode, Counter>,
        bookings: Vec<Booking>,
    }

    #[derive(Default, Clone)]
    pub struct MemoryStore {
        state: Arc<Mutex<State>>,
        failing_inserts: bool,
    }

    impl MemoryStore {
        pub fn with_bus(self, route: &str, available: i32, active: bool) -> Self {
            self.state.lock().unwrap().counters.insert(
                RouteCode::parse(route).unwrap(),
                Counter { available, active },
            );
            self
        }

        /// Every insert fails as if the connection dropped
        pub fn failing_inserts(mut self) -> Self {
            self.failing_inserts = true;
            self
        }

        pub fn available(&self, route: &str) -> i32 {
            self.state.lock().unwrap().counters[&RouteCode::parse(route).unwrap()].available
        }

        pub fn bookings(&self) -> Vec<Booking> {
            self.state.lock().unwrap().bookings.clone()
        }
    }

    #[async_trait]
    impl BookingStore for MemoryStore {
        async fn begin(&self) -> AppResult<Box<dyn BookingTransaction>> {
            Ok(Box::new(MemoryTransaction {
                unit: Uuid::new_v4(),
                state: self.state.clone(),
                failing_inserts: self.failing_inserts,
                reserved: Vec::new(),
                staged: Vec::new(),
                unspent: 0,
                finished: false,
            }))
        }
    }

    pub struct MemoryTransaction {
        unit: Uuid,
        state: Arc<Mutex<State>>,
        failing_inserts: bool,
        reserved: Vec<RouteCode>,
        staged: Vec<Booking>,
        unspent: u32,
        finished: bool,
    }

    impl MemoryTransaction {
        fn rollback(&mut self) {
            self.finished = true;
            self.staged.clear();
            if let Ok(mut state) = self.state.lock() {
                for route in self.reserved.drain(..) {
                    if let Some(counter) = state.counters.get_mut(&route) {
                        counter.available += 1;
                    }
                }
            }
        }
    }

    impl Drop for MemoryTransaction {
        fn drop(&mut self) {
            if !self.finished {
                self.rollback();
            }
        }
    }

    #[async_trait]
    impl BookingTransaction for MemoryTransaction {
        async fn reserve(&mut self, route: &RouteCode) -> AppResult<ReserveOutcome> {
            tokio::task::yield_now().await;
            let mut state = self.state.lock().unwrap();
            let outcome = match state.counters.get_mut(route) {
                None => ReserveOutcome::RouteNotFound,
                Some(c) if !c.active => ReserveOutcome::RouteInactive,
                Some(c) if c.available == 0 => ReserveOutcome::SoldOut,
                Some(c) => {
                    c.available -= 1;
                    ReserveOutcome::Reserved(SeatPermit::issue(self.unit, route.clone(), c.available))
                }
            };
            if matches!(outcome, ReserveOutcome::Reserved(_)) {
                self.reserved.push(route.clone());
                self.unspent += 1;
            }
            Ok(outcome)
        }

        async fn insert(&mut self, permit: SeatPermit, booking: &NewBooking) -> AppResult<Booking> {
            permit.spend(self.unit, &booking.bus_route)?;
            self.unspent = self.unspent.saturating_sub(1);
            if self.failing_inserts {
                return Err(AppError::Database(sqlx::Error::PoolTimedOut));
            }
            let stored = Booking {
                id: self.staged.len() as i32 + 1,
                admission_number: booking.admission_number.clone(),
                student_name: booking.student_name.clone(),
                bus_route: booking.bus_route.clone(),
                destination: booking.destination.clone(),
                payment_status: booking.payment_status,
                fare: booking.fare,
                bus_name: booking.bus_name.clone(),
                go_date: booking.go_date,
                return_date: booking.return_date,
                razorpay_payment_id: booking.payment.payment_id.clone(),
                razorpay_order_id: booking.payment.order_id.clone(),
                razorpay_signature: booking.payment.signature.clone(),
                created_at: Utc::now(),
            };
            self.staged.push(stored.clone());
            Ok(stored)
        }

        async fn commit(&mut self) -> AppResult<()> {
            if self.finished {
                return Err(AppError::Internal("booking transaction already finished".into()));
            }
            if self.unspent > 0 {
                self.rollback();
                return Err(AppError::Internal("unspent seat permit".into()));
            }
            self.finished = true;
            self.reserved.clear();
            let mut state = self.state.lock().unwrap();
            state.bookings.append(&mut self.staged);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::memory::MemoryStore;
    use super::*;
    use crate::{
        models::{booking::PaymentReference, AdmissionNumber, NewBooking},
        repository::bookings::{BookingStore, MockBookingTransaction},
    };

    fn route(code: &str) -> RouteCode {
        RouteCode::parse(code).unwrap()
    }

    fn booking_for(code: &str) -> NewBooking {
        NewBooking {
            admission_number: AdmissionNumber::parse("24CS094").unwrap(),
            student_name: "Asha".into(),
            bus_route: route(code),
            destination: "Kottayam".into(),
            payment_status: true,
            fare: 50,
            bus_name: "Bus 1".into(),
            go_date: NaiveDate::from_ymd_opt(2025, 6, 2),
            return_date: None,
            payment: PaymentReference::default(),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_last_seat_goes_to_exactly_one_caller() {
        let store = MemoryStore::default().with_bus("bus-1", 1, true);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    let mut tx = store.begin().await?;
                    let permit = reserve(tx.as_mut(), &route("bus-1")).await?;
                    assert_eq!(permit.remaining(), 0);
                    tx.insert(permit, &booking_for("bus-1")).await?;
                    tx.commit().await
                })
            })
            .collect();

        let mut granted = 0;
        let mut sold_out = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => granted += 1,
                Err(AppError::SoldOut(_)) => sold_out += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(granted, 1);
        assert_eq!(sold_out, 15);
        assert_eq!(store.available("bus-1"), 0);
        assert_eq!(store.bookings().len(), 1);
    }

    #[tokio::test]
    async fn test_inactive_and_unknown_routes_are_unavailable() {
        let store = MemoryStore::default().with_bus("bus-2", 5, false);
        let mut tx = store.begin().await.unwrap();

        let inactive = reserve(tx.as_mut(), &route("bus-2")).await;
        assert!(matches!(inactive, Err(AppError::RouteUnavailable(_))));
        assert_eq!(store.available("bus-2"), 5);

        let unknown = reserve(tx.as_mut(), &route("bus-9")).await;
        assert!(matches!(unknown, Err(AppError::RouteUnavailable(_))));
    }

    #[tokio::test]
    async fn test_permit_cannot_book_another_route() {
        let store = MemoryStore::default()
            .with_bus("bus-1", 5, true)
            .with_bus("bus-2", 5, true);
        let mut tx = store.begin().await.unwrap();

        let permit = reserve(tx.as_mut(), &route("bus-1")).await.unwrap();
        assert_eq!(permit.route().as_str(), "bus-1");
        let result = tx.insert(permit, &booking_for("bus-2")).await;
        assert!(matches!(result, Err(AppError::Internal(_))));

        drop(tx);
        assert_eq!(store.available("bus-1"), 5);
        assert_eq!(store.available("bus-2"), 5);
        assert!(store.bookings().is_empty());
    }

    #[tokio::test]
    async fn test_permit_is_bound_to_its_transaction() {
        let store = MemoryStore::default().with_bus("bus-1", 5, true);
        let mut first = store.begin().await.unwrap();
        let mut second = store.begin().await.unwrap();

        let permit = reserve(first.as_mut(), &route("bus-1")).await.unwrap();
        let result = second.insert(permit, &booking_for("bus-1")).await;
        assert!(matches!(result, Err(AppError::Internal(_))));

        // The issuing transaction never saw its permit spent
        assert!(matches!(first.commit().await, Err(AppError::Internal(_))));
        assert_eq!(store.available("bus-1"), 5);
    }

    #[tokio::test]
    async fn test_commit_with_unspent_permit_restores_the_seat() {
        let store = MemoryStore::default().with_bus("bus-1", 3, true);
        let mut tx = store.begin().await.unwrap();

        let permit = reserve(tx.as_mut(), &route("bus-1")).await.unwrap();
        assert_eq!(permit.remaining(), 2);
        assert_eq!(store.available("bus-1"), 2);
        drop(permit);

        assert!(matches!(tx.commit().await, Err(AppError::Internal(_))));
        assert_eq!(store.available("bus-1"), 3);
    }

    #[tokio::test]
    async fn test_database_error_is_not_a_reservation() {
        let mut tx = MockBookingTransaction::new();
        tx.expect_reserve()
            .returning(|_| Err(AppError::Database(sqlx::Error::PoolTimedOut)));

        let result = reserve(&mut tx, &route("bus-1")).await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }
}
