//! Seat counter behaviour against a real Postgres database.
//!
//! Each test creates its own bus with a unique route code and removes it
//! afterwards; `reset_round` touches every bus and runs alone.

use std::time::Duration;

use buspass_server::{
    models::{
        booking::BookingQuery,
        bus::{CreateBus, UpdateBus},
        route_stop::{CreateRouteStop, UpdateRouteStop},
        AdmissionNumber, NewBooking, RouteCode,
    },
    repository::{
        bookings::BookingStore,
        route_stops::FareSource,
        seats::{ReleaseOutcome, ReserveOutcome, SeatsRepository},
        Repository,
    },
    services::rounds::RoundsService,
};
use sqlx::postgres::PgPoolOptions;
use tokio_test::{assert_err, assert_ok};

async fn repository() -> Repository {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    Repository::new(pool)
}

fn unique_route(tag: &str) -> RouteCode {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    RouteCode::parse(&format!("{}-{}", tag, &suffix[..8])).expect("valid route code")
}

async fn create_bus(repo: &Repository, route: &RouteCode, total: i32, available: i32) -> i32 {
    let bus = repo
        .buses
        .create(&CreateBus {
            name: format!("Test bus {}", route),
            route_code: route.clone(),
            total_seats: Some(total),
            available_seats: Some(available),
            is_active: Some(true),
        })
        .await
        .expect("Failed to create bus");
    bus.id
}

fn booking_for(route: &RouteCode) -> NewBooking {
    NewBooking {
        admission_number: AdmissionNumber::parse("24CS094").expect("valid admission"),
        student_name: "Asha".to_string(),
        bus_route: route.clone(),
        destination: "Kottayam".to_string(),
        payment_status: true,
        fare: 50,
        bus_name: "Test bus".to_string(),
        go_date: None,
        return_date: None,
        payment: Default::default(),
    }
}

/// Reserve, insert and commit one booking; `None` when no seat was taken
async fn book(repo: &Repository, booking: &NewBooking) -> Option<i32> {
    let mut tx = repo.bookings.begin().await.expect("begin booking");
    match tx.reserve(&booking.bus_route).await.expect("reserve") {
        ReserveOutcome::Reserved(permit) => {
            let stored = tx.insert(permit, booking).await.expect("insert booking");
            tx.commit().await.expect("commit booking");
            Some(stored.id)
        }
        _ => None,
    }
}

async fn live_bookings(repo: &Repository, route: &RouteCode) -> i64 {
    let query = BookingQuery {
        bus_route: Some(route.clone()),
        ..Default::default()
    };
    let (_, total) = repo.bookings.list(&query).await.expect("list bookings");
    total
}

#[tokio::test]
#[ignore]
async fn test_last_seat_goes_to_exactly_one_caller() {
    let repo = repository().await;
    let route = unique_route("last");
    let bus_id = create_bus(&repo, &route, 5, 1).await;

    let mut handles = Vec::new();
    for _ in 0..12 {
        let repo = repo.clone();
        let booking = booking_for(&route);
        handles.push(tokio::spawn(async move { book(&repo, &booking).await }));
    }

    let mut booked = 0;
    for handle in handles {
        if handle.await.expect("task panicked").is_some() {
            booked += 1;
        }
    }
    assert_eq!(booked, 1);

    let bus = assert_ok!(repo.buses.get_by_id(bus_id).await);
    assert_eq!(bus.available_seats, 0);
    assert_eq!(live_bookings(&repo, &route).await, 1);

    assert_ok!(repo.buses.delete(bus_id).await);
}

#[tokio::test]
#[ignore]
async fn test_rolled_back_reservation_returns_the_seat() {
    let repo = repository().await;
    let route = unique_route("rollback");
    let bus_id = create_bus(&repo, &route, 3, 3).await;

    let mut tx = assert_ok!(repo.bookings.begin().await);
    let permit = match assert_ok!(tx.reserve(&route).await) {
        ReserveOutcome::Reserved(permit) => permit,
        other => panic!("unexpected outcome {:?}", other),
    };
    assert_eq!(permit.remaining(), 2);
    drop(permit);
    // Unspent permit: commit refuses and the decrement is undone
    assert_err!(tx.commit().await);
    drop(tx);

    let bus = assert_ok!(repo.buses.get_by_id(bus_id).await);
    assert_eq!(bus.available_seats, 3);
    assert_eq!(live_bookings(&repo, &route).await, 0);

    assert_ok!(repo.buses.delete(bus_id).await);
}

#[tokio::test]
#[ignore]
async fn test_release_never_exceeds_capacity() {
    let repo = repository().await;
    let route = unique_route("clamp");
    let bus_id = create_bus(&repo, &route, 3, 2).await;
    let mut conn = repo.pool.acquire().await.expect("acquire connection");

    assert_eq!(
        assert_ok!(SeatsRepository::release_on(&mut *conn, &route).await),
        ReleaseOutcome::Released { available: 3 }
    );
    assert_eq!(
        assert_ok!(SeatsRepository::release_on(&mut *conn, &route).await),
        ReleaseOutcome::AtCapacity
    );

    assert_ok!(repo.buses.delete(bus_id).await);
    assert_eq!(
        assert_ok!(SeatsRepository::release_on(&mut *conn, &route).await),
        ReleaseOutcome::RouteNotFound
    );
}

#[tokio::test]
#[ignore]
async fn test_deleting_booking_restores_its_seat() {
    let repo = repository().await;
    let route = unique_route("del");
    let bus_id = create_bus(&repo, &route, 4, 4).await;

    let booking_id = book(&repo, &booking_for(&route)).await.expect("seat available");
    let bus = assert_ok!(repo.buses.get_by_id(bus_id).await);
    assert_eq!(bus.available_seats, 3);

    let (released_route, outcome) = assert_ok!(repo.bookings.delete_and_release(booking_id).await);
    assert_eq!(released_route, route);
    assert_eq!(outcome, ReleaseOutcome::Released { available: 4 });

    assert_err!(repo.bookings.get_by_id(booking_id).await);
    assert_err!(repo.bookings.delete_and_release(booking_id).await);

    assert_ok!(repo.buses.delete(bus_id).await);
}

#[tokio::test]
#[ignore]
async fn test_inactive_route_is_not_reserved() {
    let repo = repository().await;
    let route = unique_route("off");
    let bus_id = create_bus(&repo, &route, 4, 4).await;

    assert_ok!(
        repo.buses
            .update(
                bus_id,
                &UpdateBus {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
    );
    let mut tx = assert_ok!(repo.bookings.begin().await);
    assert_eq!(
        assert_ok!(tx.reserve(&route).await),
        ReserveOutcome::RouteInactive
    );
    drop(tx);

    assert_ok!(repo.buses.delete(bus_id).await);
    let mut tx = assert_ok!(repo.bookings.begin().await);
    assert_eq!(
        assert_ok!(tx.reserve(&route).await),
        ReserveOutcome::RouteNotFound
    );
}

#[tokio::test]
#[ignore]
async fn test_reset_round_archives_and_refills() {
    let repo = repository().await;
    let route = unique_route("reset");
    let bus_id = create_bus(&repo, &route, 2, 2).await;

    for _ in 0..2 {
        assert!(book(&repo, &booking_for(&route)).await.is_some());
    }
    assert!(book(&repo, &booking_for(&route)).await.is_none());

    let rounds = RoundsService::new(repo.clone(), 120);
    let round = assert_ok!(rounds.reset_round().await);
    assert!(round.total_bookings >= 2);
    assert!(round.total_revenue >= 100);

    let bus = assert_ok!(repo.buses.get_by_id(bus_id).await);
    assert_eq!(bus.available_seats, 2);
    assert_eq!(live_bookings(&repo, &route).await, 0);

    let history = assert_ok!(rounds.history().await);
    assert_eq!(history.first().map(|r| r.id), Some(round.id));

    assert_ok!(repo.buses.delete(bus_id).await);
}

#[tokio::test]
#[ignore]
async fn test_reset_round_waits_for_booking_in_flight() {
    let repo = repository().await;
    let route = unique_route("inflight");
    let bus_id = create_bus(&repo, &route, 10, 10).await;

    let mut tx = assert_ok!(repo.bookings.begin().await);
    let permit = match assert_ok!(tx.reserve(&route).await) {
        ReserveOutcome::Reserved(permit) => permit,
        other => panic!("unexpected outcome {:?}", other),
    };

    let rounds = RoundsService::new(repo.clone(), 120);
    let reset = tokio::spawn(async move { rounds.reset_round().await });
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!reset.is_finished(), "reset must wait for the open booking");

    assert_ok!(tx.insert(permit, &booking_for(&route)).await);
    assert_ok!(tx.commit().await);
    let round = assert_ok!(reset.await.expect("reset task panicked"));
    assert!(round.total_bookings >= 1);

    // available == total - live bookings for the route
    let bus = assert_ok!(repo.buses.get_by_id(bus_id).await);
    let live = live_bookings(&repo, &route).await;
    assert_eq!(i64::from(bus.total_seats - bus.available_seats), live);
    assert_eq!((bus.available_seats, live), (10, 0));

    assert_ok!(repo.buses.delete(bus_id).await);
}

#[tokio::test]
#[ignore]
async fn test_fare_change_does_not_rewrite_existing_booking() {
    let repo = repository().await;
    let route = unique_route("fare");
    let bus_id = create_bus(&repo, &route, 5, 5).await;
    let stop = assert_ok!(
        repo.route_stops
            .create(&CreateRouteStop {
                route_code: route.clone(),
                stop_name: "Kottayam".to_string(),
                fare: 50,
                stop_order: 1,
                is_active: Some(true),
            })
            .await
    );

    let fare = assert_ok!(repo.route_stops.active_fare(&route, "Kottayam").await)
        .expect("active fare");
    let mut booking = booking_for(&route);
    booking.fare = fare.fare;
    booking.bus_name = fare.bus_name;
    let booking_id = book(&repo, &booking).await.expect("seat available");

    assert_ok!(
        repo.route_stops
            .update(
                stop.id,
                &UpdateRouteStop {
                    stop_name: "Kottayam".to_string(),
                    fare: 60,
                    stop_order: 1,
                    is_active: Some(true),
                },
            )
            .await
    );

    let stored = assert_ok!(repo.bookings.get_by_id(booking_id).await);
    assert_eq!(stored.fare, 50);
    let repriced = assert_ok!(repo.route_stops.active_fare(&route, "Kottayam").await)
        .expect("active fare");
    assert_eq!(repriced.fare, 60);

    assert_ok!(repo.bookings.delete_and_release(booking_id).await);
    assert_ok!(repo.buses.delete(bus_id).await);
}

#[tokio::test]
#[ignore]
async fn test_reconcile_repairs_orphaned_decrement() {
    let repo = repository().await;
    let route = unique_route("orphan");
    // Two seats taken with no booking behind them
    let bus_id = create_bus(&repo, &route, 3, 1).await;

    let corrections = assert_ok!(repo.seats.reconcile(60).await);
    assert!(corrections.iter().all(|c| c.route_code != route));

    tokio::time::sleep(Duration::from_millis(1_100)).await;
    let corrections = assert_ok!(repo.seats.reconcile(1).await);
    let fixed = corrections
        .iter()
        .find(|c| c.route_code == route)
        .expect("orphaned route corrected");
    assert_eq!((fixed.previous, fixed.corrected), (1, 3));

    let bus = assert_ok!(repo.buses.get_by_id(bus_id).await);
    assert_eq!(bus.available_seats, 3);

    assert_ok!(repo.buses.delete(bus_id).await);
}
