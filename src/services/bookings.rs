//! Booking service: public booking flow and admin ledger operations

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        booking::{BookingQuery, CreateBookingRequest, PaymentReference},
        AdminSettings, AdmissionNumber, Booking, NewBooking, RouteCode,
    },
    repository::{
        bookings::{BookingStats, BookingStore},
        Repository,
    },
    services::{fares::FareCatalog, payments::PaymentGateway, seats},
};

#[derive(Clone)]
pub struct BookingsService {
    repository: Repository,
    fares: FareCatalog,
    store: Arc<dyn BookingStore>,
    payments: Arc<dyn PaymentGateway>,
}

impl BookingsService {
    pub fn new(
        repository: Repository,
        fares: FareCatalog,
        store: Arc<dyn BookingStore>,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            repository,
            fares,
            store,
            payments,
        }
    }

    /// Create a booking from the public flow.
    ///
    /// `settings` is the snapshot read for this request: it gates the flow and
    /// supplies the travel dates stamped into the booking.
    pub async fn create_booking(
        &self,
        settings: &AdminSettings,
        request: CreateBookingRequest,
    ) -> AppResult<Booking> {
        if !settings.booking_enabled {
            return Err(AppError::BookingDisabled(
                "Booking is currently not available".to_string(),
            ));
        }

        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let admission_number = AdmissionNumber::parse(&request.admission_number)?;
        let route = RouteCode::parse(&request.bus_route)?;
        let destination = request.destination.trim().to_string();

        let fare = self.fares.get_fare(&route, &destination).await?;

        let payment = PaymentReference {
            payment_id: non_empty(request.razorpay_payment_id),
            order_id: non_empty(request.razorpay_order_id),
            signature: non_empty(request.razorpay_signature),
        };
        self.verify_payment(&payment).await?;

        let booking = NewBooking {
            admission_number,
            student_name: request.student_name.trim().to_string(),
            bus_route: route,
            destination,
            payment_status: request.payment_status,
            fare: fare.fare,
            bus_name: fare.bus_name,
            go_date: settings.go_date,
            return_date: settings.return_date,
            payment,
        };

        self.reserve_and_record(booking).await
    }

    async fn verify_payment(&self, payment: &PaymentReference) -> AppResult<()> {
        let (Some(order_id), Some(payment_id), Some(signature)) =
            (&payment.order_id, &payment.payment_id, &payment.signature)
        else {
            return Ok(());
        };

        if !self
            .payments
            .verify_signature(order_id, payment_id, signature)
            .await?
        {
            tracing::warn!(order_id = %order_id, payment_id = %payment_id, "payment signature rejected");
            return Err(AppError::Validation(
                "Payment verification failed".to_string(),
            ));
        }
        Ok(())
    }

    /// Reserve a seat and write the booking in one transaction.
    ///
    /// Any error drops the transaction, which rolls the seat decrement back.
    async fn reserve_and_record(&self, booking: NewBooking) -> AppResult<Booking> {
        let mut tx = self.store.begin().await?;
        let permit = seats::reserve(tx.as_mut(), &booking.bus_route).await?;

        let stored = match tx.insert(permit, &booking).await {
            Ok(stored) => stored,
            Err(err) => {
                tracing::warn!(
                    route = %booking.bus_route,
                    admission_number = %booking.admission_number,
                    error = %err,
                    "booking insert failed, seat reservation rolled back"
                );
                return Err(err);
            }
        };
        tx.commit().await?;

        tracing::info!(
            booking_id = stored.id,
            route = %stored.bus_route,
            admission_number = %stored.admission_number,
            fare = stored.fare,
            "booking created"
        );
        Ok(stored)
    }

    /// Public search by admission number
    pub async fn search(&self, admission_number: &str) -> AppResult<Vec<Booking>> {
        let admission_number = AdmissionNumber::parse(admission_number)?;
        self.repository.bookings.search(&admission_number).await
    }

    pub async fn list(&self, query: &BookingQuery) -> AppResult<(Vec<Booking>, i64)> {
        self.repository.bookings.list(query).await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Booking> {
        self.repository.bookings.get_by_id(id).await
    }

    pub async fn update_payment_status(&self, id: i32, paid: bool) -> AppResult<Booking> {
        let booking = self.repository.bookings.update_payment_status(id, paid).await?;
        tracing::info!(booking_id = id, paid, "payment status updated");
        Ok(booking)
    }

    /// Delete a booking and restore its seat
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let (route, outcome) = self.repository.bookings.delete_and_release(id).await?;
        tracing::info!(booking_id = id, route = %route, outcome = ?outcome, "booking deleted");
        Ok(())
    }

    pub async fn stats(&self) -> AppResult<BookingStats> {
        self.repository.bookings.stats().await
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
