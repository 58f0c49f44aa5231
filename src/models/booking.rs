//! Booking model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{admission::AdmissionNumber, route_code::RouteCode};

/// Booking row.
///
/// `fare`, `bus_name`, `go_date` and `return_date` are snapshots taken when the
/// booking was made; later catalog or settings edits never touch them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Booking {
    pub id: i32,
    pub admission_number: AdmissionNumber,
    pub student_name: String,
    pub bus_route: RouteCode,
    pub destination: String,
    pub payment_status: bool,
    pub fare: i32,
    pub bus_name: String,
    pub go_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub razorpay_payment_id: Option<String>,
    pub razorpay_order_id: Option<String>,
    pub razorpay_signature: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Public booking request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[validate(length(min = 1, max = 120, message = "Student name is required"))]
    pub student_name: String,
    pub admission_number: String,
    pub bus_route: String,
    #[validate(length(min = 1, max = 100, message = "Destination is required"))]
    pub destination: String,
    #[serde(default)]
    pub payment_status: bool,
    #[serde(rename = "razorpay_payment_id")]
    pub razorpay_payment_id: Option<String>,
    #[serde(rename = "razorpay_order_id")]
    pub razorpay_order_id: Option<String>,
    #[serde(rename = "razorpay_signature")]
    pub razorpay_signature: Option<String>,
}

/// Opaque payment-gateway correlation ids stamped into a booking
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentReference {
    pub payment_id: Option<String>,
    pub order_id: Option<String>,
    pub signature: Option<String>,
}

impl PaymentReference {
    /// All three ids present, i.e. a gateway payment that can be verified
    pub fn is_complete(&self) -> bool {
        self.payment_id.is_some() && self.order_id.is_some() && self.signature.is_some()
    }
}

/// Fully resolved booking ready to be written to the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub admission_number: AdmissionNumber,
    pub student_name: String,
    pub bus_route: RouteCode,
    pub destination: String,
    pub payment_status: bool,
    pub fare: i32,
    pub bus_name: String,
    pub go_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub payment: PaymentReference,
}

/// Admin booking list filters
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct BookingQuery {
    pub bus_route: Option<RouteCode>,
    pub payment_status: Option<bool>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub const DEFAULT_PAGE_LIMIT: i64 = 50;
pub const MAX_PAGE_LIMIT: i64 = 200;

impl BookingQuery {
    /// Page number, starting at 1
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePaymentStatus {
    pub payment_status: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct BookingSearchQuery {
    pub admission_number: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let query = BookingQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), DEFAULT_PAGE_LIMIT);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_pagination_bounds() {
        let query = BookingQuery {
            page: Some(3),
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(query.limit(), MAX_PAGE_LIMIT);
        assert_eq!(query.offset(), 2 * MAX_PAGE_LIMIT);

        let query = BookingQuery {
            page: Some(-4),
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), 1);
    }

    #[test]
    fn test_create_request_field_names() {
        let request: CreateBookingRequest = serde_json::from_value(serde_json::json!({
            "studentName": "Asha",
            "admissionNumber": "24CS094",
            "busRoute": "bus-1",
            "destination": "Kottayam",
            "paymentStatus": true,
            "razorpay_payment_id": "pay_1",
            "razorpay_order_id": "order_1",
            "razorpay_signature": "sig"
        }))
        .unwrap();
        assert_eq!(request.student_name, "Asha");
        assert!(request.payment_status);
        assert_eq!(request.razorpay_order_id.as_deref(), Some("order_1"));
    }

    #[test]
    fn test_payment_reference_completeness() {
        let partial = PaymentReference {
            payment_id: Some("pay_1".into()),
            ..Default::default()
        };
        assert!(!partial.is_complete());

        let full = PaymentReference {
            payment_id: Some("pay_1".into()),
            order_id: Some("order_1".into()),
            signature: Some("sig".into()),
        };
        assert!(full.is_complete());
    }
}
