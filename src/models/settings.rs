//! Admin settings (singleton row) and booking rounds

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::route_code::RouteCode;

/// Booking gate and travel dates.
///
/// Fetched once per booking request and passed down explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminSettings {
    pub booking_enabled: bool,
    pub go_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
}

impl AdminSettings {
    /// Fail-closed value used when the settings row cannot be read
    pub fn closed() -> Self {
        Self {
            booking_enabled: false,
            go_date: None,
            return_date: None,
        }
    }
}

/// Route code → seat count map
pub type SeatMap = IndexMap<RouteCode, i32>;

/// Settings view returned to the admin screens
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub booking_enabled: bool,
    pub go_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    #[schema(value_type = Object)]
    pub bus_availability: SeatMap,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettings {
    pub booking_enabled: bool,
    pub go_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    /// Admin seat overrides, each clamped to the bus capacity
    #[schema(value_type = Option<Object>)]
    pub bus_availability: Option<SeatMap>,
}

/// Archived summary of one booking round
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingRound {
    pub id: i32,
    pub go_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub total_bookings: i64,
    /// Sum of fares of paid bookings
    pub total_revenue: i64,
    pub reset_date: DateTime<Utc>,
}
