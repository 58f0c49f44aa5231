//! Route stop (fare catalog) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::route_code::RouteCode;

/// Named stop on a route with its fare in whole rupees
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RouteStop {
    pub id: i32,
    pub route_code: RouteCode,
    pub stop_name: String,
    pub fare: i32,
    pub stop_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRouteStop {
    pub route_code: RouteCode,
    #[validate(length(min = 1, max = 100, message = "Stop name is required"))]
    pub stop_name: String,
    #[validate(range(min = 0, message = "Fare cannot be negative"))]
    pub fare: i32,
    #[validate(range(min = 0))]
    pub stop_order: i32,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRouteStop {
    #[validate(length(min = 1, max = 100, message = "Stop name is required"))]
    pub stop_name: String,
    #[validate(range(min = 0, message = "Fare cannot be negative"))]
    pub fare: i32,
    #[validate(range(min = 0))]
    pub stop_order: i32,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct RouteStopQuery {
    pub route_code: Option<RouteCode>,
}

/// Fare lookup result, copied into a booking at creation time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
pub struct Fare {
    pub fare: i32,
    pub bus_name: String,
}
