//! Bus model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::route_code::RouteCode;
use crate::error::{AppError, AppResult};

/// Bus with its live seat counter
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Bus {
    pub id: i32,
    pub name: String,
    /// Unique, immutable after creation
    pub route_code: RouteCode,
    pub total_seats: i32,
    /// Always within `0..=total_seats`
    pub available_seats: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create bus request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBus {
    #[validate(length(min = 1, max = 100, message = "Bus name is required"))]
    pub name: String,
    pub route_code: RouteCode,
    /// Defaults to 10
    #[validate(range(min = 0, max = 1000))]
    pub total_seats: Option<i32>,
    /// Initial counter, clamped to `0..=total_seats`; defaults to `total_seats`
    pub available_seats: Option<i32>,
    pub is_active: Option<bool>,
}

/// Update bus request (route code cannot change)
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateBus {
    /// Accepted only when equal to the bus's current route code
    pub route_code: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(range(min = 0, max = 1000))]
    pub total_seats: Option<i32>,
    /// Admin override, clamped to `0..=total_seats`
    pub available_seats: Option<i32>,
    pub is_active: Option<bool>,
}

impl UpdateBus {
    /// Reject an attempt to move the bus to another route code
    pub fn check_route_code(&self, current: &RouteCode) -> AppResult<()> {
        match self.route_code.as_deref().map(str::trim) {
            Some(code) if code != current.as_str() => Err(AppError::Validation(
                "Route code cannot be changed".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Compact availability view used by the public booking flow
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BusAvailability {
    pub route_code: RouteCode,
    pub name: String,
    pub total_seats: i32,
    pub available_seats: i32,
}

/// Clamp a seat count into `0..=total_seats`
pub fn clamp_seats(seats: i32, total_seats: i32) -> i32 {
    seats.clamp(0, total_seats.max(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_seats() {
        assert_eq!(clamp_seats(5, 10), 5);
        assert_eq!(clamp_seats(-3, 10), 0);
        assert_eq!(clamp_seats(14, 10), 10);
        assert_eq!(clamp_seats(3, 0), 0);
    }

    #[test]
    fn test_update_cannot_change_route_code() {
        let current = RouteCode::parse("bus-1").unwrap();

        let renamed: UpdateBus =
            serde_json::from_value(serde_json::json!({ "route_code": "bus-2", "name": "B" })).unwrap();
        assert!(matches!(
            renamed.check_route_code(&current),
            Err(AppError::Validation(_))
        ));

        let unchanged: UpdateBus =
            serde_json::from_value(serde_json::json!({ "route_code": "bus-1" })).unwrap();
        assert!(unchanged.check_route_code(&current).is_ok());
        assert!(UpdateBus::default().check_route_code(&current).is_ok());
    }

    #[test]
    fn test_update_rejects_unknown_fields() {
        let result = serde_json::from_value::<UpdateBus>(serde_json::json!({ "routeCode": "bus-2" }));
        assert!(result.is_err());
    }
}
