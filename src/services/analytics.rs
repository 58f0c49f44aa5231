//! Analytics: read-only reports derived from the ledger and the inventory

use serde::Serialize;
use sqlx::Row;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::RouteCode,
    repository::Repository,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum DemandLevel {
    Low,
    Medium,
    High,
}

/// Demand tier from a route's share of all live bookings (whole percent)
pub fn demand_level(percentage: i64) -> DemandLevel {
    match percentage {
        p if p >= 15 => DemandLevel::High,
        p if p >= 5 => DemandLevel::Medium,
        _ => DemandLevel::Low,
    }
}

/// `part / whole` as a rounded whole percentage, 0 when `whole` is 0
pub fn percentage(part: i64, whole: i64) -> i64 {
    if whole <= 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as i64
}

/// Share of capacity in use, formatted with one decimal
pub fn occupancy_rate(total_capacity: i64, available_seats: i64) -> String {
    if total_capacity <= 0 {
        return "0.0".to_string();
    }
    let used = (total_capacity - available_seats) as f64;
    format!("{:.1}", used / total_capacity as f64 * 100.0)
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_buses: i64,
    pub total_bookings: i64,
    pub paid_bookings: i64,
    pub unpaid_bookings: i64,
    pub current_revenue: i64,
    pub available_seats: i64,
    /// Sum of `total_seats` over active buses
    pub total_capacity: i64,
    pub occupancy_rate: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteRevenue {
    pub bus_route: RouteCode,
    pub bus_name: String,
    pub total_revenue: i64,
    pub booking_count: i64,
    pub revenue_per_booking: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevenueReport {
    pub total_revenue: i64,
    pub routes: Vec<RouteRevenue>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteDemand {
    pub route_code: RouteCode,
    pub bus_name: String,
    pub total_bookings: i64,
    pub booking_percentage: i64,
    pub demand_level: DemandLevel,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoutesReport {
    pub routes: Vec<RouteDemand>,
    pub total_bookings: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StopDemand {
    pub stop_name: String,
    pub booking_count: i64,
    pub percentage_of_route: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StopsReport {
    pub bus_route: RouteCode,
    pub bus_name: String,
    pub total_route_bookings: i64,
    pub stops: Vec<StopDemand>,
}

#[derive(Clone)]
pub struct AnalyticsService {
    repository: Repository,
}

impl AnalyticsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn dashboard(&self) -> AppResult<DashboardStats> {
        let pool = &self.repository.pool;

        let buses = sqlx::query(
            r#"
            SELECT COUNT(*) AS total_buses,
                   COALESCE(SUM(available_seats), 0)::BIGINT AS available_seats,
                   COALESCE(SUM(total_seats), 0)::BIGINT AS total_capacity
            FROM buses
            WHERE is_active = TRUE
            "#,
        )
        .fetch_one(pool)
        .await?;

        let bookings = sqlx::query(
            r#"
            SELECT COUNT(*) AS total_bookings,
                   COUNT(*) FILTER (WHERE payment_status) AS paid_bookings,
                   COALESCE(SUM(fare) FILTER (WHERE payment_status), 0)::BIGINT AS current_revenue
            FROM bookings
            "#,
        )
        .fetch_one(pool)
        .await?;

        let total_bookings: i64 = bookings.get("total_bookings");
        let paid_bookings: i64 = bookings.get("paid_bookings");
        let available_seats: i64 = buses.get("available_seats");
        let total_capacity: i64 = buses.get("total_capacity");

        Ok(DashboardStats {
            total_buses: buses.get("total_buses"),
            total_bookings,
            paid_bookings,
            unpaid_bookings: total_bookings - paid_bookings,
            current_revenue: bookings.get("current_revenue"),
            available_seats,
            total_capacity,
            occupancy_rate: occupancy_rate(total_capacity, available_seats),
        })
    }

    /// Paid revenue per route, highest first
    pub async fn revenue(&self) -> AppResult<RevenueReport> {
        let rows = sqlx::query(
            r#"
            SELECT bus_route,
                   MAX(bus_name) AS bus_name,
                   COALESCE(SUM(fare) FILTER (WHERE payment_status), 0)::BIGINT AS total_revenue,
                   COUNT(*) AS booking_count
            FROM bookings
            GROUP BY bus_route
            ORDER BY total_revenue DESC, bus_route
            "#,
        )
        .fetch_all(&self.repository.pool)
        .await?;

        let routes: Vec<RouteRevenue> = rows
            .into_iter()
            .map(|row| {
                let total_revenue: i64 = row.get("total_revenue");
                let booking_count: i64 = row.get("booking_count");
                RouteRevenue {
                    bus_route: row.get("bus_route"),
                    bus_name: row.get("bus_name"),
                    total_revenue,
                    booking_count,
                    revenue_per_booking: if booking_count > 0 {
                        total_revenue as f64 / booking_count as f64
                    } else {
                        0.0
                    },
                }
            })
            .collect();

        Ok(RevenueReport {
            total_revenue: routes.iter().map(|r| r.total_revenue).sum(),
            routes,
        })
    }

    /// Booking demand per active route, busiest first
    pub async fn routes(&self) -> AppResult<RoutesReport> {
        let rows = sqlx::query(
            r#"
            SELECT b.route_code, b.name, b.is_active, COUNT(bk.id) AS total_bookings
            FROM buses b
            LEFT JOIN bookings bk ON bk.bus_route = b.route_code
            WHERE b.is_active = TRUE
            GROUP BY b.id
            ORDER BY b.name
            "#,
        )
        .fetch_all(&self.repository.pool)
        .await?;

        let total_bookings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
            .fetch_one(&self.repository.pool)
            .await?;

        let mut routes: Vec<RouteDemand> = rows
            .into_iter()
            .map(|row| {
                let count: i64 = row.get("total_bookings");
                let share = percentage(count, total_bookings);
                RouteDemand {
                    route_code: row.get("route_code"),
                    bus_name: row.get("name"),
                    total_bookings: count,
                    booking_percentage: share,
                    demand_level: demand_level(share),
                    is_active: row.get("is_active"),
                }
            })
            .collect();
        routes.sort_by(|a, b| b.total_bookings.cmp(&a.total_bookings));

        Ok(RoutesReport {
            routes,
            total_bookings,
        })
    }

    /// Bookings per destination on one active route
    pub async fn stops(&self, route: &RouteCode) -> AppResult<StopsReport> {
        let bus = self
            .repository
            .buses
            .find_active_by_route(route)
            .await?
            .ok_or_else(|| AppError::NotFound("Invalid or inactive bus route".to_string()))?;

        let rows = sqlx::query(
            r#"
            SELECT destination, COUNT(*) AS booking_count
            FROM bookings
            WHERE bus_route = $1
            GROUP BY destination
            ORDER BY booking_count DESC, destination
            "#,
        )
        .bind(route)
        .fetch_all(&self.repository.pool)
        .await?;

        let counts: Vec<(String, i64)> = rows
            .into_iter()
            .map(|row| (row.get("destination"), row.get("booking_count")))
            .collect();
        let total_route_bookings: i64 = counts.iter().map(|(_, c)| c).sum();

        Ok(StopsReport {
            bus_route: bus.route_code,
            bus_name: bus.name,
            total_route_bookings,
            stops: counts
                .into_iter()
                .map(|(stop_name, booking_count)| StopDemand {
                    stop_name,
                    booking_count,
                    percentage_of_route: percentage(booking_count, total_route_bookings),
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demand_tiers() {
        assert_eq!(demand_level(0), DemandLevel::Low);
        assert_eq!(demand_level(4), DemandLevel::Low);
        assert_eq!(demand_level(5), DemandLevel::Medium);
        assert_eq!(demand_level(14), DemandLevel::Medium);
        assert_eq!(demand_level(15), DemandLevel::High);
        assert_eq!(demand_level(100), DemandLevel::High);
    }

    #[test]
    fn test_percentage_rounds_and_handles_empty_ledger() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(5, 0), 0);
    }

    #[test]
    fn test_occupancy_rate_format() {
        assert_eq!(occupancy_rate(0, 0), "0.0");
        assert_eq!(occupancy_rate(20, 15), "25.0");
        assert_eq!(occupancy_rate(30, 20), "33.3");
    }
}
