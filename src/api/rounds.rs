//! Booking round endpoints: reset, history and seat reconciliation

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, models::BookingRound, repository::seats::SeatCorrection};

use super::{AuthenticatedAdmin, DataResponse};

#[derive(Serialize, ToSchema)]
pub struct ResetResponse {
    pub message: String,
    pub round: BookingRound,
}

#[derive(Serialize, ToSchema)]
pub struct ReconcileResponse {
    pub corrected: usize,
    pub corrections: Vec<SeatCorrection>,
}

/// Archive the live round, clear bookings and refill every active bus
#[utoipa::path(
    post,
    path = "/admin/reset",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Round reset, wrapped in {success, data}", body = ResetResponse)
    )
)]
pub async fn reset_round(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(claims): AuthenticatedAdmin,
) -> AppResult<Json<DataResponse<ResetResponse>>> {
    tracing::info!(admin = %claims.sub, "booking round reset requested");
    let round = state.services.rounds.reset_round().await?;
    Ok(Json(DataResponse::new(ResetResponse {
        message: format!(
            "Booking round archived with {} bookings; all seats restored",
            round.total_bookings
        ),
        round,
    })))
}

/// Archived rounds, newest first
#[utoipa::path(
    get,
    path = "/admin/reports/rounds",
    tag = "reports",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Round history, wrapped in {success, data}", body = [BookingRound])
    )
)]
pub async fn round_history(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
) -> AppResult<Json<DataResponse<Vec<BookingRound>>>> {
    let rounds = state.services.rounds.history().await?;
    Ok(Json(DataResponse::new(rounds)))
}

/// Recompute drifted seat counters from the live ledger
#[utoipa::path(
    post,
    path = "/admin/reconcile",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Corrected counters, wrapped in {success, data}", body = ReconcileResponse)
    )
)]
pub async fn reconcile(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(_claims): AuthenticatedAdmin,
) -> AppResult<Json<DataResponse<ReconcileResponse>>> {
    let corrections = state.services.rounds.reconcile().await?;
    Ok(Json(DataResponse::new(ReconcileResponse {
        corrected: corrections.len(),
        corrections,
    })))
}
