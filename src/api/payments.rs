//! Payment gateway endpoints used by the checkout

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    services::payments::PaymentOrder,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    /// Amount in rupees
    #[validate(range(min = 1, message = "Amount must be positive"))]
    pub amount: i64,
    pub currency: Option<String>,
    pub receipt: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order: PaymentOrder,
    pub key_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

#[derive(Serialize, ToSchema)]
pub struct VerifyPaymentResponse {
    pub success: bool,
}

/// Create a gateway order for the fare
#[utoipa::path(
    post,
    path = "/payment/order",
    tag = "payment",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order created", body = CreateOrderResponse),
        (status = 502, description = "Gateway unavailable", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_order(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> AppResult<Json<CreateOrderResponse>> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let currency = request
        .currency
        .unwrap_or_else(|| state.config.payment.currency.clone());
    let receipt = request
        .receipt
        .unwrap_or_else(|| format!("receipt_{}", chrono::Utc::now().timestamp_millis()));

    let order = state
        .services
        .payments
        .create_order(request.amount * 100, &currency, &receipt)
        .await?;
    Ok(Json(CreateOrderResponse {
        order,
        key_id: state.services.payments.key_id(),
    }))
}

/// Verify the checkout signature for an order
#[utoipa::path(
    post,
    path = "/payment/verify",
    tag = "payment",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Signature valid", body = VerifyPaymentResponse),
        (status = 400, description = "Signature invalid", body = crate::error::ErrorResponse)
    )
)]
pub async fn verify_payment(
    State(state): State<crate::AppState>,
    Json(request): Json<VerifyPaymentRequest>,
) -> AppResult<Json<VerifyPaymentResponse>> {
    let valid = state
        .services
        .payments
        .verify_signature(
            &request.razorpay_order_id,
            &request.razorpay_payment_id,
            &request.razorpay_signature,
        )
        .await?;
    if !valid {
        return Err(AppError::Validation("Invalid payment signature".to_string()));
    }
    Ok(Json(VerifyPaymentResponse { success: true }))
}
