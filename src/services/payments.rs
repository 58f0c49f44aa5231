//! Payment gateway boundary (Razorpay)

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use utoipa::ToSchema;

use crate::{
    config::PaymentConfig,
    error::{AppError, AppResult},
};

type HmacSha256 = Hmac<Sha256>;

/// Order as returned by the gateway
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentOrder {
    pub id: String,
    /// Amount in paise
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
}

#[derive(Debug, Serialize)]
struct OrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a gateway order for `amount_paise`
    async fn create_order(
        &self,
        amount_paise: i64,
        currency: &str,
        receipt: &str,
    ) -> AppResult<PaymentOrder>;

    /// Check the signature the checkout returned for an order/payment pair
    async fn verify_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> AppResult<bool>;

    /// Public key id handed to the checkout widget
    fn key_id(&self) -> String;
}

#[derive(Clone)]
pub struct RazorpayGateway {
    client: Client,
    config: PaymentConfig,
}

impl RazorpayGateway {
    pub fn new(config: PaymentConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn configured(&self) -> AppResult<()> {
        if self.config.razorpay_key_id.is_empty() || self.config.razorpay_key_secret.is_empty() {
            return Err(AppError::PaymentGateway(
                "Payment gateway is not configured".to_string(),
            ));
        }
        Ok(())
    }
}

/// Hex HMAC-SHA256 of `"{order_id}|{payment_id}"`
pub fn expected_signature(secret: &str, order_id: &str, payment_id: &str) -> AppResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("Invalid payment secret: {}", e)))?;
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(
        &self,
        amount_paise: i64,
        currency: &str,
        receipt: &str,
    ) -> AppResult<PaymentOrder> {
        self.configured()?;
        if amount_paise <= 0 {
            return Err(AppError::Validation("Amount must be positive".to_string()));
        }

        let response = self
            .client
            .post(format!("{}/orders", self.config.api_url.trim_end_matches('/')))
            .basic_auth(&self.config.razorpay_key_id, Some(&self.config.razorpay_key_secret))
            .json(&OrderRequest {
                amount: amount_paise,
                currency,
                receipt,
            })
            .send()
            .await
            .map_err(|e| AppError::PaymentGateway(format!("Order request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::PaymentGateway(format!(
                "Order creation rejected ({}): {}",
                status, body
            )));
        }

        let order = response
            .json::<PaymentOrder>()
            .await
            .map_err(|e| AppError::PaymentGateway(format!("Invalid order response: {}", e)))?;
        tracing::info!(order_id = %order.id, amount = order.amount, "payment order created");
        Ok(order)
    }

    async fn verify_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> AppResult<bool> {
        self.configured()?;
        let Ok(provided) = hex::decode(signature.trim()) else {
            return Ok(false);
        };
        let mut mac = HmacSha256::new_from_slice(self.config.razorpay_key_secret.as_bytes())
            .map_err(|e| AppError::Internal(format!("Invalid payment secret: {}", e)))?;
        mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
        Ok(mac.verify_slice(&provided).is_ok())
    }

    fn key_id(&self) -> String {
        self.config.razorpay_key_id.clone()
    }
}
