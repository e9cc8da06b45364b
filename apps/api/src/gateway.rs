//! # Payment Gateway
//!
//! Opens gateway orders that the storefront's checkout widget then pays.
//! Signature checks for completed payments are pure and live in
//! `harvest_core::signature`.
//!
//! ```text
//! POST /api/orders/create-razorpay-order
//!        │
//!        ▼
//! PaymentGateway::create_order(amount, currency, receipt)
//!        │
//!        ▼  POST {base_url}/v1/orders   (basic auth key_id:key_secret)
//! Razorpay ──► { "id": "order_...", "amount": 12000, "currency": "INR", ... }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use harvest_core::Money;

/// Gateway call timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Payment gateway errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Network failure, timeout, or a body that didn't parse.
    #[error("Gateway request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The gateway answered with a non-2xx status.
    #[error("Gateway rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Gateway client misconfigured: {0}")]
    Config(String),
}

/// An order opened on the gateway side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    /// Amount in paise.
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Creates orders on a payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(
        &self,
        amount: Money,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError>;
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

/// Razorpay Orders API client.
#[derive(Debug, Clone)]
pub struct RazorpayClient {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayClient {
    pub fn new(
        base_url: impl Into<String>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        Ok(RazorpayClient {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            key_id: key_id.into(),
            key_secret: key_secret.into(),
        })
    }
}

#[async_trait]
impl PaymentGateway for RazorpayClient {
    async fn create_order(
        &self,
        amount: Money,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        let url = format!("{}/v1/orders", self.base_url);
        debug!(amount = amount.paise(), currency = %currency, receipt = %receipt, "Creating gateway order");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&CreateOrderBody {
                amount: amount.paise(),
                currency,
                receipt,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!(status, "Gateway rejected order creation");
            return Err(GatewayError::Rejected { status, body });
        }

        let order: GatewayOrder = response.json().await?;
        debug!(gateway_order_id = %order.id, "Gateway order created");
        Ok(order)
    }
}

/// Random receipt reference for a gateway order: 20 lowercase hex chars.
pub fn generate_receipt() -> String {
    Uuid::new_v4().simple().to_string()[..20].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_receipt_format() {
        let receipt = generate_receipt();
        assert_eq!(receipt.len(), 20);
        assert!(receipt.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(receipt, generate_receipt());
    }

    #[tokio::test]
    async fn test_create_order_posts_to_orders_api() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/orders"))
            .and(header_exists("authorization"))
            .and(body_json(json!({
                "amount": 12000,
                "currency": "INR",
                "receipt": "abc123"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "order_9A33XWu170gUtm",
                "entity": "order",
                "amount": 12000,
                "currency": "INR",
                "receipt": "abc123",
                "status": "created"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = RazorpayClient::new(server.uri(), "rzp_test", "secret").unwrap();
        let order = client
            .create_order(Money::from_paise(12000), "INR", "abc123")
            .await
            .unwrap();

        assert_eq!(order.id, "order_9A33XWu170gUtm");
        assert_eq!(order.amount, 12000);
        assert_eq!(order.status.as_deref(), Some("created"));
    }

    #[tokio::test]
    async fn test_create_order_surfaces_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/orders"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Authentication failed"))
            .mount(&server)
            .await;

        let client = RazorpayClient::new(server.uri(), "bad", "bad").unwrap();
        let err = client
            .create_order(Money::from_paise(100), "INR", "r")
            .await
            .unwrap_err();

        match err {
            GatewayError::Rejected { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "Authentication failed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
