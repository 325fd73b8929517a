//! Payment gateway client.
//!
//! The checkout flow needs exactly one outbound call: creating a gateway
//! order for the frozen total. Payment confirmation arrives later from the
//! browser and is checked locally by signature, not by calling back.
//!
//! ```text
//! POST {base_url}/v1/orders   (basic auth key_id:key_secret)
//! { "amount": 27797, "currency": "INR", "receipt": "ES-20250101-AB12CD" }
//!   ──► { "id": "order_N3b...", "amount": 27797, "currency": "INR", ... }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use estamp_core::Money;

use crate::config::GatewayConfig;

/// Gateway order created for a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayOrder {
    pub id: String,
    pub amount: Money,
    pub currency: String,
}

/// Creates payment orders with an external gateway.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a gateway order for `amount`, tagged with our `receipt`.
    async fn create_order(&self, amount: Money, receipt: &str) -> Result<GatewayOrder, GatewayError>;
}

/// Razorpay-style orders API over HTTPS.
#[derive(Debug, Clone)]
pub struct RazorpayGateway {
    config: GatewayConfig,
    http: Client,
}

impl RazorpayGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, http })
    }
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    id: String,
    amount: i64,
    currency: String,
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(&self, amount: Money, receipt: &str) -> Result<GatewayOrder, GatewayError> {
        let url = format!("{}/v1/orders", self.config.base_url.trim_end_matches('/'));

        debug!(receipt = %receipt, amount = amount.paise(), "Creating gateway order");

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&CreateOrderRequest {
                amount: amount.paise(),
                currency: &self.config.currency,
                receipt,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(GatewayError::UnexpectedResponse(format!(
                "create order failed with status {status}: {text}"
            )));
        }

        let parsed: CreateOrderResponse = response.json().await?;

        if parsed.amount != amount.paise() {
            return Err(GatewayError::UnexpectedResponse(format!(
                "gateway order {} is for {} paise, requested {}",
                parsed.id,
                parsed.amount,
                amount.paise()
            )));
        }

        info!(receipt = %receipt, gateway_order_id = %parsed.id, "Gateway order created");

        Ok(GatewayOrder {
            id: parsed.id,
            amount: Money::from_paise(parsed.amount),
            currency: parsed.currency,
        })
    }
}

/// Errors that can occur when talking to the payment gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway returned a non-2xx response or an unexpected body.
    #[error("unexpected response from gateway: {0}")]
    UnexpectedResponse(String),
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;
    use testresult::TestResult;

    use super::*;

    /// Serves one canned response on a local port.
    ///
    /// Returns the base URL and a handle yielding the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> TestResult<(String, JoinHandle<String>)> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base_url = format!("http://{}", listener.local_addr()?);

        let handle = tokio::spawn(async move {
            let Ok((mut stream, _)) = listener.accept().await else {
                return String::new();
            };

            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = stream.read(&mut buf).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;

            String::from_utf8_lossy(&request).into_owned()
        });

        Ok((base_url, handle))
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };

        let length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        body.len() >= length
    }

    fn gateway(base_url: String) -> TestResult<RazorpayGateway> {
        Ok(RazorpayGateway::new(GatewayConfig {
            base_url,
            key_id: "rzp_test_key".to_string(),
            key_secret: "rzp_test_secret".to_string(),
            currency: "INR".to_string(),
            timeout_secs: 5,
        })?)
    }

    #[tokio::test]
    async fn test_create_order_sends_total_and_receipt() -> TestResult {
        let (base_url, server) =
            serve_once("200 OK", r#"{"id":"order_N3b","amount":27797,"currency":"INR","status":"created"}"#).await?;

        let order = gateway(base_url)?
            .create_order(Money::from_paise(27797), "ES-20250101-AB12CD")
            .await?;

        assert_eq!(order.id, "order_N3b");
        assert_eq!(order.amount.paise(), 27797);

        let request = server.await?;
        assert!(request.starts_with("POST /v1/orders "));
        assert!(request.to_ascii_lowercase().contains("authorization: basic "));
        assert!(request.contains(r#""receipt":"ES-20250101-AB12CD""#));
        assert!(request.contains(r#""amount":27797"#));
        Ok(())
    }

    #[tokio::test]
    async fn test_amount_mismatch_is_rejected() -> TestResult {
        let (base_url, _server) =
            serve_once("200 OK", r#"{"id":"order_N3b","amount":100,"currency":"INR"}"#).await?;

        let err = gateway(base_url)?
            .create_order(Money::from_paise(27797), "ES-20250101-AB12CD")
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::UnexpectedResponse(ref msg) if msg.contains("100 paise")));
        Ok(())
    }

    #[tokio::test]
    async fn test_non_success_status_is_rejected() -> TestResult {
        let (base_url, _server) = serve_once(
            "401 Unauthorized",
            r#"{"error":{"code":"BAD_REQUEST_ERROR","description":"Authentication failed"}}"#,
        )
        .await?;

        let err = gateway(base_url)?
            .create_order(Money::from_paise(27797), "ES-20250101-AB12CD")
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::UnexpectedResponse(ref msg)
            if msg.contains("401") && msg.contains("Authentication failed")));
        Ok(())
    }
}
