//! Pi42 API Client
//!
//! Public market data (klines) and signed order endpoints. One HTTP client
//! per instance, carrying the request timeout.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde_json::Value;

use super::auth::{timestamp_ms, Credentials};
use super::types::{Kline, KlineRequest, PlaceOrderBody, TimestampBody};
use crate::ports::{ExecutionError, ExecutionPort, FeedError, OrderAck, OrderRequest};

/// Pi42 client configuration
#[derive(Debug, Clone)]
pub struct Pi42Config {
    /// Public market data host
    pub market_url: String,
    /// Private trading host
    pub trading_url: String,
    pub timeout: Duration,
}

impl Default for Pi42Config {
    fn default() -> Self {
        Self {
            market_url: "https://api.pi42.com".to_string(),
            trading_url: "https://fapi.pi42.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Market data client. No credentials needed.
#[derive(Debug, Clone)]
pub struct Pi42Client {
    config: Pi42Config,
    http: Client,
}

impl Pi42Client {
    pub fn new(config: Pi42Config) -> Result<Self, FeedError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FeedError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    /// Latest `limit` candles for `pair`, oldest first
    pub async fn fetch_klines(
        &self,
        pair: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Kline>, FeedError> {
        let url = format!("{}/v1/market/klines", self.config.market_url);
        let body = KlineRequest { pair, interval, limit };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FeedError::Timeout(self.config.timeout)
                } else {
                    FeedError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(FeedError::Http(format!("klines {}: {}", status, text)));
        }

        let mut klines: Vec<Kline> = response
            .json()
            .await
            .map_err(|e| FeedError::Parse(format!("Failed to parse klines: {}", e)))?;

        klines.sort_by_key(|k| k.end_time);
        Ok(klines)
    }

    pub fn market_url(&self) -> &str {
        &self.config.market_url
    }
}

/// Signed order client for the Pi42 futures API
#[derive(Debug, Clone)]
pub struct Pi42OrderClient {
    config: Pi42Config,
    credentials: Credentials,
    http: Client,
}

impl Pi42OrderClient {
    pub fn new(config: Pi42Config, credentials: Credentials) -> Result<Self, ExecutionError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ExecutionError::ApiError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            credentials,
            http,
        })
    }

    /// Serialize, sign and send. The signed bytes are the sent bytes.
    async fn send_signed<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Value, ExecutionError> {
        let payload = serde_json::to_string(body)
            .map_err(|e| ExecutionError::InvalidParameters(e.to_string()))?;
        let signature = self.credentials.sign(&payload)?;
        let url = format!("{}{}", self.config.trading_url, path);

        tracing::debug!("{} {} {}", method, url, payload);

        let response = self
            .http
            .request(method, &url)
            .header("api-key", self.credentials.api_key())
            .header("signature", signature)
            .header("Content-Type", "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| ExecutionError::ApiError(e.to_string()))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
            return Err(ExecutionError::Rejected(format!("{}: {}", status, text)));
        }
        if !status.is_success() {
            return Err(ExecutionError::ApiError(format!("{}: {}", status, text)));
        }

        serde_json::from_str(&text)
            .map_err(|e| ExecutionError::ApiError(format!("Failed to parse response: {}", e)))
    }
}

/// Pull an order id out of whatever shape the broker answered with
pub(crate) fn ack_from_response(value: &Value) -> OrderAck {
    let field = |v: &Value, keys: &[&str]| {
        keys.iter().find_map(|k| match v.get(*k) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    };

    let target = value.get("data").filter(|d| d.is_object()).unwrap_or(value);

    OrderAck {
        order_id: field(target, &["clientOrderId", "orderId", "id"])
            .unwrap_or_else(|| "unknown".to_string()),
        status: field(target, &["status", "message"]),
    }
}

#[async_trait]
impl ExecutionPort for Pi42OrderClient {
    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, ExecutionError> {
        if !order.quantity.is_finite() || order.quantity <= 0.0 {
            return Err(ExecutionError::InvalidParameters(format!(
                "quantity must be positive, got {}",
                order.quantity
            )));
        }

        let body = PlaceOrderBody::new(order, timestamp_ms());
        let response = self
            .send_signed(Method::POST, "/v1/order/place-order", &body)
            .await?;

        let ack = ack_from_response(&response);
        tracing::info!(
            "Placed {:?} {} {} on Pi42: {}",
            order.side, order.quantity, order.symbol, ack.order_id
        );
        Ok(ack)
    }

    async fn close_all_positions(&self) -> Result<OrderAck, ExecutionError> {
        let body = TimestampBody {
            timestamp: timestamp_ms(),
        };
        let response = self
            .send_signed(Method::DELETE, "/v1/positions/close-all-positions", &body)
            .await?;

        let ack = ack_from_response(&response);
        tracing::info!("Closed all Pi42 positions: {}", ack.order_id);
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{OrderSide, OrderType};
    use serde_json::json;

    #[test]
    fn test_default_hosts() {
        let config = Pi42Config::default();
        assert_eq!(config.market_url, "https://api.pi42.com");
        assert_eq!(config.trading_url, "https://fapi.pi42.com");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_client_creation() {
        let client = Pi42Client::new(Pi42Config::default()).unwrap();
        assert_eq!(client.market_url(), "https://api.pi42.com");
    }

    #[test]
    fn test_ack_from_flat_response() {
        let ack = ack_from_response(&json!({"clientOrderId": "abc-1", "status": "NEW"}));
        assert_eq!(ack.order_id, "abc-1");
        assert_eq!(ack.status.as_deref(), Some("NEW"));
    }

    #[test]
    fn test_ack_from_nested_numeric_id() {
        let ack = ack_from_response(&json!({"data": {"id": 42}}));
        assert_eq!(ack.order_id, "42");
        assert_eq!(ack.status, None);
    }

    #[test]
    fn test_ack_without_id() {
        let ack = ack_from_response(&json!([]));
        assert_eq!(ack.order_id, "unknown");
    }

    #[tokio::test]
    async fn test_rejects_non_positive_quantity_before_sending() {
        let client = Pi42OrderClient::new(
            Pi42Config {
                trading_url: "http://127.0.0.1:9".to_string(),
                ..Pi42Config::default()
            },
            Credentials::new("k", "s"),
        )
        .unwrap();

        let order = OrderRequest {
            symbol: "ETHINR".into(),
            side: OrderSide::Buy,
            quantity: 0.0,
            margin_asset: "INR".into(),
            order_type: OrderType::Market,
        };
        assert!(matches!(
            client.place_order(&order).await,
            Err(ExecutionError::InvalidParameters(_))
        ));
    }
}
