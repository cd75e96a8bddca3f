use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("API request failed: {0}")]
    ApiError(String),
    #[error("Request signing failed: {0}")]
    SigningError(String),
    #[error("Order rejected: {0}")]
    Rejected(String),
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Market,
    Limit,
    StopMarket,
    StopLimit,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
            OrderType::StopMarket => "STOP_MARKET",
            OrderType::StopLimit => "STOP_LIMIT",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: f64,
    pub margin_asset: String,
    pub order_type: OrderType,
}

/// Broker acknowledgement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Order placement against the broker.
///
/// Called once per LONG entry (`place_order`) and once per LONG exit
/// (`close_all_positions`).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExecutionPort: Send + Sync {
    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, ExecutionError>;

    async fn close_all_positions(&self) -> Result<OrderAck, ExecutionError>;
}
