//! Pi42 API Types
//!
//! Request and response shapes for the market and order endpoints. Pi42
//! returns most numbers as JSON strings, so numeric fields accept both.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::PriceObservation;
use crate::ports::{FeedError, OrderRequest, OrderSide, OrderType};

/// Body of `POST /v1/market/klines`
#[derive(Debug, Clone, Serialize)]
pub struct KlineRequest<'a> {
    pub pair: &'a str,
    pub interval: &'a str,
    pub limit: usize,
}

/// One candle as returned by Pi42
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kline {
    #[serde(deserialize_with = "millis")]
    pub start_time: i64,
    #[serde(deserialize_with = "number")]
    pub open: f64,
    #[serde(deserialize_with = "number")]
    pub high: f64,
    #[serde(deserialize_with = "number")]
    pub low: f64,
    #[serde(deserialize_with = "number")]
    pub close: f64,
    #[serde(deserialize_with = "millis")]
    pub end_time: i64,
    #[serde(deserialize_with = "number")]
    pub volume: f64,
}

impl Kline {
    pub fn close_time(&self) -> Result<DateTime<Utc>, FeedError> {
        Utc.timestamp_millis_opt(self.end_time)
            .single()
            .ok_or_else(|| FeedError::Parse(format!("invalid kline end time: {}", self.end_time)))
    }

    pub fn open_time(&self) -> Result<DateTime<Utc>, FeedError> {
        Utc.timestamp_millis_opt(self.start_time)
            .single()
            .ok_or_else(|| FeedError::Parse(format!("invalid kline start time: {}", self.start_time)))
    }

    /// Closing price stamped with the candle close
    pub fn to_observation(&self) -> Result<PriceObservation, FeedError> {
        Ok(PriceObservation::new(self.close_time()?, self.close))
    }
}

/// Body of `POST /v1/order/place-order`.
///
/// Field order is the signed byte order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderBody {
    pub timestamp: String,
    pub place_type: &'static str,
    pub quantity: f64,
    pub side: OrderSide,
    pub symbol: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub reduce_only: bool,
    pub margin_asset: String,
    pub device_type: &'static str,
    pub user_category: &'static str,
}

impl PlaceOrderBody {
    pub fn new(order: &OrderRequest, timestamp: String) -> Self {
        Self {
            timestamp,
            place_type: "ORDER_FORM",
            quantity: order.quantity,
            side: order.side,
            symbol: order.symbol.clone(),
            order_type: order.order_type,
            reduce_only: false,
            margin_asset: order.margin_asset.clone(),
            device_type: "WEB",
            user_category: "EXTERNAL",
        }
    }
}

/// Body of `DELETE /v1/positions/close-all-positions`
#[derive(Debug, Clone, Serialize)]
pub struct TimestampBody {
    pub timestamp: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Int(i64),
    Float(f64),
    Text(String),
}

fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Int(n) => Ok(n as f64),
        NumberOrString::Float(n) => Ok(n),
        NumberOrString::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Int(n) => Ok(n),
        NumberOrString::Float(n) => Ok(n as i64),
        NumberOrString::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
