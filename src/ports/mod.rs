//! Ports Layer - Trait definitions for external collaborators
//!
//! Following hexagonal architecture, these traits abstract:
//! - Price feeds (live polling, historical replay)
//! - Order execution (exchange or paper)
//! - Trade record persistence

pub mod execution;
pub mod market_data;
#[cfg(test)]
pub mod mocks;
pub mod record_sink;

pub use execution::{ExecutionError, ExecutionPort, OrderAck, OrderRequest, OrderSide, OrderType};
pub use market_data::{FeedError, PriceFeed};
pub use record_sink::{RecordSink, SinkError};
