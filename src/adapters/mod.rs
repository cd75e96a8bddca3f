//! Adapters
//!
//! Concrete implementations of the ports plus the CLI:
//! - `pi42`: kline client, request signing and order client
//! - `market_data`: replay, live Pi42 and historical feeds
//! - `execution`: paper execution
//! - `records`: CSV and in-memory trade record sinks
//! - `cli`: clap command definitions and handlers

pub mod cli;
pub mod execution;
pub mod market_data;
pub mod pi42;
pub mod records;
