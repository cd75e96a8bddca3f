//! Pi42 Adapter
//!
//! INR-margined futures exchange: kline polling for the live feed and
//! signed order placement for execution.

pub mod auth;
mod client;
mod types;

pub use auth::Credentials;
pub use client::{Pi42Client, Pi42Config, Pi42OrderClient};
pub use types::Kline;
