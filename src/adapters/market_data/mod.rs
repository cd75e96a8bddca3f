//! Market Data Adapters
//!
//! Price feeds:
//! - `ReplayFeed`: recorded closes from memory or an OHLCV CSV file
//! - `Pi42KlineFeed`: live Pi42 kline polling with window backfill
//!
//! `history` downloads past candles for backtests and the `fetch` command.

pub mod history;
mod pi42_feed;
mod replay;

pub use pi42_feed::Pi42KlineFeed;
pub use replay::{load_csv, parse_timestamp, ReplayFeed};
