//! Maxwell - Rolling-Moment Mean Reversion Trading Bot Library
//!
//! Streams closing prices through rolling statistics (mean, standard
//! deviation, z-score, skewness, kurtosis), turns them into BUY / SELL / HOLD
//! signals and manages one risk-budgeted long position.
//!
//! # Modules
//!
//! - `domain`: Core state (PriceObservation, PortfolioState, PositionManager, TradeRecord)
//! - `ports`: Trait abstractions (PriceFeed, ExecutionPort, RecordSink)
//! - `strategy`: Rolling statistics and signal generation
//! - `adapters`: External implementations (Pi42, replay, paper execution, CSV, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Strategy loop and backtest reporting

pub mod domain;
pub mod ports;
pub mod strategy;
pub mod adapters;
pub mod config;
pub mod application;
