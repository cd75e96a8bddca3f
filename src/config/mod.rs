//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    Config, ConfigError, ExecutionSection, FeedSection, LoggingSection, RecordsSection,
    RiskSection, SizingModeName, StrategySection, load_config,
};
