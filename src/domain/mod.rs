//! Domain Layer - Core types for the maxwell bot
//!
//! Pure data and state machines with no I/O. Everything that talks to the
//! outside world goes through the ports layer.

pub mod observation;
pub mod portfolio;
pub mod position;
pub mod signal;
pub mod snapshot;
pub mod trade;

pub use observation::PriceObservation;
pub use portfolio::{PortfolioState, SizingMode};
pub use position::{PositionError, PositionManager, TransitionResult};
pub use signal::Signal;
pub use snapshot::StatisticsSnapshot;
pub use trade::{ExecutionStatus, TradeOutcome, TradeRecord};
