use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::position::TransitionResult;
use super::signal::Signal;
use super::snapshot::StatisticsSnapshot;

/// What the position manager did with the signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeOutcome {
    Entered,
    ScaledIn,
    Exited,
    NoTrade,
    /// BUY refused for lack of balance; behaves as HOLD
    Rejected,
}

impl From<&TransitionResult> for TradeOutcome {
    fn from(result: &TransitionResult) -> Self {
        match result {
            TransitionResult::Entered { .. } => TradeOutcome::Entered,
            TransitionResult::ScaledIn { .. } => TradeOutcome::ScaledIn,
            TransitionResult::Exited { .. } => TradeOutcome::Exited,
            TransitionResult::NoTrade => TradeOutcome::NoTrade,
        }
    }
}

impl fmt::Display for TradeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradeOutcome::Entered => "entered",
            TradeOutcome::ScaledIn => "scaled_in",
            TradeOutcome::Exited => "exited",
            TradeOutcome::NoTrade => "no_trade",
            TradeOutcome::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Broker-side result of the order call attached to a local transition.
///
/// `Failed` means the local books moved but the broker did not follow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ExecutionStatus {
    NotRequired,
    Confirmed(String),
    Failed(String),
}

impl ExecutionStatus {
    pub fn is_divergent(&self) -> bool {
        matches!(self, ExecutionStatus::Failed(_))
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStatus::NotRequired => write!(f, "-"),
            ExecutionStatus::Confirmed(id) => write!(f, "ok:{}", id),
            ExecutionStatus::Failed(reason) => write!(f, "failed:{}", reason),
        }
    }
}

/// One line of the decision log, emitted once per processed observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub signal: Signal,
    pub outcome: TradeOutcome,
    pub execution: ExecutionStatus,
    pub balance_after: f64,
    pub position_after: f64,
    /// Realised P/L, set on exits only
    pub profit_loss: Option<f64>,
    /// `balance + position * price - initial_balance`
    pub running_pnl: f64,
    pub stats: StatisticsSnapshot,
}

impl TradeRecord {
    pub fn is_divergent(&self) -> bool {
        self.execution.is_divergent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_transition() {
        let entered = TransitionResult::Entered { size: 1.0, cost: 10.0 };
        let exited = TransitionResult::Exited { size: 1.0, proceeds: 11.0, profit_loss: 1.0 };
        assert_eq!(TradeOutcome::from(&entered), TradeOutcome::Entered);
        assert_eq!(TradeOutcome::from(&exited), TradeOutcome::Exited);
        assert_eq!(TradeOutcome::from(&TransitionResult::NoTrade), TradeOutcome::NoTrade);
    }

    #[test]
    fn test_execution_status_display() {
        assert_eq!(ExecutionStatus::NotRequired.to_string(), "-");
        assert_eq!(ExecutionStatus::Confirmed("42".into()).to_string(), "ok:42");
        assert_eq!(ExecutionStatus::Failed("timeout".into()).to_string(), "failed:timeout");
        assert!(ExecutionStatus::Failed("x".into()).is_divergent());
        assert!(!ExecutionStatus::Confirmed("x".into()).is_divergent());
    }
}
