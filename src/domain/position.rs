//! Position Manager
//!
//! Two-state machine over the portfolio: FLAT (`position == 0`) and
//! LONG (`position > 0`). There is no short side.
//!
//! | state | signal | effect                                        |
//! |-------|--------|-----------------------------------------------|
//! | FLAT  | BUY    | enter, commit the risk budget                 |
//! | LONG  | BUY    | scale in (fixed amount only), blend entry     |
//! | LONG  | SELL   | exit the whole position, realise P/L          |
//! | *     | *      | no trade                                      |

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::portfolio::{PortfolioState, SizingMode};
use super::signal::Signal;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PositionError {
    #[error("Insufficient balance: need {required:.4}, have {available:.4}")]
    InsufficientBalance { required: f64, available: f64 },
    #[error("Invalid price: {0}")]
    InvalidPrice(f64),
}

/// Outcome of applying one signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionResult {
    /// FLAT -> LONG
    Entered { size: f64, cost: f64 },
    /// LONG -> LONG with a larger, re-averaged position
    ScaledIn { size: f64, cost: f64, entry_price: f64 },
    /// LONG -> FLAT
    Exited { size: f64, proceeds: f64, profit_loss: f64 },
    NoTrade,
}

impl TransitionResult {
    pub fn is_trade(&self) -> bool {
        !matches!(self, TransitionResult::NoTrade)
    }

    pub fn profit_loss(&self) -> Option<f64> {
        match self {
            TransitionResult::Exited { profit_loss, .. } => Some(*profit_loss),
            _ => None,
        }
    }
}

/// Sole owner of [`PortfolioState`]; balance and position only change here.
#[derive(Debug, Clone)]
pub struct PositionManager {
    state: PortfolioState,
    entries: u32,
    exits: u32,
    rejected: u32,
}

impl PositionManager {
    pub fn new(initial_balance: f64, sizing: SizingMode) -> Self {
        Self {
            state: PortfolioState::new(initial_balance, sizing),
            entries: 0,
            exits: 0,
            rejected: 0,
        }
    }

    pub fn state(&self) -> &PortfolioState {
        &self.state
    }

    /// Entries plus scale-ins
    pub fn entry_count(&self) -> u32 {
        self.entries
    }

    pub fn exit_count(&self) -> u32 {
        self.exits
    }

    /// BUYs refused for lack of balance
    pub fn rejected_count(&self) -> u32 {
        self.rejected
    }

    /// Apply a signal at `price`. Errors leave the state untouched.
    pub fn apply(&mut self, signal: Signal, price: f64) -> Result<TransitionResult, PositionError> {
        if !price.is_finite() || price <= 0.0 {
            return Err(PositionError::InvalidPrice(price));
        }

        let result = match (signal, self.state.is_long()) {
            (Signal::Buy, false) => self.enter(price),
            (Signal::Buy, true) => self.scale_in(price),
            (Signal::Sell, true) => Ok(self.exit(price)),
            _ => Ok(TransitionResult::NoTrade),
        };

        match &result {
            Ok(TransitionResult::Entered { .. }) | Ok(TransitionResult::ScaledIn { .. }) => {
                self.entries += 1
            }
            Ok(TransitionResult::Exited { .. }) => self.exits += 1,
            Err(PositionError::InsufficientBalance { .. }) => self.rejected += 1,
            _ => {}
        }

        result
    }

    fn enter(&mut self, price: f64) -> Result<TransitionResult, PositionError> {
        let balance = self.state.balance;
        let budget = self.state.sizing().budget(balance);

        let cost = match self.state.sizing() {
            SizingMode::FixedAmount { .. } => {
                if balance - budget < 0.0 {
                    return Err(PositionError::InsufficientBalance {
                        required: budget,
                        available: balance,
                    });
                }
                budget
            }
            SizingMode::FractionOfBalance { .. } => {
                if budget <= 0.0 {
                    return Err(PositionError::InsufficientBalance {
                        required: budget,
                        available: balance,
                    });
                }
                // size * price may round a hair above the budget
                ((budget / price) * price).min(balance)
            }
        };

        let size = budget / price;
        self.state.position += size;
        self.state.entry_price = price;
        self.state.balance -= cost;

        Ok(TransitionResult::Entered { size, cost })
    }

    fn scale_in(&mut self, price: f64) -> Result<TransitionResult, PositionError> {
        let amount = match self.state.sizing() {
            SizingMode::FixedAmount { amount } => amount,
            SizingMode::FractionOfBalance { .. } => return Ok(TransitionResult::NoTrade),
        };

        let balance = self.state.balance;
        if balance - amount < 0.0 {
            return Err(PositionError::InsufficientBalance {
                required: amount,
                available: balance,
            });
        }

        let size = amount / price;
        let prior = self.state.position;
        let blended = (prior * self.state.entry_price + size * price) / (prior + size);

        self.state.position = prior + size;
        self.state.entry_price = blended;
        self.state.balance -= amount;

        Ok(TransitionResult::ScaledIn {
            size,
            cost: amount,
            entry_price: blended,
        })
    }

    fn exit(&mut self, price: f64) -> TransitionResult {
        let size = self.state.position;
        let proceeds = size * price;
        let profit_loss = proceeds - size * self.state.entry_price;

        self.state.balance += proceeds;
        self.state.position = 0.0;
        self.state.entry_price = 0.0;

        TransitionResult::Exited {
            size,
            proceeds,
            profit_loss,
        }
    }
}
