use serde::{Deserialize, Serialize};

/// How much capital a BUY commits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SizingMode {
    /// Commit a fixed currency amount per entry. Allows scaling in.
    FixedAmount { amount: f64 },
    /// Commit a fraction of the current balance per entry. Enters from flat only.
    FractionOfBalance { fraction: f64 },
}

impl SizingMode {
    /// Currency committed by the next entry given the current balance
    pub fn budget(&self, balance: f64) -> f64 {
        match *self {
            SizingMode::FixedAmount { amount } => amount,
            SizingMode::FractionOfBalance { fraction } => balance * fraction,
        }
    }

    /// Fixed-amount sizing is the "risk-managed" mode of the signal policies
    pub fn is_risk_managed(&self) -> bool {
        matches!(self, SizingMode::FixedAmount { .. })
    }
}

/// Cash and single-position state owned by the position manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    pub(crate) balance: f64,
    pub(crate) position: f64,
    pub(crate) entry_price: f64,
    sizing: SizingMode,
    initial_balance: f64,
}

impl PortfolioState {
    pub fn new(initial_balance: f64, sizing: SizingMode) -> Self {
        Self {
            balance: initial_balance,
            position: 0.0,
            entry_price: 0.0,
            sizing,
            initial_balance,
        }
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// Units of the asset currently held
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Size-weighted entry price of the open position, 0 when flat
    pub fn entry_price(&self) -> f64 {
        self.entry_price
    }

    pub fn sizing(&self) -> SizingMode {
        self.sizing
    }

    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    pub fn is_flat(&self) -> bool {
        self.position <= 0.0
    }

    pub fn is_long(&self) -> bool {
        self.position > 0.0
    }

    /// Mark-to-market value of cash plus holdings
    pub fn equity(&self, price: f64) -> f64 {
        self.balance + self.position * price
    }

    /// Running profit/loss against the starting balance
    pub fn running_pnl(&self, price: f64) -> f64 {
        self.equity(price) - self.initial_balance
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        if self.is_flat() {
            return 0.0;
        }
        (price - self.entry_price) * self.position
    }
}
