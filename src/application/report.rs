//! Backtest Summary
//!
//! End-of-run figures, marked to the last seen price.

use serde::Serialize;
use std::fmt;

use crate::application::orchestrator::LoopCounters;
use crate::domain::PortfolioState;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestSummary {
    pub initial_balance: f64,
    pub final_balance: f64,
    pub final_position: f64,
    pub first_price: Option<f64>,
    pub last_price: Option<f64>,
    /// Balance plus open position at the last price, minus initial balance
    pub total_pnl: f64,
    pub return_pct: f64,
    /// Price change over the run, in percent
    pub buy_and_hold_pct: Option<f64>,
    /// P/L per unit of underlying price move, in percent. Undefined for a
    /// flat market.
    pub alpha: Option<f64>,
    pub entries: u32,
    pub exits: u32,
    pub rejected_buys: u32,
    pub records: u64,
    pub divergences: u64,
}

impl BacktestSummary {
    pub fn new(
        state: &PortfolioState,
        first_price: Option<f64>,
        last_price: Option<f64>,
        entries: u32,
        exits: u32,
        rejected_buys: u32,
        counters: LoopCounters,
    ) -> Self {
        let initial_balance = state.initial_balance();
        let total_pnl = match last_price {
            Some(price) => state.running_pnl(price),
            None => state.balance() - initial_balance,
        };

        let price_move = match (first_price, last_price) {
            (Some(first), Some(last)) => Some(last - first),
            _ => None,
        };
        let buy_and_hold_pct = match (price_move, first_price) {
            (Some(delta), Some(first)) if first != 0.0 => Some(delta / first * 100.0),
            _ => None,
        };
        let alpha = price_move
            .filter(|delta| *delta != 0.0)
            .map(|delta| total_pnl / delta * 100.0);

        Self {
            initial_balance,
            final_balance: state.balance(),
            final_position: state.position(),
            first_price,
            last_price,
            total_pnl,
            return_pct: total_pnl / initial_balance * 100.0,
            buy_and_hold_pct,
            alpha,
            entries,
            exits,
            rejected_buys,
            records: counters.processed,
            divergences: counters.divergences,
        }
    }
}

impl fmt::Display for BacktestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let opt = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{:.4}", v));

        writeln!(f, "======================================")?;
        writeln!(f, "          Backtest Summary")?;
        writeln!(f, "======================================")?;
        writeln!(f, "  Initial Balance:  {:.4}", self.initial_balance)?;
        writeln!(f, "  Final Balance:    {:.4}", self.final_balance)?;
        writeln!(f, "  Open Position:    {:.6}", self.final_position)?;
        writeln!(f, "  First / Last:     {} / {}", opt(self.first_price), opt(self.last_price))?;
        writeln!(f, "  Total P/L:        {:.4} ({:.4}%)", self.total_pnl, self.return_pct)?;
        writeln!(f, "  Buy & Hold:       {}%", opt(self.buy_and_hold_pct))?;
        writeln!(f, "  Alpha:            {}%", opt(self.alpha))?;
        writeln!(f, "  Entries / Exits:  {} / {}", self.entries, self.exits)?;
        writeln!(f, "  Rejected Buys:    {}", self.rejected_buys)?;
        writeln!(f, "  Records:          {}", self.records)?;
        write!(f, "  Divergences:      {}", self.divergences)
    }
}
