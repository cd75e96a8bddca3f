use crate::domain::TradeRecord;
use crate::ports::{RecordSink, SinkError};

/// Keeps every record in memory. Used by backtests and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Vec<TradeRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[TradeRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<TradeRecord> {
        self.records
    }
}

impl RecordSink for MemorySink {
    fn append(&mut self, record: &TradeRecord) -> Result<(), SinkError> {
        self.records.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExecutionStatus, Signal, StatisticsSnapshot, TradeOutcome};

    fn record() -> TradeRecord {
        TradeRecord {
            timestamp: chrono::Utc::now(),
            price: 100.0,
            signal: Signal::Hold,
            outcome: TradeOutcome::NoTrade,
            execution: ExecutionStatus::NotRequired,
            balance_after: 1000.0,
            position_after: 0.0,
            profit_loss: None,
            running_pnl: 0.0,
            stats: StatisticsSnapshot::default(),
        }
    }

    #[test]
    fn test_memory_sink_keeps_order() {
        let mut sink = MemorySink::new();
        let mut second = record();
        second.price = 101.0;

        sink.append(&record()).unwrap();
        sink.append(&second).unwrap();

        let prices: Vec<f64> = sink.into_records().iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![100.0, 101.0]);
    }
}
