//! CSV Record Sink
//!
//! Appends one row per trade record. The file is opened for each append and
//! closed again before returning, so an external reader always sees whole
//! rows. The header is written only when the file is empty.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::domain::TradeRecord;
use crate::ports::{RecordSink, SinkError};

pub const HEADER: [&str; 14] = [
    "date",
    "close",
    "mean",
    "stdDev",
    "zscore",
    "skewness",
    "kurtosis",
    "signal",
    "outcome",
    "execution",
    "balance",
    "position",
    "profitLoss",
    "runningPnl",
];

#[derive(Debug, Clone)]
pub struct CsvRecordSink {
    path: PathBuf,
}

impl CsvRecordSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Undefined statistics are written as empty cells
fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn to_row(record: &TradeRecord) -> [String; 14] {
    [
        record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        record.price.to_string(),
        cell(record.stats.mean),
        cell(record.stats.std_dev),
        cell(record.stats.zscore),
        cell(record.stats.skewness),
        cell(record.stats.kurtosis),
        record.signal.to_string(),
        record.outcome.to_string(),
        record.execution.to_string(),
        record.balance_after.to_string(),
        record.position_after.to_string(),
        cell(record.profit_loss),
        record.running_pnl.to_string(),
    ]
}

impl RecordSink for CsvRecordSink {
    fn append(&mut self, record: &TradeRecord) -> Result<(), SinkError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(HEADER)?;
        }
        writer.write_record(to_row(record))?;
        writer.flush()?;
        Ok(())
    }
}
