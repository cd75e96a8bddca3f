use thiserror::Error;

use crate::domain::TradeRecord;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write record: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode record: {0}")]
    Csv(#[from] csv::Error),
}

/// Append-only destination for trade records.
///
/// At-least-once: a retried append may duplicate a line.
pub trait RecordSink: Send {
    fn append(&mut self, record: &TradeRecord) -> Result<(), SinkError>;
}

impl<S: RecordSink + ?Sized> RecordSink for Box<S> {
    fn append(&mut self, record: &TradeRecord) -> Result<(), SinkError> {
        (**self).append(record)
    }
}
