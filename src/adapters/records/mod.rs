//! Record Sinks
//!
//! Destinations for the per-tick decision log.

mod csv_sink;
mod memory;

pub use csv_sink::{CsvRecordSink, HEADER};
pub use memory::MemorySink;
