//! Execution Adapters
//!
//! `PaperExecution` acknowledges orders locally. Live orders go through
//! `crate::adapters::pi42::Pi42OrderClient`.

mod paper;

pub use paper::PaperExecution;
