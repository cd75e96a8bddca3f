pub mod orchestrator;
pub mod report;

pub use orchestrator::{
    LoopCounters, LoopSettings, LoopStatus, OrchestratorError, ShutdownHandle, StrategyLoop,
};
pub use report::BacktestSummary;
