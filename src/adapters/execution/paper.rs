//! Paper Execution
//!
//! Acknowledges every order locally without touching a broker. A non-zero
//! failure rate makes calls fail at random, which exercises the divergence
//! path of the strategy loop.

use std::sync::atomic::{AtomicU64, Ordering};
use async_trait::async_trait;
use rand::Rng;

use crate::ports::{ExecutionError, ExecutionPort, OrderAck, OrderRequest};

#[derive(Debug, Default)]
pub struct PaperExecution {
    /// Probability in [0, 1] that a call fails
    failure_rate: f64,
    sequence: AtomicU64,
}

impl PaperExecution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure_rate(failure_rate: f64) -> Self {
        Self {
            failure_rate: failure_rate.clamp(0.0, 1.0),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn calls(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    fn next_id(&self, prefix: &str) -> Result<String, ExecutionError> {
        let n = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        if self.failure_rate > 0.0 && rand::thread_rng().gen::<f64>() < self.failure_rate {
            return Err(ExecutionError::ApiError(format!(
                "simulated broker failure on call {}",
                n
            )));
        }
        Ok(format!("{}-{}", prefix, n))
    }
}

#[async_trait]
impl ExecutionPort for PaperExecution {
    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, ExecutionError> {
        let order_id = self.next_id("paper")?;
        tracing::info!(
            "[PAPER] {} {:?} {:.6} {} ({} margin) -> {}",
            order.order_type, order.side, order.quantity, order.symbol, order.margin_asset, order_id
        );
        Ok(OrderAck {
            order_id,
            status: Some("FILLED".to_string()),
        })
    }

    async fn close_all_positions(&self) -> Result<OrderAck, ExecutionError> {
        let order_id = self.next_id("paper-close")?;
        tracing::info!("[PAPER] Close all positions -> {}", order_id);
        Ok(OrderAck {
            order_id,
            status: Some("CLOSED".to_string()),
        })
    }
}
