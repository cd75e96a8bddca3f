//! Strategy Loop
//!
//! Drives one observation at a time end to end:
//! price -> rolling statistics -> signal -> position transition -> order
//! call -> trade record. An observation is always fully processed before the
//! next one is pulled, so nothing here needs a lock.
//!
//! Live mode is a poll / sleep cycle. Both the poll and the sleep race a
//! shutdown channel; processing never does.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::application::report::BacktestSummary;
use crate::domain::{
    ExecutionStatus, PortfolioState, PositionError, PositionManager, PriceObservation,
    StatisticsSnapshot, TradeOutcome, TradeRecord, TransitionResult,
};
use crate::ports::{
    ExecutionPort, FeedError, OrderRequest, OrderSide, OrderType, PriceFeed, RecordSink,
};
use crate::strategy::{ConfigError, RollingStatistics, SignalGenerator, StatsError, StrategyConfig};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid observation: {0}")]
    InvalidObservation(StatsError),
    #[error("Feed error: {0}")]
    Feed(FeedError),
    #[error("Feed failed {attempts} times in a row, last error: {last}")]
    FeedRetriesExhausted { attempts: u32, last: FeedError },
}

/// Everything the loop needs besides the strategy itself
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub symbol: String,
    pub margin_asset: String,
    pub order_type: OrderType,
    pub poll_interval: Duration,
    pub fetch_timeout: Duration,
    /// `None` retries forever
    pub max_consecutive_failures: Option<u32>,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            symbol: "ETHINR".to_string(),
            margin_asset: "INR".to_string(),
            order_type: OrderType::Market,
            poll_interval: Duration::from_secs(60),
            fetch_timeout: Duration::from_secs(10),
            max_consecutive_failures: None,
        }
    }
}

/// Stops a running loop between polls
#[derive(Debug, Clone)]
pub struct ShutdownHandle(Arc<watch::Sender<bool>>);

impl ShutdownHandle {
    pub fn stop(&self) {
        self.0.send_replace(true);
        info!("Stop signal sent to strategy loop");
    }

    pub fn is_stopped(&self) -> bool {
        *self.0.borrow()
    }
}

/// Counters surfaced for reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopCounters {
    /// Observations that produced a record
    pub processed: u64,
    /// Observations accepted while the window was still filling
    pub warming_up: u64,
    pub invalid_observations: u64,
    pub feed_failures: u64,
    /// Order calls that failed after the local books had already moved
    pub divergences: u64,
    pub sink_failures: u64,
}

/// Status snapshot of the loop
#[derive(Debug, Clone)]
pub struct LoopStatus {
    pub is_stopped: bool,
    pub portfolio: PortfolioState,
    pub counters: LoopCounters,
    pub last_price: Option<f64>,
    pub last_snapshot: Option<StatisticsSnapshot>,
}

pub struct StrategyLoop<E, S> {
    config: StrategyConfig,
    settings: LoopSettings,
    stats: RollingStatistics,
    generator: SignalGenerator,
    positions: PositionManager,
    execution: E,
    sink: S,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
    counters: LoopCounters,
    first_price: Option<f64>,
    last_price: Option<f64>,
    last_snapshot: Option<StatisticsSnapshot>,
}

impl<E: ExecutionPort, S: RecordSink> StrategyLoop<E, S> {
    pub fn new(
        config: StrategyConfig,
        settings: LoopSettings,
        execution: E,
        sink: S,
    ) -> Result<Self, OrchestratorError> {
        config.validate()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            stats: RollingStatistics::from_config(&config),
            generator: SignalGenerator::from_config(&config),
            positions: PositionManager::new(config.risk.initial_balance, config.risk.sizing),
            config,
            settings,
            execution,
            sink,
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
            counters: LoopCounters::default(),
            first_price: None,
            last_price: None,
            last_snapshot: None,
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.settings.poll_interval = interval;
        self
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(Arc::clone(&self.shutdown_tx))
    }

    pub fn is_stopped(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    pub fn portfolio(&self) -> &PortfolioState {
        self.positions.state()
    }

    pub fn counters(&self) -> LoopCounters {
        self.counters
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn status(&self) -> LoopStatus {
        LoopStatus {
            is_stopped: self.is_stopped(),
            portfolio: self.positions.state().clone(),
            counters: self.counters,
            last_price: self.last_price,
            last_snapshot: self.last_snapshot,
        }
    }

    /// Summary of the run so far, marked at the last seen price
    pub fn summary(&self) -> BacktestSummary {
        BacktestSummary::new(
            self.positions.state(),
            self.first_price,
            self.last_price,
            self.positions.entry_count(),
            self.positions.exit_count(),
            self.positions.rejected_count(),
            self.counters,
        )
    }

    /// Replay a finite feed to its end
    pub async fn run_replay<F: PriceFeed>(&mut self, feed: &mut F) -> Result<(), OrchestratorError> {
        info!(
            "Starting replay - policy: {:?}, windows: {}/{}",
            self.config.signal_policy, self.config.window_level, self.config.window_moment
        );

        while !self.is_stopped() {
            match feed.next().await {
                Ok(Some(observation)) => {
                    self.process(observation).await?;
                }
                Ok(None) => break,
                Err(e) => return Err(OrchestratorError::Feed(e)),
            }
        }

        info!("Replay finished after {} records", self.counters.processed);
        Ok(())
    }

    /// Poll a live feed until stopped
    pub async fn run_live<F: PriceFeed>(&mut self, feed: &mut F) -> Result<(), OrchestratorError> {
        let mut shutdown = self.shutdown_rx.clone();
        let mut consecutive_failures = 0u32;

        info!(
            "Starting strategy loop - {} every {:?}, policy: {:?}",
            self.settings.symbol, self.settings.poll_interval, self.config.signal_policy
        );

        while !self.is_stopped() {
            let polled = tokio::select! {
                _ = shutdown.changed() => break,
                polled = tokio::time::timeout(self.settings.fetch_timeout, feed.next()) => polled,
            };

            match polled {
                Ok(Ok(Some(observation))) => {
                    consecutive_failures = 0;
                    self.process(observation).await?;
                }
                Ok(Ok(None)) => {
                    info!("Feed reached end of stream");
                    break;
                }
                Ok(Err(FeedError::NotReady(reason))) => {
                    consecutive_failures = 0;
                    debug!("Waiting for next candle: {}", reason);
                }
                Ok(Err(e)) => self.note_feed_failure(e, &mut consecutive_failures)?,
                Err(_) => self.note_feed_failure(
                    FeedError::Timeout(self.settings.fetch_timeout),
                    &mut consecutive_failures,
                )?,
            }

            if feed.pending() > 0 {
                continue;
            }

            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
            }
        }

        info!("Strategy loop stopped");
        Ok(())
    }

    fn note_feed_failure(&mut self, error: FeedError, consecutive: &mut u32) -> Result<(), OrchestratorError> {
        *consecutive += 1;
        self.counters.feed_failures += 1;
        warn!("Price feed failure ({} in a row): {}", consecutive, error);

        match self.settings.max_consecutive_failures {
            Some(max) if *consecutive >= max => Err(OrchestratorError::FeedRetriesExhausted {
                attempts: *consecutive,
                last: error,
            }),
            _ => Ok(()),
        }
    }

    /// Process one observation. Returns the emitted record, or `None` when
    /// the tick was skipped.
    pub async fn process(
        &mut self,
        observation: PriceObservation,
    ) -> Result<Option<TradeRecord>, OrchestratorError> {
        let snapshot = match self.stats.observe(&observation) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.counters.invalid_observations += 1;
                if self.config.abort_on_invalid_observation {
                    return Err(OrchestratorError::InvalidObservation(e));
                }
                warn!("Skipping observation at {}: {}", observation.timestamp, e);
                return Ok(None);
            }
        };

        let price = observation.price;
        self.first_price.get_or_insert(price);
        self.last_price = Some(price);
        self.last_snapshot = Some(snapshot);

        if !self.is_ready(&snapshot) {
            self.counters.warming_up += 1;
            debug!(
                "{} {:.4} | Warming up {}/{}",
                self.settings.symbol,
                price,
                self.stats.len(),
                self.config.window_level
            );
            return Ok(None);
        }

        let signal = self.generator.evaluate(&snapshot, price);

        let (outcome, execution, profit_loss) = match self.positions.apply(signal, price) {
            Ok(transition) => {
                let execution = self.execute(&transition).await;
                (TradeOutcome::from(&transition), execution, transition.profit_loss())
            }
            Err(PositionError::InsufficientBalance { required, available }) => {
                warn!(
                    "BUY at {:.4} rejected: budget {:.4} exceeds balance {:.4}",
                    price, required, available
                );
                (TradeOutcome::Rejected, ExecutionStatus::NotRequired, None)
            }
            Err(e @ PositionError::InvalidPrice(_)) => {
                warn!("Position manager refused tick: {}", e);
                (TradeOutcome::NoTrade, ExecutionStatus::NotRequired, None)
            }
        };

        let state = self.positions.state();
        let record = TradeRecord {
            timestamp: observation.timestamp,
            price,
            signal,
            outcome,
            execution,
            balance_after: state.balance(),
            position_after: state.position(),
            profit_loss,
            running_pnl: state.running_pnl(price),
            stats: snapshot,
        };

        if let Err(e) = self.sink.append(&record) {
            self.counters.sink_failures += 1;
            error!("Failed to persist trade record: {}", e);
        }
        self.counters.processed += 1;

        info!(
            "{} {:.4} | Z-score: {} | {} -> {} | Balance: {:.4} | Position: {:.6} | P/L: {:.4} ({:.4}%)",
            self.settings.symbol,
            price,
            snapshot.zscore.map_or_else(|| "n/a".to_string(), |z| format!("{:.2}", z)),
            signal,
            outcome,
            record.balance_after,
            record.position_after,
            record.running_pnl,
            record.running_pnl / state.initial_balance() * 100.0,
        );

        Ok(Some(record))
    }

    fn is_ready(&self, snapshot: &StatisticsSnapshot) -> bool {
        if self.config.require_full_window {
            self.stats.is_warm() && snapshot.has_band()
        } else {
            snapshot.has_band()
        }
    }

    /// Mirror a local transition at the broker. Failures are reported, never
    /// rolled back.
    async fn execute(&mut self, transition: &TransitionResult) -> ExecutionStatus {
        let result = match *transition {
            TransitionResult::Entered { size, .. } | TransitionResult::ScaledIn { size, .. } => {
                let order = OrderRequest {
                    symbol: self.settings.symbol.clone(),
                    side: OrderSide::Buy,
                    quantity: size,
                    margin_asset: self.settings.margin_asset.clone(),
                    order_type: self.settings.order_type,
                };
                self.execution.place_order(&order).await
            }
            TransitionResult::Exited { .. } => self.execution.close_all_positions().await,
            TransitionResult::NoTrade => return ExecutionStatus::NotRequired,
        };

        match result {
            Ok(ack) => {
                info!("Order acknowledged: {}", ack.order_id);
                ExecutionStatus::Confirmed(ack.order_id)
            }
            Err(e) => {
                self.counters.divergences += 1;
                error!(
                    "Order call failed after local {:?}; local books now diverge from broker: {}",
                    transition, e
                );
                ExecutionStatus::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::records::MemorySink;
    use crate::adapters::market_data::ReplayFeed;
    use crate::domain::{Signal, SizingMode};
    use crate::ports::execution::MockExecutionPort;
    use crate::ports::market_data::MockPriceFeed;
    use crate::ports::mocks::{FailingSink, RecordingExecution, ScriptedFeed};
    use crate::ports::{ExecutionError, OrderAck};
    use approx::assert_relative_eq;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};

    fn observations(prices: &[f64]) -> Vec<PriceObservation> {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| PriceObservation::new(start + ChronoDuration::hours(i as i64), p))
            .collect()
    }

    fn fast_settings() -> LoopSettings {
        LoopSettings {
            poll_interval: Duration::from_millis(1),
            fetch_timeout: Duration::from_millis(50),
            ..LoopSettings::default()
        }
    }

    fn fixed_config(balance: f64, amount: f64) -> StrategyConfig {
        StrategyConfig::default()
            .with_initial_balance(balance)
            .with_sizing(SizingMode::FixedAmount { amount })
    }

    fn create_loop(
        config: StrategyConfig,
    ) -> StrategyLoop<RecordingExecution, MemorySink> {
        StrategyLoop::new(config, fast_settings(), RecordingExecution::new(), MemorySink::new()).unwrap()
    }

    /// 23 flat prices, a crash, then a spike back above the band
    fn crash_and_recover() -> Vec<f64> {
        let mut prices = vec![100.0; 23];
        prices.push(80.0);
        prices.push(130.0);
        prices
    }

    #[tokio::test]
    async fn test_rejects_invalid_config() {
        let config = StrategyConfig::default().with_windows(0, 20);
        let result = StrategyLoop::new(config, fast_settings(), RecordingExecution::new(), MemorySink::new());
        assert!(matches!(result, Err(OrchestratorError::Config(_))));
    }

    #[tokio::test]
    async fn test_warm_up_emits_no_records() {
        let mut strategy = create_loop(fixed_config(1000.0, 30.0));
        for obs in observations(&[100.0; 23]) {
            assert!(strategy.process(obs).await.unwrap().is_none());
        }
        assert_eq!(strategy.counters().warming_up, 23);
        assert!(strategy.sink().records().is_empty());
    }

    #[tokio::test]
    async fn test_crash_buys_then_spike_sells() {
        let mut strategy = create_loop(fixed_config(1000.0, 30.0));
        let mut feed = ReplayFeed::new(observations(&crash_and_recover()));
        let execution = strategy.execution.clone();

        strategy.run_replay(&mut feed).await.unwrap();

        let records = strategy.sink().records();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].signal, Signal::Buy);
        assert_eq!(records[0].outcome, TradeOutcome::Entered);
        assert_eq!(records[0].execution, ExecutionStatus::Confirmed("mock-1".into()));
        assert_relative_eq!(records[0].position_after, 30.0 / 80.0);
        assert_relative_eq!(records[0].balance_after, 970.0);

        assert_eq!(records[1].signal, Signal::Sell);
        assert_eq!(records[1].outcome, TradeOutcome::Exited);
        assert_relative_eq!(records[1].profit_loss.unwrap(), 30.0 / 80.0 * 50.0, epsilon = 1e-9);
        assert_eq!(records[1].position_after, 0.0);

        let orders = execution.orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].side, OrderSide::Buy);
        assert_eq!(orders[0].symbol, "ETHINR");
        assert_relative_eq!(orders[0].quantity, 0.375);
        assert_eq!(execution.close_calls(), 1);
    }

    #[tokio::test]
    async fn test_constant_stream_holds() {
        let mut strategy = create_loop(fixed_config(1000.0, 30.0));
        let mut feed = ReplayFeed::new(observations(&[100.0; 30]));
        strategy.run_replay(&mut feed).await.unwrap();

        let records = strategy.sink().records();
        assert_eq!(records.len(), 7);
        for record in records {
            assert_eq!(record.signal, Signal::Hold);
            assert_eq!(record.stats.zscore, None);
            assert_eq!(record.stats.std_dev, Some(0.0));
        }
    }

    #[tokio::test]
    async fn test_insufficient_balance_still_records() {
        let mut strategy = create_loop(fixed_config(1000.0, 1500.0));
        let mut prices = vec![100.0; 23];
        prices.push(80.0);
        let mut feed = ReplayFeed::new(observations(&prices));

        strategy.run_replay(&mut feed).await.unwrap();

        let records = strategy.sink().records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].signal, Signal::Buy);
        assert_eq!(records[0].outcome, TradeOutcome::Rejected);
        assert_eq!(records[0].execution, ExecutionStatus::NotRequired);
        assert_eq!(records[0].balance_after, 1000.0);
        assert_eq!(records[0].position_after, 0.0);
        assert!(strategy.execution.orders().is_empty());
    }

    #[tokio::test]
    async fn test_execution_failure_keeps_local_state_and_flags_divergence() {
        let mut strategy = StrategyLoop::new(
            fixed_config(1000.0, 30.0),
            fast_settings(),
            RecordingExecution::failing("503 Service Unavailable"),
            MemorySink::new(),
        )
        .unwrap();
        let mut feed = ReplayFeed::new(observations(&crash_and_recover()));

        strategy.run_replay(&mut feed).await.unwrap();

        let records = strategy.sink().records();
        assert!(records.iter().all(|r| r.is_divergent()));
        assert_eq!(records[0].outcome, TradeOutcome::Entered);
        assert_eq!(records[1].outcome, TradeOutcome::Exited);
        assert_eq!(strategy.counters().divergences, 2);
        assert!(strategy.portfolio().balance() > 1000.0);
    }

    #[tokio::test]
    async fn test_mocked_execution_called_once_per_transition() {
        let mut mock = MockExecutionPort::new();
        mock.expect_place_order()
            .times(1)
            .withf(|order| order.side == OrderSide::Buy && order.margin_asset == "INR")
            .returning(|_| Ok(OrderAck { order_id: "abc".into(), status: None }));
        mock.expect_close_all_positions()
            .times(1)
            .returning(|| Err(ExecutionError::Rejected("no position".into())));

        let mut strategy =
            StrategyLoop::new(fixed_config(1000.0, 30.0), fast_settings(), mock, MemorySink::new()).unwrap();
        let mut feed = ReplayFeed::new(observations(&crash_and_recover()));
        strategy.run_replay(&mut feed).await.unwrap();

        let records = strategy.sink().records();
        assert_eq!(records[0].execution, ExecutionStatus::Confirmed("abc".into()));
        assert!(matches!(records[1].execution, ExecutionStatus::Failed(_)));
    }

    #[tokio::test]
    async fn test_invalid_observation_skipped_by_default() {
        let mut strategy = create_loop(fixed_config(1000.0, 30.0));
        let mut obs = observations(&[100.0, f64::NAN, -1.0, 101.0]);
        // out of order
        obs.push(PriceObservation::new(obs[0].timestamp, 99.0));

        for o in obs {
            strategy.process(o).await.unwrap();
        }
        assert_eq!(strategy.counters().invalid_observations, 3);
        assert_eq!(strategy.status().last_price, Some(101.0));
    }

    #[tokio::test]
    async fn test_invalid_observation_aborts_when_configured() {
        let mut config = fixed_config(1000.0, 30.0);
        config.abort_on_invalid_observation = true;
        let mut strategy = create_loop(config);

        let mut feed = ReplayFeed::new(observations(&[100.0, 0.0, 101.0]));
        let result = strategy.run_replay(&mut feed).await;
        assert!(matches!(result, Err(OrchestratorError::InvalidObservation(_))));
    }

    #[tokio::test]
    async fn test_sink_failure_does_not_stop_loop() {
        let mut strategy = StrategyLoop::new(
            fixed_config(1000.0, 30.0),
            fast_settings(),
            RecordingExecution::new(),
            FailingSink::default(),
        )
        .unwrap();
        let mut feed = ReplayFeed::new(observations(&crash_and_recover()));

        strategy.run_replay(&mut feed).await.unwrap();
        assert_eq!(strategy.counters().sink_failures, 2);
        assert_eq!(strategy.sink().attempts(), 2);
        assert_eq!(strategy.counters().processed, 2);
    }

    #[tokio::test]
    async fn test_minimal_warmup_processes_early_ticks() {
        let mut config = fixed_config(1000.0, 30.0);
        config.require_full_window = false;
        let mut strategy = create_loop(config);
        let mut feed = ReplayFeed::new(observations(&[100.0, 101.0, 102.0]));

        strategy.run_replay(&mut feed).await.unwrap();
        // first tick has no std-dev yet
        assert_eq!(strategy.sink().records().len(), 2);
    }

    #[tokio::test]
    async fn test_live_loop_retries_transient_failures() {
        let obs = observations(&crash_and_recover());
        let mut feed = ScriptedFeed::new();
        for (i, o) in obs.into_iter().enumerate() {
            if i == 10 {
                feed = feed.with_error(FeedError::Http("502 Bad Gateway".into()));
            }
            feed = feed.with_price(o);
        }
        let calls = feed.call_counter();

        let mut strategy = create_loop(fixed_config(1000.0, 30.0));
        strategy.run_live(&mut feed).await.unwrap();

        assert_eq!(strategy.counters().feed_failures, 1);
        assert_eq!(strategy.sink().records().len(), 2);
        // 25 prices + 1 error + end of stream
        assert_eq!(*calls.lock().unwrap(), 27);
    }

    #[tokio::test]
    async fn test_live_loop_gives_up_after_bounded_retries() {
        let mut feed = MockPriceFeed::new();
        feed.expect_next()
            .returning(|| Err(FeedError::Http("connection refused".into())));
        feed.expect_pending().return_const(0usize);

        let settings = LoopSettings {
            max_consecutive_failures: Some(3),
            ..fast_settings()
        };
        let mut strategy =
            StrategyLoop::new(fixed_config(1000.0, 30.0), settings, RecordingExecution::new(), MemorySink::new())
                .unwrap();

        let result = strategy.run_live(&mut feed).await;
        assert!(matches!(
            result,
            Err(OrchestratorError::FeedRetriesExhausted { attempts: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_waiting_for_candle_close_is_not_a_failure() {
        let mut feed = ScriptedFeed::new();
        for _ in 0..5 {
            feed = feed.with_error(FeedError::NotReady("1h candle still open".into()));
        }
        for o in observations(&[100.0; 3]) {
            feed = feed.with_price(o);
        }

        let settings = LoopSettings {
            max_consecutive_failures: Some(2),
            ..fast_settings()
        };
        let mut strategy =
            StrategyLoop::new(fixed_config(1000.0, 30.0), settings, RecordingExecution::new(), MemorySink::new())
                .unwrap();

        strategy.run_live(&mut feed).await.unwrap();
        assert_eq!(strategy.counters().feed_failures, 0);
        assert_eq!(strategy.counters().warming_up, 3);
    }

    struct StallingFeed;

    #[async_trait]
    impl PriceFeed for StallingFeed {
        async fn next(&mut self) -> Result<Option<PriceObservation>, FeedError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_live_loop_times_out_slow_feed() {
        let settings = LoopSettings {
            fetch_timeout: Duration::from_millis(5),
            max_consecutive_failures: Some(2),
            ..fast_settings()
        };
        let mut strategy =
            StrategyLoop::new(fixed_config(1000.0, 30.0), settings, RecordingExecution::new(), MemorySink::new())
                .unwrap();

        let result = strategy.run_live(&mut StallingFeed).await;
        match result {
            Err(OrchestratorError::FeedRetriesExhausted { last, .. }) => {
                assert!(matches!(last, FeedError::Timeout(_)))
            }
            other => panic!("expected timeout exhaustion, got {:?}", other),
        }
    }

    struct StoppingFeed {
        handle: ShutdownHandle,
        served: u32,
        stop_after: u32,
    }

    #[async_trait]
    impl PriceFeed for StoppingFeed {
        async fn next(&mut self) -> Result<Option<PriceObservation>, FeedError> {
            self.served += 1;
            if self.served == self.stop_after {
                self.handle.stop();
            }
            Ok(Some(PriceObservation::now(100.0 + self.served as f64)))
        }
    }

    #[tokio::test]
    async fn test_shutdown_between_polls() {
        let mut config = fixed_config(1000.0, 30.0);
        config.window_level = 3;
        let mut strategy = create_loop(config).with_poll_interval(Duration::from_secs(3600));
        let mut feed = StoppingFeed {
            handle: strategy.shutdown_handle(),
            served: 0,
            stop_after: 1,
        };

        // would sleep an hour without the stop signal
        strategy.run_live(&mut feed).await.unwrap();

        assert_eq!(feed.served, 1);
        assert!(strategy.is_stopped());
        assert_eq!(strategy.counters().warming_up, 1);
    }

    #[tokio::test]
    async fn test_stop_before_run_exits_immediately() {
        let mut strategy = create_loop(fixed_config(1000.0, 30.0));
        strategy.shutdown_handle().stop();

        let mut feed = ScriptedFeed::new().with_price(PriceObservation::now(100.0));
        let calls = feed.call_counter();
        strategy.run_live(&mut feed).await.unwrap();

        assert_eq!(*calls.lock().unwrap(), 0);
        assert!(strategy.status().is_stopped);
    }
}
