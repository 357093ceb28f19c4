use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::blockchain::chain_client::ChainClient;
use crate::blockchain::transaction_scanner::TransactionScanner;
use crate::config::AppConfig;
use crate::error::{RpcError, WatcherError};
use crate::logging::{ErrorLogger, LogContext, MetricsLogger};
use crate::models::{MatchCandidate, NotificationMessage, TrackedSet};
use crate::notification::NotificationSink;
use crate::store::{AddressStore, StoreError};

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Cursor regression: cannot move from {current} back to {requested}")]
    CursorRegression { current: u64, requested: u64 },

    #[error("Cursor gap: cannot jump from {current} to {requested}")]
    CursorGap { current: u64, requested: u64 },
}

/// Last fully processed block height. Only ever moves forward by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockCursor {
    height: u64,
}

impl BlockCursor {
    pub fn new(height: u64) -> Self {
        Self { height }
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn next(&self) -> u64 {
        self.height + 1
    }

    pub fn advance_to(&mut self, height: u64) -> Result<(), MonitorError> {
        if height <= self.height {
            return Err(MonitorError::CursorRegression {
                current: self.height,
                requested: height,
            });
        }
        if height != self.next() {
            return Err(MonitorError::CursorGap {
                current: self.height,
                requested: height,
            });
        }
        self.height = height;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    Idle,
    Polling,
    Scanning,
    Reporting,
    Waiting,
    Stopped,
}

/// Delay source for the poll loop
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone)]
pub struct BlockMonitorConfig {
    pub poll_interval: Duration,
    pub error_backoff: Duration,
    pub chat_id: String,
    pub native_symbol: String,
    pub native_decimals: u8,
    pub scan_contract_logs: bool,
}

impl Default for BlockMonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            error_backoff: Duration::from_secs(10),
            chat_id: String::new(),
            native_symbol: "INK".to_string(),
            native_decimals: 18,
            scan_contract_logs: true,
        }
    }
}

impl BlockMonitorConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.monitor.poll_interval_seconds),
            error_backoff: Duration::from_secs(config.monitor.error_backoff_seconds),
            chat_id: config.chat_id(),
            native_symbol: config.monitor.native_symbol.clone(),
            native_decimals: config.monitor.native_decimals,
            scan_contract_logs: config.monitor.scan_contract_logs,
        }
    }
}

/// Snapshot shared with the status API
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    pub state: MonitorState,
    pub cursor: Option<u64>,
    pub latest_seen_height: Option<u64>,
    pub blocks_processed: u64,
    pub notifications_sent: u64,
    pub notifications_failed: u64,
    /// Transactions whose logs were skipped because the node had no receipt
    pub receipts_missing: u64,
    pub tracked_wallets: usize,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub is_running: bool,
}

impl Default for MonitorStatus {
    fn default() -> Self {
        Self {
            state: MonitorState::Idle,
            cursor: None,
            latest_seen_height: None,
            blocks_processed: 0,
            notifications_sent: 0,
            notifications_failed: 0,
            receipts_missing: 0,
            tracked_wallets: 0,
            last_cycle_at: None,
            last_error: None,
            is_running: false,
        }
    }
}

impl MonitorStatus {
    pub fn blocks_behind(&self) -> u64 {
        match (self.latest_seen_height, self.cursor) {
            (Some(latest), Some(cursor)) => latest.saturating_sub(cursor),
            _ => 0,
        }
    }
}

/// Why a cycle stopped before catching up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleInterruption {
    HeightUnavailable { reason: String },
    BlockUnavailable { height: u64, reason: String },
    StoreUnavailable { height: u64, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub latest_height: Option<u64>,
    /// Heights committed to the cursor this cycle, ascending
    pub processed_heights: Vec<u64>,
    pub notifications_sent: u32,
    pub notifications_failed: u32,
    pub interrupted: Option<CycleInterruption>,
}

impl CycleReport {
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.is_some()
    }
}

#[derive(Debug, Default)]
struct BlockOutcome {
    matches: usize,
    sent: u32,
    failed: u32,
    receipts_missing: u32,
    tracked_wallets: usize,
}

/// Polls the chain, scans each new block against the tracked set, reports
/// matches and advances the cursor one height at a time.
pub struct BlockMonitor {
    chain: Arc<dyn ChainClient>,
    store: Arc<dyn AddressStore>,
    sink: Arc<dyn NotificationSink>,
    sleeper: Arc<dyn Sleeper>,
    scanner: TransactionScanner,
    pub config: BlockMonitorConfig,
    cursor: Option<BlockCursor>,
    status: Arc<RwLock<MonitorStatus>>,
    pub shutdown_signal: Arc<AtomicBool>,
}

impl BlockMonitor {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        store: Arc<dyn AddressStore>,
        sink: Arc<dyn NotificationSink>,
        config: BlockMonitorConfig,
    ) -> Self {
        Self {
            chain,
            store,
            sink,
            sleeper: Arc::new(TokioSleeper),
            scanner: TransactionScanner::new(config.scan_contract_logs),
            config,
            cursor: None,
            status: Arc::new(RwLock::new(MonitorStatus::default())),
            shutdown_signal: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start from a known height instead of the chain tip
    pub fn with_cursor(mut self, height: u64) -> Self {
        self.cursor = Some(BlockCursor::new(height));
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn cursor(&self) -> Option<u64> {
        self.cursor.map(|cursor| cursor.height())
    }

    pub fn status_handle(&self) -> Arc<RwLock<MonitorStatus>> {
        Arc::clone(&self.status)
    }

    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown_signal)
    }

    /// Request a stop between cycles
    pub fn shutdown(&self) {
        LogContext::new("block_monitor", "shutdown").info("Requesting graceful shutdown");
        self.shutdown_signal.store(true, Ordering::Relaxed);
    }

    fn is_shutting_down(&self) -> bool {
        self.shutdown_signal.load(Ordering::Relaxed)
    }

    /// Set the cursor to the current chain height unless one was provided.
    /// No history is backfilled.
    pub async fn initialize(&mut self) -> Result<u64, RpcError> {
        if let Some(cursor) = self.cursor {
            self.status.write().await.cursor = Some(cursor.height());
            return Ok(cursor.height());
        }

        let height = self.chain.current_height().await?;
        self.cursor = Some(BlockCursor::new(height));

        let mut status = self.status.write().await;
        status.cursor = Some(height);
        status.latest_seen_height = Some(height);
        drop(status);

        LogContext::new("block_monitor", "initialize")
            .with_block_number(height)
            .info(&format!("Starting from block {}", height));
        Ok(height)
    }

    /// Run until shutdown is requested
    pub async fn run(&mut self) {
        LogContext::new("block_monitor", "run")
            .with_metadata("poll_interval_seconds", json!(self.config.poll_interval.as_secs()))
            .with_metadata("sink", json!(self.sink.name()))
            .info("Block monitor started");
        self.status.write().await.is_running = true;

        while !self.is_shutting_down() {
            let report = self.run_cycle().await;

            if self.is_shutting_down() {
                break;
            }

            let delay = if report.is_interrupted() {
                self.config.error_backoff
            } else {
                self.config.poll_interval
            };

            self.set_state(MonitorState::Waiting).await;
            self.sleeper.sleep(delay).await;
        }

        let mut status = self.status.write().await;
        status.state = MonitorState::Stopped;
        status.is_running = false;
        drop(status);

        LogContext::new("block_monitor", "run")
            .with_metadata("cursor", json!(self.cursor()))
            .info("Block monitor stopped");
    }

    /// One poll: process every height from cursor+1 up to the chain tip in
    /// order, stopping at the first block that cannot be processed.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();
        self.set_state(MonitorState::Polling).await;

        if self.cursor.is_none() {
            if let Err(e) = self.initialize().await {
                report.interrupted = Some(self.height_unavailable(e).await);
                return report;
            }
        }

        let latest = match self.chain.current_height().await {
            Ok(height) => height,
            Err(e) => {
                report.interrupted = Some(self.height_unavailable(e).await);
                return report;
            }
        };
        report.latest_height = Some(latest);
        self.status.write().await.latest_seen_height = Some(latest);

        let mut cursor = match self.cursor {
            Some(cursor) => cursor,
            None => return report,
        };

        let mut tracked_wallets = None;
        while cursor.height() < latest {
            if self.is_shutting_down() {
                break;
            }

            let height = cursor.next();
            match self.process_block(height).await {
                Ok(outcome) => {
                    if let Err(e) = cursor.advance_to(height) {
                        ErrorLogger::log_error(&WatcherError::Monitor(e), None);
                        break;
                    }
                    self.cursor = Some(cursor);

                    report.processed_heights.push(height);
                    report.notifications_sent += outcome.sent;
                    report.notifications_failed += outcome.failed;
                    tracked_wallets = Some(outcome.tracked_wallets);

                    let mut status = self.status.write().await;
                    status.cursor = Some(height);
                    status.blocks_processed += 1;
                    status.notifications_sent += outcome.sent as u64;
                    status.notifications_failed += outcome.failed as u64;
                    status.receipts_missing += outcome.receipts_missing as u64;
                    status.tracked_wallets = outcome.tracked_wallets;
                }
                Err(interruption) => {
                    self.status.write().await.last_error = Some(format!("{:?}", interruption));
                    report.interrupted = Some(interruption);
                    break;
                }
            }
        }

        let mut status = self.status.write().await;
        status.last_cycle_at = Some(Utc::now());
        if report.interrupted.is_none() {
            status.last_error = None;
        }
        drop(status);

        MetricsLogger::log_cycle_status(cursor.height(), latest, tracked_wallets.unwrap_or(0));
        report
    }

    async fn height_unavailable(&self, error: RpcError) -> CycleInterruption {
        let reason = error.to_string();
        ErrorLogger::log_error(
            &WatcherError::Rpc(error),
            Some(LogContext::new("block_monitor", "current_height")),
        );
        self.status.write().await.last_error = Some(reason.clone());
        CycleInterruption::HeightUnavailable { reason }
    }

    /// Fetch, scan and report one block. Notifications are dispatched before
    /// this returns, so the caller may commit the height on `Ok`.
    async fn process_block(&self, height: u64) -> Result<BlockOutcome, CycleInterruption> {
        let started = Instant::now();
        self.set_state(MonitorState::Scanning).await;

        let block = self.chain.get_block(height).await.map_err(|e| {
            let reason = e.to_string();
            ErrorLogger::log_error(
                &WatcherError::Rpc(e),
                Some(LogContext::new("block_monitor", "get_block").with_block_number(height)),
            );
            CycleInterruption::BlockUnavailable { height, reason }
        })?;

        // Re-read on every block so wallet commands take effect without a restart
        let store = Arc::clone(&self.store);
        let tracked: TrackedSet = tokio::task::spawn_blocking(move || store.load())
            .await
            .unwrap_or_else(|e| Err(StoreError::Operation(format!("Store task failed: {}", e))))
            .map_err(|e| {
                let reason = e.to_string();
                ErrorLogger::log_error(
                    &WatcherError::Store(e),
                    Some(LogContext::new("block_monitor", "load_tracked").with_block_number(height)),
                );
                CycleInterruption::StoreUnavailable { height, reason }
            })?
            .into_iter()
            .collect();

        let scan = self
            .scanner
            .scan_block(self.chain.as_ref(), &block, &tracked)
            .await
            .map_err(|e| {
                let reason = e.to_string();
                ErrorLogger::log_error(
                    &WatcherError::Rpc(e),
                    Some(LogContext::new("block_monitor", "scan_block").with_block_number(height)),
                );
                CycleInterruption::BlockUnavailable { height, reason }
            })?;

        let mut outcome = BlockOutcome {
            matches: scan.candidates.len(),
            receipts_missing: scan.receipts_missing,
            tracked_wallets: tracked.len(),
            ..BlockOutcome::default()
        };

        if !scan.candidates.is_empty() {
            self.set_state(MonitorState::Reporting).await;
        }

        for candidate in &scan.candidates {
            match self.report(candidate).await {
                Some(true) => outcome.sent += 1,
                Some(false) => outcome.failed += 1,
                None => {}
            }
        }

        MetricsLogger::log_block_scanned(
            height,
            block.transactions.len(),
            outcome.matches,
            scan.receipts_fetched,
            scan.receipts_missing,
            started.elapsed().as_millis() as u64,
        );

        Ok(outcome)
    }

    /// Format and send one candidate. `None` when the candidate is not
    /// reportable (a log that is not a well-formed Transfer).
    async fn report(&self, candidate: &MatchCandidate) -> Option<bool> {
        let message = match candidate {
            MatchCandidate::NativeTransfer { transaction, .. } => NotificationMessage::native_transfer(
                transaction,
                &self.config.native_symbol,
                self.config.native_decimals,
            ),
            MatchCandidate::ContractLog { block_number, log } => {
                match self.chain.decode_transfer_log(log) {
                    Ok(event) => NotificationMessage::token_transfer(
                        &log.address,
                        &event,
                        &log.transaction_hash,
                        *block_number,
                    ),
                    Err(e) => {
                        let context = LogContext::new("block_monitor", "decode_log")
                            .with_block_number(*block_number)
                            .with_transaction_hash(&log.transaction_hash)
                            .with_address(log.address.as_str())
                            .with_metadata("log_index", json!(log.log_index));
                        if e.is_non_matching() {
                            context.debug(&format!("Skipping non-Transfer log: {}", e));
                        } else {
                            context.warn(&format!("Skipping malformed Transfer log: {}", e));
                        }
                        return None;
                    }
                }
            }
        };

        let delivered = match self.sink.send(&self.config.chat_id, &message.text).await {
            Ok(()) => true,
            Err(e) => {
                ErrorLogger::log_error(
                    &WatcherError::Notification(e),
                    Some(
                        LogContext::new("block_monitor", "notify")
                            .with_block_number(candidate.block_number())
                            .with_transaction_hash(candidate.transaction_hash()),
                    ),
                );
                false
            }
        };

        MetricsLogger::log_notification(
            candidate.block_number(),
            candidate.transaction_hash(),
            candidate.kind(),
            delivered,
        );
        Some(delivered)
    }

    async fn set_state(&self, state: MonitorState) {
        self.status.write().await.state = state;
    }
}
