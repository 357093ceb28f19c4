pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod notification;
pub mod retry;
pub mod store;

pub use blockchain::{BlockMonitor, BlockMonitorConfig, ChainClient, RpcClient};
pub use config::{ApiConfig, AppConfig, LoggingConfig, MonitorConfig, RpcConfig, StoreConfig, TelegramConfig};
pub use error::{Result, WatcherError};
pub use logging::{ErrorLogger, LogContext, MetricsLogger, PerformanceMonitor};
pub use notification::{NotificationSink, TelegramNotifier};
pub use retry::{RetryConfig, RetryManager};
pub use store::AddressStore;
