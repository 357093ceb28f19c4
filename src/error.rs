use thiserror::Error;

use crate::blockchain::block_monitor::MonitorError;
use crate::blockchain::event_decoder::DecodeError;
use crate::notification::NotificationError;
use crate::store::StoreError;

/// Main error type for the wallet watcher
#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    #[error("Monitor error: {0}")]
    Monitor(#[from] MonitorError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("System error: {0}")]
    System(#[from] SystemError),
}

/// RPC-related errors
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RPC method error: code={code}, message={message}")]
    Method { code: i32, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Rate limit exceeded, retry after {seconds} seconds")]
    RateLimit { seconds: u64 },

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Block not found: {block_number}")]
    BlockNotFound { block_number: u64 },

    #[error("Transaction receipt not found: {tx_hash}")]
    TransactionNotFound { tx_hash: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parsing failed: {0}")]
    Parsing(String),

    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
}

/// Validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// System-level errors
#[derive(Error, Debug)]
pub enum SystemError {
    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Task failed: {0}")]
    Task(String),

    #[error("Server error: {0}")]
    Server(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, WatcherError>;

/// Error severity levels for logging and monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Errors that stop the process
    Critical,
    /// Errors that affect functionality
    High,
    /// Errors that may delay monitoring
    Medium,
    /// Mostly informational
    Low,
}

impl RpcError {
    /// Whether retrying the same call can succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            RpcError::Timeout { .. } => true,
            RpcError::RateLimit { .. } => true,
            RpcError::Connection(_) => true,
            RpcError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),

            // Not-yet-available data is handled by the monitor, not by retries
            RpcError::BlockNotFound { .. } => false,
            RpcError::TransactionNotFound { .. } => false,
            RpcError::Json(_) => false,
            RpcError::Method { .. } => false,
            RpcError::InvalidResponse(_) => false,
        }
    }

    /// True when the endpoint could not be reached or answered garbage
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            RpcError::Http(_)
                | RpcError::Json(_)
                | RpcError::Timeout { .. }
                | RpcError::Connection(_)
                | RpcError::InvalidResponse(_)
        )
    }

    /// Suggested delay in seconds before the next attempt
    pub fn retry_delay(&self) -> Option<u64> {
        if !self.is_recoverable() {
            return None;
        }

        match self {
            RpcError::RateLimit { seconds } => Some(*seconds),
            RpcError::Timeout { .. } => Some(5),
            RpcError::Connection(_) => Some(10),
            _ => Some(5),
        }
    }
}

impl WatcherError {
    /// Get the severity level of an error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            WatcherError::Config(_) => ErrorSeverity::Critical,
            WatcherError::Store(StoreError::Malformed { .. }) => ErrorSeverity::Critical,
            WatcherError::System(_) => ErrorSeverity::Critical,

            WatcherError::Rpc(RpcError::Connection(_)) => ErrorSeverity::High,
            WatcherError::Monitor(_) => ErrorSeverity::High,
            WatcherError::Store(_) => ErrorSeverity::High,

            WatcherError::Rpc(RpcError::BlockNotFound { .. }) => ErrorSeverity::Low,
            WatcherError::Rpc(RpcError::TransactionNotFound { .. }) => ErrorSeverity::Low,
            WatcherError::Decode(DecodeError::NotTransferEvent { .. }) => ErrorSeverity::Low,
            WatcherError::Validation(_) => ErrorSeverity::Low,

            WatcherError::Rpc(_) => ErrorSeverity::Medium,
            WatcherError::Decode(_) => ErrorSeverity::Medium,
            WatcherError::Notification(_) => ErrorSeverity::Medium,
        }
    }

    /// Check if the error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            WatcherError::Rpc(e) => e.is_recoverable(),
            WatcherError::Notification(NotificationError::RateLimited { .. }) => true,
            _ => false,
        }
    }

    /// Get suggested retry delay in seconds for recoverable errors
    pub fn retry_delay(&self) -> Option<u64> {
        match self {
            WatcherError::Rpc(e) => e.retry_delay(),
            WatcherError::Notification(NotificationError::RateLimited { retry_after }) => Some(*retry_after),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let critical_error = WatcherError::Config(ConfigError::MissingEnvVar("TELEGRAM_TOKEN".to_string()));
        assert_eq!(critical_error.severity(), ErrorSeverity::Critical);

        let malformed_store = WatcherError::Store(StoreError::Malformed {
            path: "wallets.json".to_string(),
            reason: "expected value".to_string(),
        });
        assert_eq!(malformed_store.severity(), ErrorSeverity::Critical);

        let medium_error = WatcherError::Rpc(RpcError::Timeout { seconds: 30 });
        assert_eq!(medium_error.severity(), ErrorSeverity::Medium);

        let low_error = WatcherError::Rpc(RpcError::BlockNotFound { block_number: 123 });
        assert_eq!(low_error.severity(), ErrorSeverity::Low);
    }

    #[test]
    fn test_rpc_error_recoverability() {
        assert!(RpcError::Timeout { seconds: 30 }.is_recoverable());
        assert!(RpcError::RateLimit { seconds: 60 }.is_recoverable());
        assert!(RpcError::Connection("refused".to_string()).is_recoverable());

        assert!(!RpcError::BlockNotFound { block_number: 1 }.is_recoverable());
        assert!(!RpcError::TransactionNotFound { tx_hash: "0xabc".to_string() }.is_recoverable());
        assert!(!RpcError::InvalidResponse("garbage".to_string()).is_recoverable());
    }

    #[test]
    fn test_connectivity_classification() {
        assert!(RpcError::Connection("refused".to_string()).is_connectivity());
        assert!(RpcError::InvalidResponse("not hex".to_string()).is_connectivity());
        assert!(!RpcError::BlockNotFound { block_number: 5 }.is_connectivity());
        assert!(!RpcError::Method { code: -32601, message: "Method not found".to_string() }.is_connectivity());
    }

    #[test]
    fn test_retry_delay() {
        let timeout_error = WatcherError::Rpc(RpcError::Timeout { seconds: 30 });
        assert_eq!(timeout_error.retry_delay(), Some(5));

        let rate_limit_error = WatcherError::Rpc(RpcError::RateLimit { seconds: 60 });
        assert_eq!(rate_limit_error.retry_delay(), Some(60));

        let throttled = WatcherError::Notification(NotificationError::RateLimited { retry_after: 7 });
        assert!(throttled.is_recoverable());
        assert_eq!(throttled.retry_delay(), Some(7));

        let non_recoverable = WatcherError::Config(ConfigError::MissingEnvVar("CHAT_ID".to_string()));
        assert_eq!(non_recoverable.retry_delay(), None);
    }

    #[test]
    fn test_error_display() {
        let error = WatcherError::Rpc(RpcError::Method {
            code: -32601,
            message: "Method not found".to_string(),
        });
        assert_eq!(format!("{}", error), "RPC error: RPC method error: code=-32601, message=Method not found");

        let error = WatcherError::Rpc(RpcError::TransactionNotFound { tx_hash: "0xfeed".to_string() });
        assert_eq!(format!("{}", error), "RPC error: Transaction receipt not found: 0xfeed");
    }

    #[test]
    fn test_error_chain() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Access denied");
        let system_error = SystemError::FileSystem(io_error);
        let watcher_error = WatcherError::System(system_error);

        assert!(format!("{}", watcher_error).contains("File system error"));
    }
}
