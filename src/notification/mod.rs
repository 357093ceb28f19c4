pub mod telegram;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::TelegramConfig;
use crate::logging::LogContext;

pub use telegram::TelegramNotifier;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate limited by messaging API, retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    #[error("Messaging API rejected message: code={code}, description={description}")]
    Api { code: u16, description: String },

    #[error("Notifier configuration error: {0}")]
    Config(String),
}

/// Outbound message channel. Delivery is best effort: callers log failures
/// and move on.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), NotificationError>;

    fn name(&self) -> &'static str;
}

/// Dry-run sink: writes each message to the log instead of sending it
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), NotificationError> {
        LogContext::new("notification", "dry_run")
            .with_metadata("chat_id", serde_json::json!(chat_id))
            .with_metadata("text", serde_json::json!(text))
            .info("Notification (dry run)");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Pick the sink for the given config: Telegram, or the log in dry-run mode
pub fn build_sink(config: &TelegramConfig) -> Result<Arc<dyn NotificationSink>, NotificationError> {
    if config.dry_run {
        return Ok(Arc::new(LogNotifier));
    }

    let token = config
        .bot_token
        .as_deref()
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| NotificationError::Config("Telegram bot token is not set".to_string()))?;

    Ok(Arc::new(TelegramNotifier::new(&config.api_base, token)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_notifier_always_succeeds() {
        let sink = LogNotifier;
        assert!(tokio_test::block_on(sink.send("123", "hello")).is_ok());
        assert_eq!(sink.name(), "log");
    }

    #[test]
    fn test_build_sink() {
        let mut config = TelegramConfig {
            dry_run: true,
            ..TelegramConfig::default()
        };
        assert_eq!(build_sink(&config).unwrap().name(), "log");

        config.dry_run = false;
        assert!(matches!(build_sink(&config), Err(NotificationError::Config(_))));

        config.bot_token = Some("42:secret".to_string());
        assert_eq!(build_sink(&config).unwrap().name(), "telegram");
    }
}
