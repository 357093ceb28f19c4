use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use crate::error::ConfigError;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub rpc: RpcConfig,
    pub monitor: MonitorConfig,
    pub store: StoreConfig,
    pub telegram: TelegramConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

/// RPC client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// JSON-RPC endpoint URL
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Retries after the first attempt of each RPC call
    pub max_retries: u32,
    /// Initial retry delay in milliseconds
    pub retry_delay_ms: u64,
    /// Maximum retry delay in milliseconds
    pub max_retry_delay_ms: u64,
}

/// Block monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Delay between polls when caught up
    pub poll_interval_seconds: u64,
    /// Delay after an interrupted cycle
    pub error_backoff_seconds: u64,
    /// Ticker shown in native transfer notifications
    pub native_symbol: String,
    pub native_decimals: u8,
    /// Fetch receipts and report logs emitted by tracked contracts
    pub scan_contract_logs: bool,
}

/// Wallet store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// `json` or `sqlite`
    pub backend: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    pub api_base: String,
    /// Log notifications instead of sending them
    pub dry_run: bool,
}

/// Status API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub enabled: bool,
    pub port: u16,
    pub host: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://ink.drpc.org".to_string(),
            timeout_seconds: 30,
            max_retries: 3,
            retry_delay_ms: 500,
            max_retry_delay_ms: 5_000,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 10,
            error_backoff_seconds: 10,
            native_symbol: "INK".to_string(),
            native_decimals: 18,
            scan_contract_logs: true,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "json".to_string(),
            path: "wallets.json".to_string(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: "https://api.telegram.org".to_string(),
            dry_run: false,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 8080,
            host: "127.0.0.1".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

/// Parse an environment variable if set, reporting the key on failure
fn parse_env<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables, then validate.
    /// Environment variables take precedence over file values.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::load_unvalidated()?;
        config.validate()?;
        Ok(config)
    }

    /// File + environment, without validation. The wallet CLI only needs the
    /// store section and must work without Telegram credentials.
    pub fn load_unvalidated() -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file()?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from TOML file; a missing file yields defaults
    pub fn load_from_file() -> Result<Self, ConfigError> {
        let config_path = env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());

        if !Path::new(&config_path).exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ConfigError::FileNotFound(config_path.clone()))?;
        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parsing(e.to_string()))?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        // RPC
        if let Ok(endpoint) = env::var("INK_RPC_URL") {
            self.rpc.endpoint = endpoint;
        }
        if let Some(timeout) = parse_env("RPC_TIMEOUT_SECONDS")? {
            self.rpc.timeout_seconds = timeout;
        }
        if let Some(retries) = parse_env("RPC_MAX_RETRIES")? {
            self.rpc.max_retries = retries;
        }

        // Monitor
        if let Some(interval) = parse_env("POLL_INTERVAL_SECONDS")? {
            self.monitor.poll_interval_seconds = interval;
        }
        if let Some(backoff) = parse_env("ERROR_BACKOFF_SECONDS")? {
            self.monitor.error_backoff_seconds = backoff;
        }

        // Store
        if let Ok(path) = env::var("WALLETS_FILE") {
            self.store.path = path;
        }
        if let Ok(backend) = env::var("WALLET_STORE_BACKEND") {
            self.store.backend = backend.to_lowercase();
        }

        // Telegram
        if let Ok(token) = env::var("TELEGRAM_TOKEN") {
            self.telegram.bot_token = Some(token);
        }
        if let Ok(chat_id) = env::var("CHAT_ID") {
            self.telegram.chat_id = Some(chat_id);
        }
        if let Some(dry_run) = parse_env("NOTIFY_DRY_RUN")? {
            self.telegram.dry_run = dry_run;
        }

        // API
        if let Some(enabled) = parse_env("API_ENABLED")? {
            self.api.enabled = enabled;
        }
        if let Some(port) = parse_env("API_PORT")? {
            self.api.port = port;
        }
        if let Ok(host) = env::var("API_HOST") {
            self.api.host = host;
        }

        // Logging
        if let Ok(level) = env::var("LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }
        if let Ok(format) = env::var("LOG_FORMAT") {
            self.logging.format = format.to_lowercase();
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rpc.endpoint.starts_with("http://") && !self.rpc.endpoint.starts_with("https://") {
            return Err(ConfigError::InvalidUrl(self.rpc.endpoint.clone()));
        }

        if self.rpc.timeout_seconds == 0 || self.rpc.timeout_seconds > 300 {
            return Err(ConfigError::InvalidValue {
                key: "rpc.timeout_seconds".to_string(),
                value: self.rpc.timeout_seconds.to_string(),
            });
        }

        if self.rpc.max_retries > 20 {
            return Err(ConfigError::InvalidValue {
                key: "rpc.max_retries".to_string(),
                value: self.rpc.max_retries.to_string(),
            });
        }

        if self.monitor.poll_interval_seconds == 0 || self.monitor.poll_interval_seconds > 3600 {
            return Err(ConfigError::InvalidValue {
                key: "monitor.poll_interval_seconds".to_string(),
                value: self.monitor.poll_interval_seconds.to_string(),
            });
        }

        if self.monitor.error_backoff_seconds == 0 || self.monitor.error_backoff_seconds > 3600 {
            return Err(ConfigError::InvalidValue {
                key: "monitor.error_backoff_seconds".to_string(),
                value: self.monitor.error_backoff_seconds.to_string(),
            });
        }

        if self.monitor.native_decimals > 77 {
            return Err(ConfigError::InvalidValue {
                key: "monitor.native_decimals".to_string(),
                value: self.monitor.native_decimals.to_string(),
            });
        }

        let valid_backends = ["json", "sqlite"];
        if !valid_backends.contains(&self.store.backend.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "store.backend".to_string(),
                value: self.store.backend.clone(),
            });
        }

        if self.store.path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "store.path".to_string(),
                value: self.store.path.clone(),
            });
        }

        if !self.telegram.dry_run {
            if self.telegram.bot_token.as_deref().map_or(true, |t| t.trim().is_empty()) {
                return Err(ConfigError::MissingEnvVar("TELEGRAM_TOKEN".to_string()));
            }
            if self.telegram.chat_id.as_deref().map_or(true, |c| c.trim().is_empty()) {
                return Err(ConfigError::MissingEnvVar("CHAT_ID".to_string()));
            }
            if !self.telegram.api_base.starts_with("http://") && !self.telegram.api_base.starts_with("https://") {
                return Err(ConfigError::InvalidUrl(self.telegram.api_base.clone()));
            }
        }

        if self.api.enabled && self.api.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "api.port".to_string(),
                value: self.api.port.to_string(),
            });
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                value: self.logging.level.clone(),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                value: self.logging.format.clone(),
            });
        }

        Ok(())
    }

    /// Chat that receives notifications; empty in dry-run without a chat id
    pub fn chat_id(&self) -> String {
        self.telegram.chat_id.clone().unwrap_or_default()
    }

    /// Generate a sample configuration file
    pub fn generate_sample_config() -> Result<String, ConfigError> {
        let config = Self::default();
        toml::to_string_pretty(&config)
            .map_err(|e| ConfigError::Parsing(e.to_string()))
    }
}
