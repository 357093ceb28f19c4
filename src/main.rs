use std::process;
use std::sync::Arc;

use ink_wallet_watch::api::{ApiServer, AppState};
use ink_wallet_watch::blockchain::{BlockMonitor, BlockMonitorConfig, RpcClient};
use ink_wallet_watch::config::AppConfig;
use ink_wallet_watch::error::{SystemError, WatcherError};
use ink_wallet_watch::logging::{init_logging, ErrorLogger, LogContext};
use ink_wallet_watch::notification::build_sink;
use ink_wallet_watch::store::open_store;
use serde_json::json;

#[tokio::main]
async fn main() {
    // A missing .env is fine; real environment variables still apply
    dotenvy::dotenv().ok();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            process::exit(2);
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = run(config).await {
        ErrorLogger::log_error(&e, Some(LogContext::new("main", "startup")));
        match &e {
            WatcherError::Rpc(rpc) if rpc.is_connectivity() => {
                eprintln!("Fatal: RPC endpoint unreachable, check INK_RPC_URL ({})", rpc)
            }
            _ => eprintln!("Fatal: {}", e),
        }
        process::exit(1);
    }
}

async fn run(config: AppConfig) -> Result<(), WatcherError> {
    let context = LogContext::new("main", "startup")
        .with_metadata("endpoint", json!(config.rpc.endpoint))
        .with_metadata("store", json!(format!("{}:{}", config.store.backend, config.store.path)));
    context.info("Starting INK wallet watcher");

    let store = open_store(&config.store)?;
    // Fail fast on a malformed wallet file instead of at the first block
    let loader = Arc::clone(&store);
    let wallets = tokio::task::spawn_blocking(move || loader.load())
        .await
        .map_err(|e| SystemError::Task(format!("Wallet store load failed: {}", e)))??;
    LogContext::new("main", "startup")
        .with_metadata("tracked_wallets", json!(wallets.len()))
        .info(&format!("Loaded {} tracked wallets from {}", wallets.len(), store.describe()));

    let rpc_client = RpcClient::from_config(&config.rpc)?;
    let start_height = rpc_client.verify_connectivity().await?;

    let sink = build_sink(&config.telegram)?;

    let mut monitor = BlockMonitor::new(
        Arc::new(rpc_client),
        Arc::clone(&store),
        sink,
        BlockMonitorConfig::from_app_config(&config),
    )
    .with_cursor(start_height);
    monitor.initialize().await?;

    let shutdown = monitor.shutdown_handle();
    let status = monitor.status_handle();

    if config.api.enabled {
        let server = ApiServer::new(
            AppState {
                status: Arc::clone(&status),
                store: Arc::clone(&store),
            },
            &config.api.host,
            config.api.port,
        );
        tokio::spawn(async move {
            if let Err(e) = server.start().await {
                log::error!("Status API stopped: {}", e);
            }
        });
    }

    let mut monitor_task = tokio::spawn(async move { monitor.run().await });

    tokio::select! {
        result = &mut monitor_task => {
            result.map_err(|e| SystemError::Task(e.to_string()))?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(SystemError::FileSystem)?;
            LogContext::new("main", "shutdown").info("Received shutdown signal");
            shutdown.store(true, std::sync::atomic::Ordering::Relaxed);
            // The loop only checks the flag between cycles; don't wait out a sleep or a slow RPC
            monitor_task.abort();
        }
    }

    let final_status = status.read().await;
    LogContext::new("main", "shutdown")
        .with_metadata("cursor", json!(final_status.cursor))
        .with_metadata("notifications_sent", json!(final_status.notifications_sent))
        .info("Watcher stopped");

    Ok(())
}
