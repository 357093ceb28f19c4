use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::blockchain::{MonitorState, MonitorStatus};
use crate::store::{AddressStore, StoreError};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Server error: {0}")]
    Server(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (error, message) = match &self {
            ApiError::Store(e) => ("store_error", format!("Failed to load wallets: {}", e)),
            ApiError::Server(e) => ("server_error", e.clone()),
        };
        log::error!("{}", message);

        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
        });
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Response structure for status endpoint
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub state: MonitorState,
    pub is_running: bool,
    pub cursor: Option<u64>,
    pub latest_seen_height: Option<u64>,
    pub blocks_behind: u64,
    pub blocks_processed: u64,
    pub notifications_sent: u64,
    pub notifications_failed: u64,
    pub receipts_missing: u64,
    pub tracked_wallets: usize,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl From<&MonitorStatus> for StatusResponse {
    fn from(status: &MonitorStatus) -> Self {
        Self {
            state: status.state,
            is_running: status.is_running,
            cursor: status.cursor,
            latest_seen_height: status.latest_seen_height,
            blocks_behind: status.blocks_behind(),
            blocks_processed: status.blocks_processed,
            notifications_sent: status.notifications_sent,
            notifications_failed: status.notifications_failed,
            receipts_missing: status.receipts_missing,
            tracked_wallets: status.tracked_wallets,
            last_cycle_at: status.last_cycle_at,
            last_error: status.last_error.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WalletsResponse {
    pub wallets: Vec<String>,
    pub count: usize,
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub status: Arc<RwLock<MonitorStatus>>,
    pub store: Arc<dyn AddressStore>,
}

/// Read-only status server
pub struct ApiServer {
    state: AppState,
    pub host: String,
    pub port: u16,
}

impl ApiServer {
    pub fn new(state: AppState, host: &str, port: u16) -> Self {
        Self {
            state,
            host: host.to_string(),
            port,
        }
    }

    pub async fn start(&self) -> Result<(), ApiError> {
        let app = router(self.state.clone());

        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ApiError::Server(format!("Failed to bind to {}: {}", addr, e)))?;

        log::info!("Status API listening on {}", addr);

        axum::serve(listener, app)
            .await
            .map_err(|e| ApiError::Server(format!("Server error: {}", e)))?;

        Ok(())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(get_status))
        .route("/wallets", get(get_wallets))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /status - monitor progress and delivery counters
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let status = state.status.read().await;
    Json(StatusResponse::from(&*status))
}

/// GET /wallets - tracked addresses as stored
pub async fn get_wallets(State(state): State<AppState>) -> Result<Json<WalletsResponse>, ApiError> {
    let store = Arc::clone(&state.store);
    let addresses = tokio::task::spawn_blocking(move || store.load())
        .await
        .map_err(|e| ApiError::Server(format!("Store task failed: {}", e)))??;

    let wallets: Vec<String> = addresses.into_iter().map(String::from).collect();
    Ok(Json(WalletsResponse {
        count: wallets.len(),
        wallets,
    }))
}
