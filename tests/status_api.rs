use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::util::ServiceExt;

use ink_wallet_watch::api::{router, ApiError, AppState};
use ink_wallet_watch::blockchain::{MonitorState, MonitorStatus};
use ink_wallet_watch::models::Address;
use ink_wallet_watch::store::{AddressStore, InMemoryStore, StoreError};

struct BrokenStore;

impl AddressStore for BrokenStore {
    fn load(&self) -> Result<Vec<Address>, StoreError> {
        Err(StoreError::Operation("disk unplugged".to_string()))
    }

    fn save(&self, _addresses: &[Address]) -> Result<(), StoreError> {
        Ok(())
    }

    fn describe(&self) -> String {
        "broken".to_string()
    }
}

fn state_with(status: MonitorStatus, store: Arc<dyn AddressStore>) -> AppState {
    AppState {
        status: Arc::new(RwLock::new(status)),
        store,
    }
}

async fn get_json(state: AppState, uri: &str) -> (StatusCode, Value) {
    let response = router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_endpoint() {
    let state = state_with(MonitorStatus::default(), Arc::new(InMemoryStore::new()));
    let (status, body) = get_json(state, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_status_endpoint_reports_progress() {
    let monitor_status = MonitorStatus {
        state: MonitorState::Waiting,
        cursor: Some(1_000),
        latest_seen_height: Some(1_004),
        blocks_processed: 12,
        notifications_sent: 3,
        notifications_failed: 1,
        receipts_missing: 5,
        tracked_wallets: 2,
        is_running: true,
        ..MonitorStatus::default()
    };
    let state = state_with(monitor_status, Arc::new(InMemoryStore::new()));

    let (status, body) = get_json(state, "/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "waiting");
    assert_eq!(body["cursor"], 1_000);
    assert_eq!(body["blocks_behind"], 4);
    assert_eq!(body["blocks_processed"], 12);
    assert_eq!(body["notifications_sent"], 3);
    assert_eq!(body["notifications_failed"], 1);
    assert_eq!(body["receipts_missing"], 5);
    assert_eq!(body["tracked_wallets"], 2);
    assert_eq!(body["is_running"], true);
    assert!(body["last_error"].is_null());
}

#[tokio::test]
async fn test_status_reflects_shared_updates() {
    let state = state_with(MonitorStatus::default(), Arc::new(InMemoryStore::new()));
    state.status.write().await.cursor = Some(77);

    let (_, body) = get_json(state, "/status").await;
    assert_eq!(body["cursor"], 77);
    assert_eq!(body["state"], "idle");
}

#[tokio::test]
async fn test_wallets_endpoint_lists_store_contents() {
    let store = InMemoryStore::with_addresses(vec![
        Address::parse("0xF977814e90dA44bFA03b6295A0616a897441aceC").unwrap(),
        Address::parse("0x1111111111111111111111111111111111111111").unwrap(),
    ]);
    let state = state_with(MonitorStatus::default(), Arc::new(store));

    let (status, body) = get_json(state, "/wallets").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["wallets"][0], "0xf977814e90da44bfa03b6295a0616a897441acec");
    assert_eq!(body["wallets"][1], "0x1111111111111111111111111111111111111111");
}

#[tokio::test]
async fn test_wallets_endpoint_store_failure() {
    let state = state_with(MonitorStatus::default(), Arc::new(BrokenStore));

    let (status, body) = get_json(state, "/wallets").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "store_error");
    assert_eq!(body["message"], "Failed to load wallets: Wallet store operation failed: disk unplugged");
}

#[tokio::test]
async fn test_server_error_renders_json_body() {
    let response = ApiError::Server("listener closed".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "server_error");
    assert_eq!(body["message"], "listener closed");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let state = state_with(MonitorStatus::default(), Arc::new(InMemoryStore::new()));
    let response = router(state)
        .oneshot(Request::builder().uri("/balances").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
