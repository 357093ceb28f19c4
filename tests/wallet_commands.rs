use std::fs;
use tempfile::TempDir;

use ink_wallet_watch::api::{CliError, CliHandler, Commands};
use ink_wallet_watch::config::StoreConfig;
use ink_wallet_watch::store::{open_store, StoreError};

const WHALE: &str = "0xF977814e90dA44bFA03b6295A0616a897441aceC";
const OTHER: &str = "0x1111111111111111111111111111111111111111";

fn store_config(dir: &TempDir, backend: &str, file: &str) -> StoreConfig {
    StoreConfig {
        backend: backend.to_string(),
        path: dir.path().join(file).to_string_lossy().into_owned(),
    }
}

fn handler(config: &StoreConfig) -> CliHandler {
    CliHandler::new(open_store(config).unwrap())
}

fn add(address: &str) -> Commands {
    Commands::Add { address: address.to_string() }
}

fn remove(address: &str) -> Commands {
    Commands::Remove { address: address.to_string() }
}

#[test]
fn test_json_store_workflow_persists_across_handlers() {
    let dir = TempDir::new().unwrap();
    let config = store_config(&dir, "json", "wallets.json");

    let reply = handler(&config).execute_command(&Commands::List).unwrap();
    assert_eq!(reply, "🚫 No wallets are being tracked");

    let reply = handler(&config).execute_command(&add(WHALE)).unwrap();
    assert_eq!(
        reply,
        "✅ Added wallet 0xf977814e90da44bfa03b6295a0616a897441acec to monitoring"
    );

    // Same wallet in a different case is the same wallet
    let reply = handler(&config).execute_command(&add(&WHALE.to_uppercase())).unwrap();
    assert!(reply.starts_with("⚠️"));

    handler(&config).execute_command(&add(OTHER)).unwrap();

    let reply = handler(&config).execute_command(&Commands::List).unwrap();
    assert_eq!(
        reply,
        format!(
            "📜 Tracked wallets:\n{}\n{}",
            WHALE.to_lowercase(),
            OTHER
        )
    );

    let on_disk: Vec<String> = serde_json::from_str(&fs::read_to_string(&config.path).unwrap()).unwrap();
    assert_eq!(on_disk, vec![WHALE.to_lowercase(), OTHER.to_string()]);

    let reply = handler(&config).execute_command(&remove(WHALE)).unwrap();
    assert!(reply.starts_with("✅ Removed wallet"));

    let reply = handler(&config).execute_command(&remove(WHALE)).unwrap();
    assert!(reply.contains("is not tracked"));

    let on_disk: Vec<String> = serde_json::from_str(&fs::read_to_string(&config.path).unwrap()).unwrap();
    assert_eq!(on_disk, vec![OTHER.to_string()]);
}

#[test]
fn test_sqlite_store_workflow() {
    let dir = TempDir::new().unwrap();
    let config = store_config(&dir, "sqlite", "wallets.db");

    handler(&config).execute_command(&add(OTHER)).unwrap();
    handler(&config).execute_command(&add(WHALE)).unwrap();

    let reply = handler(&config).execute_command(&Commands::List).unwrap();
    let lines: Vec<&str> = reply.lines().skip(1).collect();
    assert_eq!(lines, vec![OTHER, &WHALE.to_lowercase()[..]]);

    handler(&config).execute_command(&remove(OTHER)).unwrap();
    let reply = handler(&config).execute_command(&Commands::List).unwrap();
    assert!(!reply.contains(OTHER));
}

#[test]
fn test_invalid_address_leaves_store_untouched() {
    let dir = TempDir::new().unwrap();
    let config = store_config(&dir, "json", "wallets.json");
    handler(&config).execute_command(&add(OTHER)).unwrap();
    let before = fs::read_to_string(&config.path).unwrap();

    for bad in ["0x123", "0xF977814e90dA44bFA03b6295A0616a897441aceC0", "0xZZ77814e90dA44bFA03b6295A0616a897441aceC"] {
        let result = handler(&config).execute_command(&add(bad));
        match result {
            Err(error @ CliError::Validation(_)) => assert!(error.to_string().starts_with("❌")),
            other => panic!("expected validation error for {}, got {:?}", bad, other),
        }
    }

    assert_eq!(fs::read_to_string(&config.path).unwrap(), before);
}

#[test]
fn test_malformed_store_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let config = store_config(&dir, "json", "wallets.json");
    fs::write(&config.path, "[\"0x1111111111111111111111111111111111111111\",").unwrap();

    let result = handler(&config).execute_command(&Commands::List);
    assert!(matches!(result, Err(CliError::Store(StoreError::Malformed { .. }))));
}

#[test]
fn test_unknown_backend_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = store_config(&dir, "redis", "wallets");

    assert!(matches!(open_store(&config), Err(StoreError::UnknownBackend(name)) if name == "redis"));
}
