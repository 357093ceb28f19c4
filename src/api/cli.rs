use clap::{Parser, Subcommand};
use std::sync::Arc;
use thiserror::Error;

use crate::error::ValidationError;
use crate::logging::LogContext;
use crate::models::Address;
use crate::store::{AddressStore, StoreError};

#[derive(Error, Debug)]
pub enum CliError {
    #[error("❌ {0}")]
    Validation(#[from] ValidationError),
    #[error("Wallet store error: {0}")]
    Store(#[from] StoreError),
}

/// Manage the wallets watched for on-chain activity
#[derive(Parser, Debug)]
#[command(name = "wallets", version, about)]
pub struct Cli {
    /// Wallet store path (overrides WALLETS_FILE and the config file)
    #[arg(long, global = true)]
    pub store: Option<String>,

    /// Store backend: json or sqlite
    #[arg(long, global = true)]
    pub backend: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start tracking a wallet
    Add { address: String },
    /// Stop tracking a wallet
    Remove { address: String },
    /// Show tracked wallets
    List,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added(Address),
    AlreadyTracked(Address),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed(Address),
    NotTracked(Address),
}

/// Add/remove/list over any [`AddressStore`]. Each mutation is a full
/// load-modify-save, so the monitor sees either the old or the new set.
pub struct WalletRegistry {
    store: Arc<dyn AddressStore>,
}

impl WalletRegistry {
    pub fn new(store: Arc<dyn AddressStore>) -> Self {
        Self { store }
    }

    pub fn add(&self, raw: &str) -> Result<AddOutcome, CliError> {
        let address = Address::parse(raw)?;
        let mut wallets = self.store.load()?;

        if wallets.contains(&address) {
            return Ok(AddOutcome::AlreadyTracked(address));
        }

        wallets.push(address.clone());
        self.store.save(&wallets)?;

        LogContext::new("wallets", "add")
            .with_address(address.as_str())
            .info("Wallet added");
        Ok(AddOutcome::Added(address))
    }

    pub fn remove(&self, raw: &str) -> Result<RemoveOutcome, CliError> {
        let address = Address::parse(raw)?;
        let mut wallets = self.store.load()?;

        let before = wallets.len();
        wallets.retain(|tracked| tracked != &address);
        if wallets.len() == before {
            return Ok(RemoveOutcome::NotTracked(address));
        }

        self.store.save(&wallets)?;

        LogContext::new("wallets", "remove")
            .with_address(address.as_str())
            .info("Wallet removed");
        Ok(RemoveOutcome::Removed(address))
    }

    pub fn list(&self) -> Result<Vec<Address>, CliError> {
        Ok(self.store.load()?)
    }
}

/// Turns commands into user-facing replies
pub struct CliHandler {
    registry: WalletRegistry,
}

impl CliHandler {
    pub fn new(store: Arc<dyn AddressStore>) -> Self {
        Self {
            registry: WalletRegistry::new(store),
        }
    }

    pub fn execute_command(&self, command: &Commands) -> Result<String, CliError> {
        let reply = match command {
            Commands::Add { address } => match self.registry.add(address)? {
                AddOutcome::Added(address) => format!("✅ Added wallet {} to monitoring", address),
                AddOutcome::AlreadyTracked(address) => format!("⚠️ Wallet {} is already tracked", address),
            },
            Commands::Remove { address } => match self.registry.remove(address)? {
                RemoveOutcome::Removed(address) => format!("✅ Removed wallet {} from monitoring", address),
                RemoveOutcome::NotTracked(address) => format!("⚠️ Wallet {} is not tracked", address),
            },
            Commands::List => {
                let wallets = self.registry.list()?;
                if wallets.is_empty() {
                    "🚫 No wallets are being tracked".to_string()
                } else {
                    let lines: Vec<String> = wallets.iter().map(Address::to_string).collect();
                    format!("📜 Tracked wallets:\n{}", lines.join("\n"))
                }
            }
        };

        Ok(reply)
    }
}
