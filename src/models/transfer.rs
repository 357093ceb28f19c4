use alloy_primitives::U256;

use crate::models::{Address, LogEntry, Transaction};

/// Decoded ERC-20 `Transfer(address,address,uint256)` event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEvent {
    pub from: Address,
    pub to: Address,
    pub value: U256,
}

/// Something in a block that touches a tracked address, in scan order
#[derive(Debug, Clone, PartialEq)]
pub enum MatchCandidate {
    /// Native currency transaction sent or received by a tracked wallet
    NativeTransfer {
        block_number: u64,
        transaction: Transaction,
    },
    /// Log emitted by a tracked contract address
    ContractLog {
        block_number: u64,
        log: LogEntry,
    },
}

impl MatchCandidate {
    pub fn block_number(&self) -> u64 {
        match self {
            MatchCandidate::NativeTransfer { block_number, .. } => *block_number,
            MatchCandidate::ContractLog { block_number, .. } => *block_number,
        }
    }

    pub fn transaction_hash(&self) -> &str {
        match self {
            MatchCandidate::NativeTransfer { transaction, .. } => &transaction.hash,
            MatchCandidate::ContractLog { log, .. } => &log.transaction_hash,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MatchCandidate::NativeTransfer { .. } => "native_transfer",
            MatchCandidate::ContractLog { .. } => "contract_log",
        }
    }
}
