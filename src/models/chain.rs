use alloy_primitives::U256;

use crate::models::Address;

/// A block fetched with full transaction bodies
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub number: u64,
    pub hash: String,
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub hash: String,
    pub from: Address,
    /// `None` for contract creation
    pub to: Option<Address>,
    /// Native currency amount in base units
    pub value: U256,
    pub block_number: u64,
    pub transaction_index: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub transaction_hash: String,
    pub logs: Vec<LogEntry>,
}

/// A raw contract log; topics and data stay hex-encoded until decoded
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<String>,
    pub data: String,
    pub log_index: u32,
    pub transaction_hash: String,
}

impl Transaction {
    /// True if either side of the transfer is tracked
    pub fn touches(&self, tracked: &crate::models::TrackedSet) -> bool {
        tracked.contains(&self.from) || self.to.as_ref().map_or(false, |to| tracked.contains(to))
    }
}
