use serde_json::json;

use crate::blockchain::chain_client::ChainClient;
use crate::error::RpcError;
use crate::logging::LogContext;
use crate::models::{Block, MatchCandidate, TrackedSet};

/// Candidates found in one block, in scan order
#[derive(Debug, Default)]
pub struct ScanResult {
    pub candidates: Vec<MatchCandidate>,
    pub receipts_fetched: u32,
    /// Transactions whose receipt the node could not locate
    pub receipts_missing: u32,
}

/// Finds the parts of a block that touch tracked addresses
#[derive(Debug, Clone)]
pub struct TransactionScanner {
    scan_contract_logs: bool,
}

impl Default for TransactionScanner {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TransactionScanner {
    pub fn new(scan_contract_logs: bool) -> Self {
        Self { scan_contract_logs }
    }

    /// Scan one block.
    ///
    /// For each transaction in block order: a `NativeTransfer` if its sender
    /// or recipient is tracked, then every log in its receipt emitted by a
    /// tracked address, in log order. A missing receipt skips that
    /// transaction's logs only. Any other RPC failure aborts the scan so the
    /// caller can retry the whole block.
    pub async fn scan_block(
        &self,
        client: &dyn ChainClient,
        block: &Block,
        tracked: &TrackedSet,
    ) -> Result<ScanResult, RpcError> {
        let mut result = ScanResult::default();

        if tracked.is_empty() {
            return Ok(result);
        }

        for tx in &block.transactions {
            if tx.touches(tracked) {
                result.candidates.push(MatchCandidate::NativeTransfer {
                    block_number: block.number,
                    transaction: tx.clone(),
                });
            }

            if !self.scan_contract_logs {
                continue;
            }

            let receipt = match client.get_receipt(&tx.hash).await {
                Ok(receipt) => {
                    result.receipts_fetched += 1;
                    receipt
                }
                Err(RpcError::TransactionNotFound { tx_hash }) => {
                    result.receipts_missing += 1;
                    LogContext::new("scanner", "get_receipt")
                        .with_block_number(block.number)
                        .with_transaction_hash(&tx_hash)
                        .warn("Receipt not found, skipping transaction logs");
                    continue;
                }
                Err(e) => return Err(e),
            };

            for log in receipt.logs {
                if tracked.contains(&log.address) {
                    result.candidates.push(MatchCandidate::ContractLog {
                        block_number: block.number,
                        log,
                    });
                }
            }
        }

        LogContext::new("scanner", "scan_block")
            .with_block_number(block.number)
            .with_metadata("candidates", json!(result.candidates.len()))
            .with_metadata("receipts_fetched", json!(result.receipts_fetched))
            .with_metadata("receipts_missing", json!(result.receipts_missing))
            .trace("Block scanned");

        Ok(result)
    }
}
