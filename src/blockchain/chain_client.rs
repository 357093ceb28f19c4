use async_trait::async_trait;

use crate::blockchain::event_decoder::{decode_transfer_log, DecodeError};
use crate::blockchain::rpc_client::RpcClient;
use crate::error::RpcError;
use crate::models::{Block, LogEntry, Receipt, TransferEvent};

/// Chain access used by the monitor. Injected as `Arc<dyn ChainClient>` so
/// tests can drive cycles against a scripted chain.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Latest block height known to the node
    async fn current_height(&self) -> Result<u64, RpcError>;

    /// Block with full transaction bodies; `BlockNotFound` when not produced yet
    async fn get_block(&self, height: u64) -> Result<Block, RpcError>;

    /// `TransactionNotFound` when the node cannot locate the receipt
    async fn get_receipt(&self, tx_hash: &str) -> Result<Receipt, RpcError>;

    fn decode_transfer_log(&self, log: &LogEntry) -> Result<TransferEvent, DecodeError> {
        decode_transfer_log(log)
    }
}

#[async_trait]
impl ChainClient for RpcClient {
    async fn current_height(&self) -> Result<u64, RpcError> {
        self.get_latest_block_number().await
    }

    async fn get_block(&self, height: u64) -> Result<Block, RpcError> {
        RpcClient::get_block(self, height).await
    }

    async fn get_receipt(&self, tx_hash: &str) -> Result<Receipt, RpcError> {
        self.get_transaction_receipt(tx_hash).await
    }
}
