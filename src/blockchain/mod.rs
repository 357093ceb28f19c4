pub mod block_monitor;
pub mod chain_client;
pub mod event_decoder;
pub mod rpc_client;
pub mod transaction_scanner;

pub use block_monitor::{
    BlockCursor, BlockMonitor, BlockMonitorConfig, CycleInterruption, CycleReport, MonitorError,
    MonitorState, MonitorStatus, Sleeper, TokioSleeper,
};
pub use chain_client::ChainClient;
pub use event_decoder::{decode_transfer_log, DecodeError, TRANSFER_EVENT_SIGNATURE};
pub use rpc_client::RpcClient;
pub use transaction_scanner::{ScanResult, TransactionScanner};
