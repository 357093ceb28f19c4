pub mod address;
pub mod chain;
pub mod transfer;
pub mod notification;

pub use address::{Address, TrackedSet, strip_hex_prefix};
pub use chain::{Block, Transaction, Receipt, LogEntry};
pub use transfer::{TransferEvent, MatchCandidate};
pub use notification::{NotificationMessage, format_units};
