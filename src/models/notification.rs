use alloy_primitives::U256;

use crate::models::{Address, Transaction, TransferEvent};

/// Formatted notification text; never persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub text: String,
}

impl NotificationMessage {
    pub fn native_transfer(tx: &Transaction, symbol: &str, decimals: u8) -> Self {
        let to = match &tx.to {
            Some(address) => address.to_string(),
            None => "contract creation".to_string(),
        };

        let text = format!(
            "📢 New transaction!\n\n🔹 From: {}\n🔹 To: {}\n🔹 Value: {} {}\n🔹 Hash: {}\n🔹 Block: {}",
            tx.from,
            to,
            format_units(tx.value, decimals),
            symbol,
            tx.hash,
            tx.block_number,
        );

        Self { text }
    }

    pub fn token_transfer(contract: &Address, event: &TransferEvent, tx_hash: &str, block_number: u64) -> Self {
        let text = format!(
            "🪙 Token transfer!\n\n🔹 Token: {}\n🔹 From: {}\n🔹 To: {}\n🔹 Amount: {} (base units)\n🔹 Hash: {}\n🔹 Block: {}",
            contract,
            event.from,
            event.to,
            event.value,
            tx_hash,
            block_number,
        );

        Self { text }
    }
}

/// Render a base-unit amount as a decimal string with `decimals` places,
/// trailing zeros trimmed (`1500000000000000000`, 18 -> `1.5`).
pub fn format_units(value: U256, decimals: u8) -> String {
    if decimals == 0 {
        return value.to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = value / divisor;
    let fraction = value % divisor;

    if fraction.is_zero() {
        return whole.to_string();
    }

    let padded = format!("{:0>width$}", fraction.to_string(), width = decimals as usize);
    format!("{}.{}", whole, padded.trim_end_matches('0'))
}
