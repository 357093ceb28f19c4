use alloy_primitives::U256;
use thiserror::Error;

use crate::models::{strip_hex_prefix, Address, LogEntry, TransferEvent};

/// ERC-20 Transfer event: Transfer(address indexed from, address indexed to, uint256 value)
pub const TRANSFER_EVENT_ABI: &str = "Transfer(address,address,uint256)";

/// keccak256 of [`TRANSFER_EVENT_ABI`], the expected topic0
pub const TRANSFER_EVENT_SIGNATURE: &str = "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

/// signature + from + to
const TRANSFER_TOPIC_COUNT: usize = 3;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// The log is some other event; not a failure of the log itself
    #[error("Not a Transfer event (topic0={topic0})")]
    NotTransferEvent { topic0: String },

    #[error("Expected {expected} topics, got {got}")]
    TopicCount { expected: usize, got: usize },

    #[error("Malformed topic {index}: {reason}")]
    MalformedTopic { index: usize, reason: String },

    #[error("Malformed data: {0}")]
    MalformedData(String),
}

impl DecodeError {
    /// Distinguishes "different event" from "broken Transfer-shaped log"
    pub fn is_non_matching(&self) -> bool {
        matches!(self, DecodeError::NotTransferEvent { .. })
    }
}

/// Decode a log into a [`TransferEvent`]. Pure: no I/O, same input gives same output.
pub fn decode_transfer_log(log: &LogEntry) -> Result<TransferEvent, DecodeError> {
    let topic0 = match log.topics.first() {
        Some(topic) => topic,
        None => {
            return Err(DecodeError::NotTransferEvent {
                topic0: "<none>".to_string(),
            })
        }
    };

    if !is_transfer_signature(topic0) {
        return Err(DecodeError::NotTransferEvent {
            topic0: topic0.clone(),
        });
    }

    // ERC-721 shares the signature but indexes the token id as a fourth topic
    if log.topics.len() != TRANSFER_TOPIC_COUNT {
        return Err(DecodeError::TopicCount {
            expected: TRANSFER_TOPIC_COUNT,
            got: log.topics.len(),
        });
    }

    let from = address_from_topic(&log.topics[1], 1)?;
    let to = address_from_topic(&log.topics[2], 2)?;
    let value = value_from_data(&log.data)?;

    Ok(TransferEvent { from, to, value })
}

/// Case-insensitive comparison of a topic with the Transfer signature
pub fn is_transfer_signature(topic: &str) -> bool {
    strip_hex_prefix(topic.trim()).eq_ignore_ascii_case(strip_hex_prefix(TRANSFER_EVENT_SIGNATURE))
}

/// Decode a 32-byte hex word
fn decode_word(value: &str) -> Result<[u8; 32], String> {
    let bytes = hex::decode(strip_hex_prefix(value.trim())).map_err(|e| e.to_string())?;
    <[u8; 32]>::try_from(bytes.as_slice())
        .map_err(|_| format!("expected 32 bytes, got {}", bytes.len()))
}

/// An indexed address occupies the low 20 bytes; the high 12 must be zero
fn address_from_topic(topic: &str, index: usize) -> Result<Address, DecodeError> {
    let word = decode_word(topic).map_err(|reason| DecodeError::MalformedTopic { index, reason })?;

    if word[..12].iter().any(|b| *b != 0) {
        return Err(DecodeError::MalformedTopic {
            index,
            reason: "address word has non-zero padding".to_string(),
        });
    }

    let mut raw = [0u8; 20];
    raw.copy_from_slice(&word[12..]);
    Ok(Address::from_slice(&raw))
}

fn value_from_data(data: &str) -> Result<U256, DecodeError> {
    let word = decode_word(data).map_err(DecodeError::MalformedData)?;
    Ok(U256::from_be_bytes(word))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::keccak256;

    fn topic_for(address: &str) -> String {
        format!("0x000000000000000000000000{}", strip_hex_prefix(address))
    }

    fn transfer_log(from: &str, to: &str, value_hex: &str) -> LogEntry {
        LogEntry {
            address: Address::parse("0x455e53847f9f0f0b0fcf0b0b0b0b0b0b0b0b0b0b").unwrap(),
            topics: vec![
                TRANSFER_EVENT_SIGNATURE.to_string(),
                topic_for(from),
                topic_for(to),
            ],
            data: format!("0x{:0>64}", value_hex),
            log_index: 0,
            transaction_hash: "0xtx".to_string(),
        }
    }

    const A: &str = "0x000000000000000000000000000000000000000a";
    const B: &str = "0x000000000000000000000000000000000000000b";

    #[test]
    fn test_signature_matches_keccak_of_abi() {
        let hash = keccak256(TRANSFER_EVENT_ABI.as_bytes());
        assert_eq!(format!("0x{}", hex::encode(hash)), TRANSFER_EVENT_SIGNATURE);
    }

    #[test]
    fn test_decode_well_formed_transfer() {
        let log = transfer_log(A, B, "3e8"); // 1000
        let event = decode_transfer_log(&log).unwrap();

        assert_eq!(event.from.as_str(), A);
        assert_eq!(event.to.as_str(), B);
        assert_eq!(event.value, U256::from(1000u64));
    }

    #[test]
    fn test_decode_is_deterministic() {
        let log = transfer_log(A, B, "de0b6b3a7640000");
        assert_eq!(decode_transfer_log(&log), decode_transfer_log(&log));

        let mut broken = log.clone();
        broken.topics.truncate(2);
        assert_eq!(decode_transfer_log(&broken), decode_transfer_log(&broken));
    }

    #[test]
    fn test_decode_accepts_uppercase_signature() {
        let mut log = transfer_log(A, B, "1");
        log.topics[0] = TRANSFER_EVENT_SIGNATURE.to_uppercase().replacen("0X", "0x", 1);
        assert!(decode_transfer_log(&log).is_ok());
    }

    #[test]
    fn test_decode_full_width_value() {
        let log = transfer_log(A, B, &"f".repeat(64));
        assert_eq!(decode_transfer_log(&log).unwrap().value, U256::MAX);
    }

    #[test]
    fn test_fewer_than_two_indexed_topics() {
        let mut log = transfer_log(A, B, "3e8");
        log.topics.truncate(2);

        let err = decode_transfer_log(&log).unwrap_err();
        assert_eq!(err, DecodeError::TopicCount { expected: 3, got: 2 });
        assert!(!err.is_non_matching());
    }

    #[test]
    fn test_erc721_transfer_is_rejected() {
        let mut log = transfer_log(A, B, "");
        log.topics.push(format!("0x{:0>64}", "1"));
        log.data = "0x".to_string();

        assert!(matches!(
            decode_transfer_log(&log),
            Err(DecodeError::TopicCount { expected: 3, got: 4 })
        ));
    }

    #[test]
    fn test_other_event_is_non_matching() {
        let mut log = transfer_log(A, B, "1");
        // Approval(address,address,uint256)
        log.topics[0] = "0x8c5be1e5ebec7d5bd14f71427d1e84f3dd0314c0f7b2291e5b200ac8c7c3b925".to_string();

        let err = decode_transfer_log(&log).unwrap_err();
        assert!(err.is_non_matching());

        let mut anonymous = transfer_log(A, B, "1");
        anonymous.topics.clear();
        assert!(decode_transfer_log(&anonymous).unwrap_err().is_non_matching());
    }

    #[test]
    fn test_malformed_topics_and_data() {
        let mut short_topic = transfer_log(A, B, "1");
        short_topic.topics[1] = "0x1234".to_string();
        assert!(matches!(
            decode_transfer_log(&short_topic),
            Err(DecodeError::MalformedTopic { index: 1, .. })
        ));

        let mut dirty_padding = transfer_log(A, B, "1");
        dirty_padding.topics[2] = format!("0xff{}", &topic_for(B)[4..]);
        assert!(matches!(
            decode_transfer_log(&dirty_padding),
            Err(DecodeError::MalformedTopic { index: 2, .. })
        ));

        let mut not_hex = transfer_log(A, B, "1");
        not_hex.data = "0xzz".to_string();
        assert!(matches!(decode_transfer_log(&not_hex), Err(DecodeError::MalformedData(_))));

        let mut empty_data = transfer_log(A, B, "1");
        empty_data.data = "0x".to_string();
        assert!(matches!(decode_transfer_log(&empty_data), Err(DecodeError::MalformedData(_))));
    }
}
