use alloy_primitives::U256;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::config::RpcConfig;
use crate::error::RpcError;
use crate::logging::{LogContext, MetricsLogger, PerformanceMonitor};
use crate::models::{strip_hex_prefix, Address, Block, LogEntry, Receipt, Transaction};
use crate::retry::{RetryConfig, RetryManager};

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'a str,
    method: &'a str,
    params: Vec<Value>,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    result: Option<Value>,
    error: Option<JsonRpcError>,
    #[allow(dead_code)]
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

/// `eth_getBlockByNumber` payload with full transaction objects
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcBlock {
    number: String,
    hash: String,
    timestamp: String,
    #[serde(default)]
    transactions: Vec<RpcTransaction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcTransaction {
    hash: String,
    from: String,
    to: Option<String>,
    value: String,
    block_number: Option<String>,
    transaction_index: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: String,
    #[serde(default)]
    logs: Vec<RpcLog>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcLog {
    address: String,
    #[serde(default)]
    topics: Vec<String>,
    data: String,
    log_index: Option<String>,
    transaction_hash: Option<String>,
}

/// JSON-RPC client for an EVM endpoint. Every call carries the client timeout
/// and goes through a bounded [`RetryManager`].
pub struct RpcClient {
    client: Client,
    endpoint: String,
    timeout_seconds: u64,
    request_id: AtomicU64,
    retry_config: RetryConfig,
}

impl RpcClient {
    pub fn new(endpoint: String, timeout_seconds: u64) -> Result<Self, RpcError> {
        let context = LogContext::new("rpc_client", "initialization")
            .with_metadata("endpoint", json!(endpoint))
            .with_metadata("timeout_seconds", json!(timeout_seconds));
        context.info("Initializing RPC client");

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            timeout_seconds,
            request_id: AtomicU64::new(1),
            retry_config: RetryConfig::default(),
        })
    }

    pub fn from_config(config: &RpcConfig) -> Result<Self, RpcError> {
        Ok(Self::new(config.endpoint.clone(), config.timeout_seconds)?
            .with_retry_config(RetryConfig::for_rpc(config)))
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// One JSON-RPC round trip. A `null` result is returned as [`Value::Null`]
    /// so callers can map it to their own not-found error.
    async fn make_request(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.request_id.fetch_add(1, Ordering::Relaxed),
        };

        let context = LogContext::new("rpc_client", "make_request")
            .with_metadata("method", json!(method))
            .with_metadata("request_id", json!(request.id));
        context.trace(&format!("Sending RPC request: {}", method));

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RpcError::Timeout { seconds: self.timeout_seconds }
                } else if e.is_connect() {
                    RpcError::Connection(e.to_string())
                } else {
                    RpcError::Http(e)
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let seconds = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse().ok())
                .unwrap_or(1);
            return Err(RpcError::RateLimit { seconds });
        }
        if !status.is_success() {
            return Err(RpcError::Connection(format!(
                "HTTP error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body = response.text().await?;
        let rpc_response: JsonRpcResponse = serde_json::from_str(&body)
            .map_err(|e| RpcError::InvalidResponse(format!("{} (body: {})", e, truncate(&body, 200))))?;

        if let Some(error) = rpc_response.error {
            return Err(match error.code {
                -32700 => RpcError::InvalidResponse("Parse error".to_string()),
                -32600 => RpcError::InvalidResponse("Invalid request".to_string()),
                -32602 => RpcError::InvalidResponse(format!("Invalid params: {}", error.message)),
                _ => RpcError::Method { code: error.code, message: error.message },
            });
        }

        Ok(rpc_response.result.unwrap_or(Value::Null))
    }

    /// Timed request that records an `rpc_call` metric
    async fn timed_request(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        let monitor = PerformanceMonitor::new(&format!("rpc_{}", method));
        let result = self.make_request(method, params).await;
        let duration = monitor.finish_with_result(&result);
        MetricsLogger::log_rpc_call(method, duration, result.is_ok());
        result
    }

    /// `eth_blockNumber`
    pub async fn get_latest_block_number(&self) -> Result<u64, RpcError> {
        RetryManager::new("get_latest_block_number", self.retry_config.clone())
            .execute(move || async move {
                let value = self.timed_request("eth_blockNumber", vec![]).await?;
                let hex_string = value.as_str().ok_or_else(|| {
                    RpcError::InvalidResponse(format!("Block number is not a string: {}", value))
                })?;
                let block_number = parse_hex_u64(hex_string)?;

                LogContext::new("rpc_client", "get_latest_block_number")
                    .with_block_number(block_number)
                    .debug(&format!("Retrieved latest block number: {}", block_number));
                Ok(block_number)
            })
            .await
    }

    /// `eth_getBlockByNumber` with full transaction bodies. A `null` result
    /// means the node has not produced the block yet.
    pub async fn get_block(&self, block_number: u64) -> Result<Block, RpcError> {
        RetryManager::new("get_block", self.retry_config.clone())
            .execute(move || async move {
                let params = vec![json!(format!("0x{:x}", block_number)), json!(true)];
                let value = self.timed_request("eth_getBlockByNumber", params).await?;

                if value.is_null() {
                    return Err(RpcError::BlockNotFound { block_number });
                }

                let raw: RpcBlock = serde_json::from_value(value)?;
                let block = raw.into_block()?;

                LogContext::new("rpc_client", "get_block")
                    .with_block_number(block_number)
                    .with_metadata("transaction_count", json!(block.transactions.len()))
                    .debug(&format!(
                        "Retrieved block {} with {} transactions",
                        block_number,
                        block.transactions.len()
                    ));
                Ok(block)
            })
            .await
    }

    /// `eth_getTransactionReceipt`
    pub async fn get_transaction_receipt(&self, tx_hash: &str) -> Result<Receipt, RpcError> {
        RetryManager::new("get_transaction_receipt", self.retry_config.clone())
            .execute(move || async move {
                let value = self
                    .timed_request("eth_getTransactionReceipt", vec![json!(tx_hash)])
                    .await?;

                if value.is_null() {
                    return Err(RpcError::TransactionNotFound { tx_hash: tx_hash.to_string() });
                }

                let raw: RpcReceipt = serde_json::from_value(value)?;
                raw.into_receipt()
            })
            .await
    }

    /// Startup check: the endpoint answers `eth_blockNumber` with a sane value
    pub async fn verify_connectivity(&self) -> Result<u64, RpcError> {
        let context = LogContext::new("rpc_client", "verify_connectivity")
            .with_metadata("endpoint", json!(self.endpoint));

        match self.get_latest_block_number().await {
            Ok(height) => {
                context.with_block_number(height).info("RPC endpoint reachable");
                Ok(height)
            }
            Err(e) => {
                context
                    .with_metadata("error", json!(e.to_string()))
                    .error("RPC endpoint unreachable");
                Err(e)
            }
        }
    }
}

impl RpcBlock {
    fn into_block(self) -> Result<Block, RpcError> {
        let number = parse_hex_u64(&self.number)?;
        let timestamp = parse_hex_u64(&self.timestamp)?;

        let transactions = self
            .transactions
            .into_iter()
            .enumerate()
            .map(|(position, tx)| tx.into_transaction(number, position as u32))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Block {
            number,
            hash: self.hash,
            timestamp,
            transactions,
        })
    }
}

impl RpcTransaction {
    fn into_transaction(self, block_number: u64, position: u32) -> Result<Transaction, RpcError> {
        let to = match self.to.as_deref() {
            Some(raw) if !raw.is_empty() => Some(parse_address(raw)?),
            _ => None,
        };

        Ok(Transaction {
            from: parse_address(&self.from)?,
            to,
            value: parse_hex_u256(&self.value)?,
            block_number: match self.block_number {
                Some(raw) => parse_hex_u64(&raw)?,
                None => block_number,
            },
            transaction_index: match self.transaction_index {
                Some(raw) => parse_hex_u32(&raw)?,
                None => position,
            },
            hash: self.hash,
        })
    }
}

impl RpcReceipt {
    fn into_receipt(self) -> Result<Receipt, RpcError> {
        let transaction_hash = self.transaction_hash;
        let logs = self
            .logs
            .into_iter()
            .enumerate()
            .map(|(position, log)| {
                Ok(LogEntry {
                    address: parse_address(&log.address)?,
                    topics: log.topics,
                    data: log.data,
                    log_index: match log.log_index {
                        Some(raw) => parse_hex_u32(&raw)?,
                        None => position as u32,
                    },
                    transaction_hash: log.transaction_hash.unwrap_or_else(|| transaction_hash.clone()),
                })
            })
            .collect::<Result<Vec<_>, RpcError>>()?;

        Ok(Receipt { transaction_hash, logs })
    }
}

fn parse_address(raw: &str) -> Result<Address, RpcError> {
    Address::parse(raw).map_err(|e| RpcError::InvalidResponse(e.to_string()))
}

fn parse_hex_u64(hex_str: &str) -> Result<u64, RpcError> {
    u64::from_str_radix(strip_hex_prefix(hex_str), 16)
        .map_err(|e| RpcError::InvalidResponse(format!("Failed to parse '{}' as u64: {}", hex_str, e)))
}

fn parse_hex_u32(hex_str: &str) -> Result<u32, RpcError> {
    u32::from_str_radix(strip_hex_prefix(hex_str), 16)
        .map_err(|e| RpcError::InvalidResponse(format!("Failed to parse '{}' as u32: {}", hex_str, e)))
}

fn parse_hex_u256(hex_str: &str) -> Result<U256, RpcError> {
    let digits = strip_hex_prefix(hex_str);
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| RpcError::InvalidResponse(format!("Failed to parse '{}' as uint256: {}", hex_str, e)))
}

fn truncate(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((index, _)) => &value[..index],
        None => value,
    }
}
