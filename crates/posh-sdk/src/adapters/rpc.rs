//! # Ethereum JSON-RPC Layer
//!
//! The `eth_*` methods both RPC-backed adapters speak, over any
//! [`RpcTransport`]. Converts node JSON into the normalized receipt and log
//! shapes and maps node error objects onto [`PoshError`].

use primitive_types::{H256, U256};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::contracts::{decode_revert_reason, AbiValue};
use crate::domain::{Address, NetworkFailure, PoshError, TxHash};
use crate::ports::{
    ContractCall, EventLog, LogQuery, RpcErrorObject, RpcTransport, TransactionReceipt,
    TransactionRequest, TransportError, TxStatus,
};

/// EIP-1474 "limit exceeded".
const RPC_LIMIT_EXCEEDED: i64 = -32005;
/// Geth revert code.
const RPC_EXECUTION_REVERTED: i64 = 3;

// =============================================================================
// Hex Quantities
// =============================================================================

/// `0x`-prefixed minimal hex quantity.
pub fn to_quantity(value: U256) -> String {
    format!("0x{:x}", value)
}

/// `0x`-prefixed hex data.
pub fn to_data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse a hex quantity.
pub fn parse_quantity(raw: &str, context: &str) -> Result<U256, PoshError> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| PoshError::decode(context, format!("missing 0x prefix in {}", raw)))?;
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_str_radix(digits, 16).map_err(|e| PoshError::decode(context, format!("{:?}", e)))
}

/// Parse a hex quantity that must fit in `u64`.
pub fn parse_u64(raw: &str, context: &str) -> Result<u64, PoshError> {
    let value = parse_quantity(raw, context)?;
    if value > U256::from(u64::MAX) {
        return Err(PoshError::decode(context, format!("{} exceeds u64", raw)));
    }
    Ok(value.as_u64())
}

/// Parse hex data.
pub fn parse_data(raw: &str, context: &str) -> Result<Vec<u8>, PoshError> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| PoshError::decode(context, format!("missing 0x prefix in {}", raw)))?;
    hex::decode(digits).map_err(|e| PoshError::decode(context, e.to_string()))
}

fn as_str<'a>(value: &'a Value, context: &str) -> Result<&'a str, PoshError> {
    value
        .as_str()
        .ok_or_else(|| PoshError::decode(context, format!("expected hex string, got {}", value)))
}

// =============================================================================
// Node JSON Shapes
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcLog {
    address: Address,
    topics: Vec<H256>,
    data: String,
    block_number: Option<String>,
    transaction_hash: Option<H256>,
    log_index: Option<String>,
}

impl RpcLog {
    fn normalize(self) -> Result<EventLog, PoshError> {
        let context = "log";
        Ok(EventLog {
            address: self.address,
            topics: self.topics,
            data: parse_data(&self.data, context)?,
            block_number: self
                .block_number
                .as_deref()
                .map(|n| parse_u64(n, context))
                .transpose()?
                .unwrap_or(0),
            transaction_hash: self.transaction_hash.unwrap_or_default(),
            log_index: self
                .log_index
                .as_deref()
                .map(|n| parse_u64(n, context))
                .transpose()?
                .unwrap_or(0),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: H256,
    block_number: Option<String>,
    /// Absent on pre-Byzantium receipts.
    status: Option<String>,
    gas_used: String,
    #[serde(default)]
    logs: Vec<RpcLog>,
}

impl RpcReceipt {
    fn normalize(self) -> Result<TransactionReceipt, PoshError> {
        let context = "receipt";
        let status = match self.status.as_deref() {
            None | Some("0x1") => TxStatus::Success,
            Some("0x0") => TxStatus::Reverted,
            Some(other) => {
                return Err(PoshError::decode(context, format!("unknown status {}", other)))
            }
        };
        Ok(TransactionReceipt {
            transaction_hash: self.transaction_hash,
            block_number: self
                .block_number
                .as_deref()
                .map(|n| parse_u64(n, context))
                .transpose()?
                .unwrap_or(0),
            status,
            gas_used: parse_quantity(&self.gas_used, context)?,
            logs: self
                .logs
                .into_iter()
                .map(RpcLog::normalize)
                .collect::<Result<_, _>>()?,
        })
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Map a node error object. `target` names the contract and function for
/// errors that come from executing a call.
pub fn map_rpc_error(
    error: RpcErrorObject,
    target: Option<(&str, &str)>,
    chain_id: u64,
    endpoint: &str,
) -> PoshError {
    let lower = error.message.to_lowercase();

    if error.code == RPC_EXECUTION_REVERTED || lower.contains("revert") {
        let reason = error
            .data
            .as_ref()
            .and_then(|data| match data {
                Value::String(hex) => parse_data(hex, "revert").ok(),
                Value::Object(obj) => obj
                    .get("data")
                    .and_then(Value::as_str)
                    .and_then(|hex| parse_data(hex, "revert").ok()),
                _ => None,
            })
            .and_then(|bytes| decode_revert_reason(&bytes))
            .or_else(|| {
                error
                    .message
                    .split_once("execution reverted: ")
                    .map(|(_, reason)| reason.to_string())
            });
        let (contract, function) = target.unwrap_or(("unknown", "unknown"));
        let mut err = PoshError::contract(contract, function, reason);
        if let PoshError::Contract { details, .. } = &mut err {
            *details = Some(json!({ "code": error.code, "message": error.message }));
        }
        return err;
    }

    if lower.contains("insufficient funds") {
        return PoshError::InsufficientFunds(error.message);
    }

    let failure = if error.code == RPC_LIMIT_EXCEEDED || lower.contains("rate limit") {
        NetworkFailure::RateLimited
    } else {
        NetworkFailure::Rpc(error.code)
    };
    PoshError::network(
        format!("RPC error {}: {}", error.code, error.message),
        chain_id,
        endpoint,
        failure,
    )
}

// =============================================================================
// EthRpc
// =============================================================================

/// `eth_*` calls over a transport.
pub struct EthRpc {
    transport: Arc<dyn RpcTransport>,
    chain_id: u64,
}

impl EthRpc {
    /// Wrap `transport`. `chain_id` labels network errors.
    pub fn new(transport: Arc<dyn RpcTransport>, chain_id: u64) -> Self {
        Self {
            transport,
            chain_id,
        }
    }

    /// Transport endpoint.
    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    async fn request(
        &self,
        method: &str,
        params: Value,
        target: Option<(&str, &str)>,
    ) -> Result<Value, PoshError> {
        tracing::trace!(method, endpoint = self.endpoint(), "RPC request");
        self.transport
            .request(method, params)
            .await
            .map_err(|err| match err {
                TransportError::Failed(e) => e,
                TransportError::Rpc(obj) => map_rpc_error(obj, target, self.chain_id, self.endpoint()),
            })
    }

    fn tx_object(from: Address, request: &TransactionRequest) -> Result<Value, PoshError> {
        let mut tx = Map::new();
        tx.insert("from".into(), json!(from.to_string()));
        tx.insert("to".into(), json!(request.address.to_string()));
        tx.insert("data".into(), json!(to_data(&request.calldata()?)));
        if let Some(value) = request.value {
            tx.insert("value".into(), json!(to_quantity(value)));
        }
        if let Some(gas) = request.gas_limit {
            tx.insert("gas".into(), json!(to_quantity(gas)));
        }
        Ok(Value::Object(tx))
    }

    /// `eth_call` at `latest`, decoded with the function's outputs.
    pub async fn call(&self, call: &ContractCall) -> Result<Vec<AbiValue>, PoshError> {
        let target = call.address.to_string();
        let params = json!([
            { "to": target, "data": to_data(&call.calldata()?) },
            "latest"
        ]);
        let result = self
            .request("eth_call", params, Some((&target, call.function.name)))
            .await?;
        let data = parse_data(as_str(&result, call.function.name)?, call.function.name)?;
        if data.is_empty() && !call.function.outputs.is_empty() {
            return Err(PoshError::decode(
                call.function.name,
                format!("empty return data; is there a contract at {}?", target),
            ));
        }
        call.function.decode_output(&data)
    }

    /// `eth_sendTransaction` from `from`.
    pub async fn send_transaction(
        &self,
        from: Address,
        request: &TransactionRequest,
    ) -> Result<TxHash, PoshError> {
        let target = request.address.to_string();
        let params = json!([Self::tx_object(from, request)?]);
        let result = self
            .request("eth_sendTransaction", params, Some((&target, request.function.name)))
            .await?;
        serde_json::from_value(result).map_err(|e| PoshError::decode("transaction hash", e.to_string()))
    }

    /// `eth_estimateGas` from `from`.
    pub async fn estimate_gas(
        &self,
        from: Address,
        request: &TransactionRequest,
    ) -> Result<U256, PoshError> {
        let target = request.address.to_string();
        let params = json!([Self::tx_object(from, request)?]);
        let result = self
            .request("eth_estimateGas", params, Some((&target, request.function.name)))
            .await?;
        parse_quantity(as_str(&result, "gas estimate")?, "gas estimate")
    }

    /// `eth_getTransactionReceipt`; `None` while pending.
    pub async fn get_receipt(&self, tx_hash: &TxHash) -> Result<Option<TransactionReceipt>, PoshError> {
        let result = self
            .request("eth_getTransactionReceipt", json!([tx_hash]), None)
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        let receipt: RpcReceipt =
            serde_json::from_value(result).map_err(|e| PoshError::decode("receipt", e.to_string()))?;
        receipt.normalize().map(Some)
    }

    /// Poll for a receipt every `interval` until `timeout` elapses.
    pub async fn wait_for_receipt(
        &self,
        tx_hash: &TxHash,
        interval: Duration,
        timeout: Duration,
    ) -> Result<TransactionReceipt, PoshError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(receipt) = self.get_receipt(tx_hash).await? {
                return Ok(receipt);
            }
            if tokio::time::Instant::now() + interval > deadline {
                return Err(PoshError::network(
                    format!("Timed out waiting for transaction {:?}", tx_hash),
                    self.chain_id,
                    self.endpoint(),
                    NetworkFailure::Timeout,
                ));
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// `eth_getLogs`.
    pub async fn get_logs(&self, query: &LogQuery) -> Result<Vec<EventLog>, PoshError> {
        let mut filter = Map::new();
        filter.insert("address".into(), json!(query.address.to_string()));
        filter.insert("topics".into(), json!(query.topic_filter()));
        filter.insert(
            "fromBlock".into(),
            json!(query.from_block.map_or("earliest".to_string(), |b| to_quantity(b.into()))),
        );
        filter.insert(
            "toBlock".into(),
            json!(query.to_block.map_or("latest".to_string(), |b| to_quantity(b.into()))),
        );

        let result = self
            .request("eth_getLogs", json!([Value::Object(filter)]), None)
            .await?;
        let logs: Vec<RpcLog> =
            serde_json::from_value(result).map_err(|e| PoshError::decode("logs", e.to_string()))?;
        logs.into_iter().map(RpcLog::normalize).collect()
    }

    /// `eth_blockNumber`.
    pub async fn block_number(&self) -> Result<u64, PoshError> {
        let result = self.request("eth_blockNumber", json!([]), None).await?;
        parse_u64(as_str(&result, "block number")?, "block number")
    }

    /// `eth_requestAccounts` (EIP-1102).
    pub async fn request_accounts(&self) -> Result<Vec<Address>, PoshError> {
        let result = self.request("eth_requestAccounts", json!([]), None).await?;
        serde_json::from_value(result).map_err(|e| PoshError::decode("accounts", e.to_string()))
    }

    /// `eth_chainId`.
    pub async fn chain_id(&self) -> Result<u64, PoshError> {
        let result = self.request("eth_chainId", json!([]), None).await?;
        parse_u64(as_str(&result, "chain id")?, "chain id")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Transport replaying canned responses and recording requests.
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        pub responses: Mutex<VecDeque<Result<Value, TransportError>>>,
        pub requests: Mutex<Vec<(String, Value)>>,
    }

    impl ScriptedTransport {
        pub fn with(responses: Vec<Result<Value, TransportError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl RpcTransport for ScriptedTransport {
        fn endpoint(&self) -> &str {
            "scripted://node"
        }

        async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
            self.requests.lock().push((method.to_string(), params));
            self.responses
                .lock()
                .pop_front()
                .unwrap_or(Ok(Value::Null))
        }
    }

    fn rpc_err(code: i64, message: &str, data: Option<Value>) -> RpcErrorObject {
        RpcErrorObject {
            code,
            message: message.to_string(),
            data,
        }
    }

    #[test]
    fn test_quantities() {
        assert_eq!(to_quantity(U256::from(255u64)), "0xff");
        assert_eq!(to_quantity(U256::zero()), "0x0");
        assert_eq!(parse_u64("0x14a34", "n").unwrap(), 84532);
        assert_eq!(parse_quantity("0x", "n").unwrap(), U256::zero());
        assert!(parse_u64("14a34", "n").is_err());
    }

    #[test]
    fn test_revert_with_reason_data() {
        let mut data = crate::contracts::abi::ERROR_STRING_SELECTOR.to_vec();
        data.extend(
            crate::contracts::abi::encode(
                &[crate::contracts::AbiType::String],
                &[AbiValue::String("Already registered".into())],
            )
            .unwrap(),
        );
        let err = map_rpc_error(
            rpc_err(3, "execution reverted", Some(json!(to_data(&data)))),
            Some(("0xabc", "register")),
            84532,
            "http://node",
        );
        match err {
            PoshError::Contract { function, revert_reason, .. } => {
                assert_eq!(function, "register");
                assert_eq!(revert_reason.as_deref(), Some("Already registered"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_revert_reason_from_message() {
        let err = map_rpc_error(
            rpc_err(-32000, "execution reverted: Not registered", None),
            Some(("0xabc", "linkExternalProof")),
            84532,
            "http://node",
        );
        assert!(err.to_string().contains("Not registered"));
    }

    #[test]
    fn test_error_classification() {
        let funds = map_rpc_error(rpc_err(-32000, "insufficient funds for gas * price + value", None), None, 1, "x");
        assert_eq!(funds.code(), crate::domain::codes::INSUFFICIENT_FUNDS);

        let limited = map_rpc_error(rpc_err(RPC_LIMIT_EXCEEDED, "too many requests", None), None, 1, "x");
        assert_eq!(limited.code(), crate::domain::codes::RATE_LIMITED);

        let other = map_rpc_error(rpc_err(-32601, "method not found", None), None, 1, "x");
        assert!(matches!(
            other,
            PoshError::Network { failure: NetworkFailure::Rpc(-32601), .. }
        ));
    }

    #[tokio::test]
    async fn test_receipt_normalization() {
        let topic = H256::repeat_byte(9);
        let transport = ScriptedTransport::with(vec![Ok(json!({
            "transactionHash": format!("0x{}", "11".repeat(32)),
            "blockNumber": "0x10",
            "status": "0x0",
            "gasUsed": "0x5208",
            "logs": [{
                "address": "0x0000000000000000000000000000000000000001",
                "topics": [format!("0x{}", "09".repeat(32))],
                "data": "0x",
                "blockNumber": "0x10",
                "transactionHash": format!("0x{}", "11".repeat(32)),
                "logIndex": "0x2"
            }]
        }))]);
        let rpc = EthRpc::new(transport, 84532);
        let receipt = rpc.get_receipt(&H256::repeat_byte(0x11)).await.unwrap().unwrap();

        assert_eq!(receipt.status, TxStatus::Reverted);
        assert_eq!(receipt.block_number, 16);
        assert_eq!(receipt.gas_used, U256::from(21_000u64));
        assert_eq!(receipt.logs[0].topics, vec![topic]);
        assert_eq!(receipt.logs[0].log_index, 2);
    }

    #[tokio::test]
    async fn test_pending_receipt_is_none() {
        let rpc = EthRpc::new(ScriptedTransport::with(vec![Ok(Value::Null)]), 84532);
        assert!(rpc.get_receipt(&H256::zero()).await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_receipt_times_out() {
        let rpc = EthRpc::new(ScriptedTransport::with(Vec::new()), 84532);
        let err = rpc
            .wait_for_receipt(&H256::zero(), Duration::from_millis(100), Duration::from_millis(350))
            .await
            .unwrap_err();
        assert_eq!(err.code(), crate::domain::codes::NETWORK_TIMEOUT);
    }

    #[tokio::test]
    async fn test_get_logs_filter_shape() {
        let transport = ScriptedTransport::with(vec![Ok(json!([]))]);
        let rpc = EthRpc::new(transport.clone(), 84532);
        let address: Address = "0x0000000000000000000000000000000000000001".parse().unwrap();
        let mut query = LogQuery::new(address, crate::contracts::human_identity::HUMAN_REGISTERED);
        query.from_block = Some(5);

        assert!(rpc.get_logs(&query).await.unwrap().is_empty());

        let requests = transport.requests.lock();
        let (method, params) = &requests[0];
        assert_eq!(method, "eth_getLogs");
        assert_eq!(params[0]["fromBlock"], "0x5");
        assert_eq!(params[0]["toBlock"], "latest");
        assert_eq!(params[0]["topics"].as_array().unwrap().len(), 1);
    }
}
