//! # JSON-RPC Provider
//!
//! Full-capability adapter speaking Ethereum JSON-RPC over HTTP.
//!
//! - Reads go through `eth_call`.
//! - Writes use `eth_sendTransaction` from a node-managed signer account.
//! - Receipts are polled with `eth_getTransactionReceipt`.
//! - Live events are polled with `eth_getLogs` on a background task.

use async_trait::async_trait;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::rpc::EthRpc;
use crate::contracts::AbiValue;
use crate::domain::{Address, NetworkFailure, PoshError, TxHash};
use crate::ports::{
    BlockchainProvider, ContractCall, EventCallback, EventLog, LogQuery, RpcErrorObject,
    RpcTransport, Subscription, TransactionReceipt, TransactionRequest, TransportError,
};

const ADAPTER: &str = "JsonRpcProvider";

// =============================================================================
// Configuration
// =============================================================================

/// JSON-RPC adapter settings.
#[derive(Clone, Debug)]
pub struct JsonRpcConfig {
    /// HTTP endpoint.
    pub rpc_url: String,
    /// Chain the endpoint serves; labels network errors.
    pub chain_id: u64,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Receipt polling interval.
    pub receipt_poll_interval: Duration,
    /// Give up waiting for a receipt after this long.
    pub receipt_timeout: Duration,
    /// Log polling interval for live subscriptions.
    pub event_poll_interval: Duration,
}

impl JsonRpcConfig {
    /// Defaults for `rpc_url` on `chain_id`.
    pub fn new(rpc_url: impl Into<String>, chain_id: u64) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            chain_id,
            request_timeout: Duration::from_secs(30),
            receipt_poll_interval: Duration::from_secs(2),
            receipt_timeout: Duration::from_secs(120),
            event_poll_interval: Duration::from_secs(4),
        }
    }

    /// Short intervals for local nodes and tests.
    pub fn for_testing(rpc_url: impl Into<String>, chain_id: u64) -> Self {
        Self {
            request_timeout: Duration::from_secs(5),
            receipt_poll_interval: Duration::from_millis(50),
            receipt_timeout: Duration::from_secs(5),
            event_poll_interval: Duration::from_millis(100),
            ..Self::new(rpc_url, chain_id)
        }
    }
}

// =============================================================================
// HTTP Transport
// =============================================================================

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

/// JSON-RPC over HTTP POST.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    chain_id: u64,
    request_id: AtomicU64,
}

impl HttpTransport {
    /// Transport for `url` with a per-request `timeout`.
    pub fn new(url: impl Into<String>, chain_id: u64, timeout: Duration) -> Result<Self, PoshError> {
        let url = url.into();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                PoshError::configuration(
                    format!("Failed to create HTTP client: {}", e),
                    None,
                    "Check the TLS configuration of the host",
                )
            })?;
        Ok(Self {
            client,
            url,
            chain_id,
            request_id: AtomicU64::new(1),
        })
    }

    fn network(&self, message: String, failure: NetworkFailure) -> TransportError {
        TransportError::Failed(PoshError::network(message, self.chain_id, &self.url, failure))
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.request_id.fetch_add(1, Ordering::SeqCst),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let failure = if e.is_timeout() {
                    NetworkFailure::Timeout
                } else {
                    NetworkFailure::Transport
                };
                self.network(format!("{} request failed: {}", method, e), failure)
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(self.network(
                format!("{} rate limited by {}", method, self.url),
                NetworkFailure::RateLimited,
            ));
        }
        if !status.is_success() {
            return Err(self.network(
                format!("{} failed with HTTP {}", method, status),
                NetworkFailure::HttpStatus(status.as_u16()),
            ));
        }

        let body: JsonRpcResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.network(format!("{} response timed out: {}", method, e), NetworkFailure::Timeout)
            } else {
                TransportError::Failed(PoshError::decode("JSON-RPC response", e.to_string()))
            }
        })?;

        match body.error {
            Some(error) => Err(TransportError::Rpc(error)),
            None => Ok(body.result.unwrap_or(Value::Null)),
        }
    }
}

// =============================================================================
// Provider
// =============================================================================

/// Ethereum JSON-RPC adapter.
pub struct JsonRpcProvider {
    rpc: Arc<EthRpc>,
    signer: Option<Address>,
    config: JsonRpcConfig,
}

impl JsonRpcProvider {
    /// Read-only provider over HTTP.
    pub fn new(config: JsonRpcConfig) -> Result<Self, PoshError> {
        let transport = HttpTransport::new(&config.rpc_url, config.chain_id, config.request_timeout)?;
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    /// Provider over an arbitrary transport.
    pub fn with_transport(transport: Arc<dyn RpcTransport>, config: JsonRpcConfig) -> Self {
        Self {
            rpc: Arc::new(EthRpc::new(transport, config.chain_id)),
            signer: None,
            config,
        }
    }

    /// Send transactions from `account`, which the node must be able to sign for.
    pub fn with_signer(mut self, account: Address) -> Self {
        self.signer = Some(account);
        self
    }

    /// Configured signer.
    pub fn signer(&self) -> Option<Address> {
        self.signer
    }

    fn require_signer(&self, operation: &'static str) -> Result<Address, PoshError> {
        self.signer.ok_or(PoshError::WalletRequired {
            adapter: ADAPTER,
            operation,
        })
    }
}

/// Deliver logs mined from `next_from` onwards.
async fn poll_logs(
    rpc: Arc<EthRpc>,
    query: LogQuery,
    callback: EventCallback,
    interval: Duration,
    mut next_from: u64,
) {
    loop {
        tokio::time::sleep(interval).await;

        let head = match rpc.block_number().await {
            Ok(head) => head,
            Err(e) => {
                tracing::warn!(error = %e, "Event watcher poll failed");
                continue;
            }
        };
        if head < next_from {
            continue;
        }

        let mut window = query.clone();
        window.from_block = Some(next_from);
        window.to_block = Some(head);
        match rpc.get_logs(&window).await {
            Ok(logs) => {
                for log in logs {
                    callback(log);
                }
                next_from = head + 1;
            }
            Err(e) => tracing::warn!(error = %e, from = next_from, to = head, "Event watcher poll failed"),
        }
    }
}

#[async_trait]
impl BlockchainProvider for JsonRpcProvider {
    fn name(&self) -> &'static str {
        ADAPTER
    }

    async fn read_contract(&self, call: &ContractCall) -> Result<Vec<AbiValue>, PoshError> {
        self.rpc.call(call).await
    }

    async fn write_contract(&self, request: &TransactionRequest) -> Result<TxHash, PoshError> {
        let from = self.require_signer("write_contract")?;
        self.rpc.send_transaction(from, request).await
    }

    async fn wait_for_transaction(&self, tx_hash: &TxHash) -> Result<TransactionReceipt, PoshError> {
        self.rpc
            .wait_for_receipt(tx_hash, self.config.receipt_poll_interval, self.config.receipt_timeout)
            .await
    }

    async fn estimate_gas(&self, request: &TransactionRequest) -> Result<U256, PoshError> {
        let from = self.require_signer("estimate_gas")?;
        self.rpc.estimate_gas(from, request).await
    }

    async fn get_events(&self, query: &LogQuery) -> Result<Vec<EventLog>, PoshError> {
        self.rpc.get_logs(query).await
    }

    async fn watch_event(
        &self,
        query: &LogQuery,
        callback: EventCallback,
    ) -> Result<Subscription, PoshError> {
        let from_block = self.rpc.block_number().await?.saturating_add(1);
        let task = tokio::spawn(poll_logs(
            self.rpc.clone(),
            query.clone(),
            callback,
            self.config.event_poll_interval,
            from_block,
        ));
        tracing::debug!(event = query.event.name, address = %query.address, from_block, "Watching event");
        Ok(Subscription::new(move || task.abort()))
    }

    async fn get_block_number(&self) -> Result<u64, PoshError> {
        self.rpc.block_number().await
    }

    async fn get_chain_id(&self) -> Result<u64, PoshError> {
        self.rpc.chain_id().await
    }
}
