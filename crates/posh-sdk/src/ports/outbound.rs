//! # Outbound Ports
//!
//! The provider capability surface every blockchain back-end implements,
//! the normalized call/receipt/log shapes it speaks, and the time source the
//! cache reads.

use async_trait::async_trait;
use parking_lot::Mutex;
use primitive_types::{H256, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::contracts::{AbiEvent, AbiFunction, AbiValue};
use crate::domain::{Address, PoshError, TxHash};

// =============================================================================
// Call Descriptors
// =============================================================================

/// A view call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractCall {
    /// Target contract.
    pub address: Address,
    /// Function descriptor.
    pub function: AbiFunction,
    /// Ordered arguments.
    pub args: Vec<AbiValue>,
}

impl ContractCall {
    /// Build a call.
    pub fn new(address: Address, function: AbiFunction, args: Vec<AbiValue>) -> Self {
        Self {
            address,
            function,
            args,
        }
    }

    /// Selector plus encoded arguments.
    pub fn calldata(&self) -> Result<Vec<u8>, PoshError> {
        self.function.encode_call(&self.args)
    }
}

/// A state-changing call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRequest {
    /// Target contract.
    pub address: Address,
    /// Function descriptor.
    pub function: AbiFunction,
    /// Ordered arguments.
    pub args: Vec<AbiValue>,
    /// Native value attached.
    pub value: Option<U256>,
    /// Explicit gas limit; the back-end estimates when absent.
    pub gas_limit: Option<U256>,
}

impl TransactionRequest {
    /// Build a request with no value and no explicit gas limit.
    pub fn new(address: Address, function: AbiFunction, args: Vec<AbiValue>) -> Self {
        Self {
            address,
            function,
            args,
            value: None,
            gas_limit: None,
        }
    }

    /// Selector plus encoded arguments.
    pub fn calldata(&self) -> Result<Vec<u8>, PoshError> {
        self.function.encode_call(&self.args)
    }
}

// =============================================================================
// Normalized Results
// =============================================================================

/// Final status of a mined transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    /// Executed.
    Success,
    /// Reverted; state unchanged.
    Reverted,
}

/// Raw event log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLog {
    /// Emitting contract.
    pub address: Address,
    /// `topic0` first, then indexed parameters.
    pub topics: Vec<H256>,
    /// ABI-encoded non-indexed parameters.
    pub data: Vec<u8>,
    /// Block of the log.
    pub block_number: u64,
    /// Transaction of the log.
    pub transaction_hash: TxHash,
    /// Position within the block.
    pub log_index: u64,
}

/// Receipt of a mined transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    /// Transaction hash.
    pub transaction_hash: TxHash,
    /// Block it was mined in.
    pub block_number: u64,
    /// Final status.
    pub status: TxStatus,
    /// Gas consumed.
    pub gas_used: U256,
    /// Logs emitted.
    pub logs: Vec<EventLog>,
}

/// Historical or live log filter for one event of one contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogQuery {
    /// Emitting contract.
    pub address: Address,
    /// Event descriptor; its `topic0` is always part of the filter.
    pub event: AbiEvent,
    /// Filters for `topics[1..]`; `None` matches anything.
    pub topics: Vec<Option<H256>>,
    /// First block, inclusive.
    pub from_block: Option<u64>,
    /// Last block, inclusive.
    pub to_block: Option<u64>,
}

impl LogQuery {
    /// Every log of `event` emitted by `address`.
    pub fn new(address: Address, event: AbiEvent) -> Self {
        Self {
            address,
            event,
            topics: Vec::new(),
            from_block: None,
            to_block: None,
        }
    }

    /// Full topic filter, `topic0` first.
    pub fn topic_filter(&self) -> Vec<Option<H256>> {
        let mut filter = vec![Some(self.event.topic0())];
        filter.extend(self.topics.iter().copied());
        filter
    }

    /// Client-side evaluation of the filter.
    pub fn matches(&self, log: &EventLog) -> bool {
        if log.address != self.address {
            return false;
        }
        if self.from_block.map_or(false, |from| log.block_number < from) {
            return false;
        }
        if self.to_block.map_or(false, |to| log.block_number > to) {
            return false;
        }
        self.topic_filter()
            .iter()
            .enumerate()
            .all(|(i, wanted)| match wanted {
                Some(topic) => log.topics.get(i) == Some(topic),
                None => true,
            })
    }
}

// =============================================================================
// Subscriptions
// =============================================================================

/// Callback invoked for each live log.
pub type EventCallback = Arc<dyn Fn(EventLog) + Send + Sync>;

/// Cancellation handle for a live event subscription.
///
/// `unsubscribe` stops delivery and may be called any number of times.
/// Dropping the handle does not cancel the subscription.
#[must_use = "dropping a Subscription does not cancel it; call unsubscribe"]
pub struct Subscription {
    id: Uuid,
    active: AtomicBool,
    on_cancel: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Subscription {
    /// Handle that runs `on_cancel` on the first `unsubscribe`.
    pub fn new(on_cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            id: Uuid::new_v4(),
            active: AtomicBool::new(true),
            on_cancel: Mutex::new(Some(Box::new(on_cancel))),
        }
    }

    /// Subscription id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// False once unsubscribed.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop delivery. Idempotent.
    pub fn unsubscribe(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            if let Some(cancel) = self.on_cancel.lock().take() {
                cancel();
            }
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

// =============================================================================
// Provider Port
// =============================================================================

/// Blockchain access capabilities.
///
/// Managers depend only on this trait. Adapters normalize receipts and logs
/// to the shapes above and fail with [`PoshError::Unsupported`] for
/// capabilities their back-end lacks.
#[async_trait]
pub trait BlockchainProvider: Send + Sync {
    /// Adapter name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Execute a view call and decode its outputs.
    async fn read_contract(&self, call: &ContractCall) -> Result<Vec<AbiValue>, PoshError>;

    /// Submit a state-changing call. Requires a signer.
    async fn write_contract(&self, request: &TransactionRequest) -> Result<TxHash, PoshError>;

    /// Block until `tx_hash` is mined.
    async fn wait_for_transaction(&self, tx_hash: &TxHash) -> Result<TransactionReceipt, PoshError>;

    /// Gas a would-be call consumes. Requires a signer.
    async fn estimate_gas(&self, request: &TransactionRequest) -> Result<U256, PoshError>;

    /// Historical logs matching `query`.
    async fn get_events(&self, query: &LogQuery) -> Result<Vec<EventLog>, PoshError>;

    /// Live logs matching `query`.
    async fn watch_event(
        &self,
        query: &LogQuery,
        callback: EventCallback,
    ) -> Result<Subscription, PoshError>;

    /// Current chain head.
    async fn get_block_number(&self) -> Result<u64, PoshError>;

    /// Chain id reported by the back-end.
    async fn get_chain_id(&self) -> Result<u64, PoshError>;
}

/// JSON-RPC `error` member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    /// JSON-RPC error code.
    pub code: i64,
    /// Error message.
    pub message: String,
    /// Extra payload (revert data for execution errors).
    #[serde(default)]
    pub data: Option<Value>,
}

/// Failure of one transport request.
#[derive(Clone, Debug)]
pub enum TransportError {
    /// The request never produced a JSON-RPC response.
    Failed(PoshError),
    /// The node answered with an error object.
    Rpc(RpcErrorObject),
}

impl From<PoshError> for TransportError {
    fn from(err: PoshError) -> Self {
        TransportError::Failed(err)
    }
}

/// JSON-RPC request transport (HTTP endpoint or EIP-1193 wallet bridge).
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Endpoint description used in network errors.
    fn endpoint(&self) -> &str;

    /// Send one request and return its `result`.
    async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError>;
}

// =============================================================================
// Time Source
// =============================================================================

/// Millisecond clock.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Manually advanced clock for tests.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Clock starting at `start` ms.
    pub fn new(start: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Move forward by `ms`.
    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    /// Jump to `ms`.
    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
