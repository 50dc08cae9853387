//! Shared fixtures: a minimal counting provider and client builders.

use async_trait::async_trait;
use parking_lot::Mutex;
use primitive_types::{H256, U256};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use posh_sdk::contracts::AbiValue;
use posh_sdk::{
    Address, BackoffKind, BlockchainProvider, CachePolicy, ContractCall, EventLog,
    InMemoryProvider, LogQuery, NetworkFailure, PoshClient, PoshConfig, PoshError, RetryPolicy,
    Subscription, TransactionReceipt, TransactionRequest, TxHash, TxStatus,
};

/// Wallet used as signer.
pub const WALLET: &str = "0x00000000000000000000000000000000000000aa";
/// A well-formed human id.
pub const HUMAN: &str = "0x0101010101010101010101010101010101010101010101010101010101010101";

/// Provider answering every read with the same values and mining every
/// write as reverted. Reads fail with a transport error while the failure
/// budget lasts.
pub struct StubProvider {
    chain_id: u64,
    answer: Vec<AbiValue>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    failures_left: Mutex<u32>,
}

impl StubProvider {
    /// Stub answering every read with `answer`.
    pub fn new(answer: Vec<AbiValue>) -> Self {
        Self {
            chain_id: 84532,
            answer,
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            failures_left: Mutex::new(0),
        }
    }

    /// Fail the next `count` reads with a transport error.
    pub fn failing(self, count: u32) -> Self {
        *self.failures_left.lock() = count;
        self
    }

    /// Reads received so far, failed ones included.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Writes received so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlockchainProvider for StubProvider {
    fn name(&self) -> &'static str {
        "StubProvider"
    }

    async fn read_contract(&self, _call: &ContractCall) -> Result<Vec<AbiValue>, PoshError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let mut left = self.failures_left.lock();
        if *left > 0 {
            *left -= 1;
            return Err(PoshError::network(
                "connection reset",
                self.chain_id,
                "stub://",
                NetworkFailure::Transport,
            ));
        }
        Ok(self.answer.clone())
    }

    async fn write_contract(&self, _request: &TransactionRequest) -> Result<TxHash, PoshError> {
        let n = self.writes.fetch_add(1, Ordering::SeqCst) as u64 + 1;
        Ok(H256::from_low_u64_be(n))
    }

    async fn wait_for_transaction(&self, tx_hash: &TxHash) -> Result<TransactionReceipt, PoshError> {
        Ok(TransactionReceipt {
            transaction_hash: *tx_hash,
            block_number: 7,
            status: TxStatus::Reverted,
            gas_used: U256::from(21_000u64),
            logs: Vec::new(),
        })
    }

    async fn estimate_gas(&self, _request: &TransactionRequest) -> Result<U256, PoshError> {
        Ok(U256::from(21_000u64))
    }

    async fn get_events(&self, _query: &LogQuery) -> Result<Vec<EventLog>, PoshError> {
        Ok(Vec::new())
    }

    async fn watch_event(
        &self,
        _query: &LogQuery,
        _callback: posh_sdk::ports::EventCallback,
    ) -> Result<Subscription, PoshError> {
        Ok(Subscription::new(|| {}))
    }

    async fn get_block_number(&self) -> Result<u64, PoshError> {
        Ok(7)
    }

    async fn get_chain_id(&self) -> Result<u64, PoshError> {
        Ok(self.chain_id)
    }
}

/// Test configuration with caching switched on or off and retries off.
pub fn config(caching: bool) -> PoshConfig {
    PoshConfig {
        cache: Some(CachePolicy {
            enabled: caching,
            ttl_ms: 60_000,
            max_size: 16,
        }),
        retry: None,
        ..PoshConfig::for_testing()
    }
}

/// Test configuration retrying reads up to `max_attempts` times.
pub fn retrying_config(max_attempts: u32, backoff: BackoffKind, initial_delay_ms: u64) -> PoshConfig {
    PoshConfig {
        retry: Some(RetryPolicy {
            enabled: true,
            max_attempts,
            backoff,
            initial_delay_ms,
        }),
        ..config(false)
    }
}

/// Client over a shared stub.
pub fn stub_client(config: PoshConfig, stub: &Arc<StubProvider>) -> PoshClient {
    let provider: Arc<dyn BlockchainProvider> = stub.clone();
    PoshClient::new(config, Some(provider)).expect("valid test config")
}

/// Client over a shared in-memory chain.
pub fn chain_client(config: PoshConfig, chain: &Arc<InMemoryProvider>) -> PoshClient {
    let provider: Arc<dyn BlockchainProvider> = chain.clone();
    PoshClient::new(config, Some(provider)).expect("valid test config")
}

/// In-memory chain with `WALLET` as signer.
pub fn signed_chain() -> Arc<InMemoryProvider> {
    let wallet: Address = WALLET.parse().expect("valid wallet");
    Arc::new(InMemoryProvider::new(84532).with_signer(wallet))
}

/// Address configured for the identity contract in `config`.
pub fn identity_address(config: &PoshConfig) -> Address {
    config.contracts.identity.parse().expect("valid identity address")
}

/// Address configured for the proof registry in `config`.
pub fn proof_registry_address(config: &PoshConfig) -> Address {
    config.contracts.proof_registry.parse().expect("valid registry address")
}
