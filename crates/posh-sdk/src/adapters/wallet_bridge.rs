//! # Wallet Bridge Provider
//!
//! Adapter over an injected EIP-1193 wallet (`request({ method, params })`).
//! The wallet owns the account and signs; this adapter only forwards
//! requests. Wallet connectors expose no log filtering, so `get_events` and
//! `watch_event` fail with [`PoshError::Unsupported`].

use async_trait::async_trait;
use parking_lot::RwLock;
use primitive_types::U256;
use std::sync::Arc;
use std::time::Duration;

use super::rpc::EthRpc;
use crate::contracts::AbiValue;
use crate::domain::{Address, PoshError, TxHash};
use crate::ports::{
    BlockchainProvider, ContractCall, EventCallback, EventLog, LogQuery, RpcTransport,
    Subscription, TransactionReceipt, TransactionRequest,
};

const ADAPTER: &str = "WalletBridgeProvider";

/// EIP-1193 wallet adapter.
pub struct WalletBridgeProvider {
    rpc: EthRpc,
    account: RwLock<Option<Address>>,
    receipt_poll_interval: Duration,
    receipt_timeout: Duration,
}

impl WalletBridgeProvider {
    /// Bridge over `transport` for `chain_id`. No account is connected yet.
    pub fn new(transport: Arc<dyn RpcTransport>, chain_id: u64) -> Self {
        Self {
            rpc: EthRpc::new(transport, chain_id),
            account: RwLock::new(None),
            receipt_poll_interval: Duration::from_secs(2),
            receipt_timeout: Duration::from_secs(120),
        }
    }

    /// Override receipt polling.
    pub fn with_receipt_polling(mut self, interval: Duration, timeout: Duration) -> Self {
        self.receipt_poll_interval = interval;
        self.receipt_timeout = timeout;
        self
    }

    /// Use `account` without asking the wallet.
    pub fn with_account(self, account: Address) -> Self {
        *self.account.write() = Some(account);
        self
    }

    /// Ask the wallet for accounts (`eth_requestAccounts`) and keep the first.
    pub async fn connect(&self) -> Result<Option<Address>, PoshError> {
        let accounts = self.rpc.request_accounts().await?;
        let first = accounts.into_iter().next();
        *self.account.write() = first;
        if let Some(account) = first {
            tracing::info!(account = %account, "Wallet connected");
        }
        Ok(first)
    }

    /// Connected account.
    pub fn account(&self) -> Option<Address> {
        *self.account.read()
    }

    fn require_account(&self, operation: &'static str) -> Result<Address, PoshError> {
        self.account().ok_or(PoshError::WalletRequired {
            adapter: ADAPTER,
            operation,
        })
    }
}

#[async_trait]
impl BlockchainProvider for WalletBridgeProvider {
    fn name(&self) -> &'static str {
        ADAPTER
    }

    async fn read_contract(&self, call: &ContractCall) -> Result<Vec<AbiValue>, PoshError> {
        self.rpc.call(call).await
    }

    async fn write_contract(&self, request: &TransactionRequest) -> Result<TxHash, PoshError> {
        let from = self.require_account("write_contract")?;
        self.rpc.send_transaction(from, request).await
    }

    async fn wait_for_transaction(&self, tx_hash: &TxHash) -> Result<TransactionReceipt, PoshError> {
        self.rpc
            .wait_for_receipt(tx_hash, self.receipt_poll_interval, self.receipt_timeout)
            .await
    }

    async fn estimate_gas(&self, request: &TransactionRequest) -> Result<U256, PoshError> {
        let from = self.require_account("estimate_gas")?;
        self.rpc.estimate_gas(from, request).await
    }

    async fn get_events(&self, _query: &LogQuery) -> Result<Vec<EventLog>, PoshError> {
        Err(PoshError::Unsupported {
            adapter: ADAPTER,
            capability: "get_events",
        })
    }

    async fn watch_event(
        &self,
        _query: &LogQuery,
        _callback: EventCallback,
    ) -> Result<Subscription, PoshError> {
        Err(PoshError::Unsupported {
            adapter: ADAPTER,
            capability: "watch_event",
        })
    }

    async fn get_block_number(&self) -> Result<u64, PoshError> {
        self.rpc.block_number().await
    }

    async fn get_chain_id(&self) -> Result<u64, PoshError> {
        self.rpc.chain_id().await
    }
}
