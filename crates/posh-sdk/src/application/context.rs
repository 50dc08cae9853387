//! # Client Context
//!
//! State shared by every manager of one client: the configuration, the read
//! cache and the provider binding.
//!
//! ## Read path
//!
//! binding check → cache lookup → provider call (retried when a retry policy
//! is active and the error is retryable) → decode → cache store.
//!
//! ## Write path
//!
//! binding check → submit → wait for receipt → reverted receipts fail with
//! [`PoshError::TransactionFailed`] and leave the cache alone; confirmed
//! writes clear the whole cache.
//!
//! The cache mutex is only held for synchronous cache operations, never
//! across an `.await`.

use parking_lot::{Mutex, RwLock};
use primitive_types::U256;
use std::any::Any;
use std::sync::Arc;

use crate::algorithms::{is_retryable, retry_if, RetryOptions, TtlCache};
use crate::config::{ConfigUpdate, ContractRole, PoshConfig};
use crate::contracts::{AbiFunction, AbiValue};
use crate::domain::{validate_config, Address, PoshError};
use crate::ports::{
    BlockchainProvider, Clock, ContractCall, EventCallback, EventLog, LogQuery, Subscription,
    SystemClock, TransactionReceipt, TransactionRequest, TxStatus,
};

/// Type-erased cached read result.
pub type CacheValue = Arc<dyn Any + Send + Sync>;

/// What stands behind the managers.
#[derive(Clone)]
pub enum ProviderBinding {
    /// No provider was injected.
    Unbound,
    /// The configured deployment has no live contracts yet.
    NotDeployed,
    /// A live provider.
    Live(Arc<dyn BlockchainProvider>),
}

impl std::fmt::Debug for ProviderBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderBinding::Unbound => write!(f, "Unbound"),
            ProviderBinding::NotDeployed => write!(f, "NotDeployed"),
            ProviderBinding::Live(provider) => write!(f, "Live({})", provider.name()),
        }
    }
}

/// Shared manager state.
pub struct ClientContext {
    config: RwLock<PoshConfig>,
    cache: Mutex<TtlCache<CacheValue>>,
    binding: ProviderBinding,
}

impl ClientContext {
    /// Context over an already validated configuration.
    pub fn new(config: PoshConfig, binding: ProviderBinding) -> Self {
        Self::with_clock(config, binding, Arc::new(SystemClock))
    }

    /// As [`ClientContext::new`], with the cache reading time from `clock`.
    pub fn with_clock(config: PoshConfig, binding: ProviderBinding, clock: Arc<dyn Clock>) -> Self {
        let (ttl_ms, max_size) = config.cache_sizing();
        Self {
            config: RwLock::new(config),
            cache: Mutex::new(TtlCache::with_clock(ttl_ms, max_size, clock)),
            binding,
        }
    }

    /// Snapshot of the configuration.
    pub fn config(&self) -> PoshConfig {
        self.config.read().clone()
    }

    /// Provider binding.
    pub fn binding(&self) -> &ProviderBinding {
        &self.binding
    }

    /// Replace the configuration after validating it. The cache is resized
    /// and emptied, since cached reads may belong to the old contracts.
    pub fn replace_config(&self, next: PoshConfig) -> Result<(), PoshError> {
        self.modify_config(|_| next)
    }

    /// Merge `update` into the configuration in force. The merge happens
    /// under the config write lock, so concurrent updates never drop each
    /// other's fields.
    pub fn update_config(&self, update: &ConfigUpdate) -> Result<PoshConfig, PoshError> {
        self.modify_config(|current| current.merged(update))?;
        Ok(self.config())
    }

    fn modify_config<F>(&self, apply: F) -> Result<(), PoshError>
    where
        F: FnOnce(&PoshConfig) -> PoshConfig,
    {
        let mut config = self.config.write();
        let next = apply(&config);
        validate_config(&next)?;
        let (ttl_ms, max_size) = next.cache_sizing();
        *config = next;

        // Lock order: config, then cache.
        let mut cache = self.cache.lock();
        cache.reconfigure(ttl_ms, max_size);
        cache.clear();
        Ok(())
    }

    /// Drop every cached read.
    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    /// Number of cached reads.
    pub fn cached_entries(&self) -> usize {
        self.cache.lock().len()
    }

    // -------------------------------------------------------------------------
    // Binding and addresses
    // -------------------------------------------------------------------------

    /// Live provider for an operation against `role`.
    pub fn provider(
        &self,
        role: ContractRole,
        operation: &str,
    ) -> Result<Arc<dyn BlockchainProvider>, PoshError> {
        match &self.binding {
            ProviderBinding::Live(provider) => Ok(provider.clone()),
            ProviderBinding::Unbound => Err(PoshError::ProviderRequired {
                operation: operation.to_string(),
            }),
            ProviderBinding::NotDeployed => Err(PoshError::NotDeployed {
                contract: role.contract_name().to_string(),
                chain_id: self.config.read().chain_id,
            }),
        }
    }

    /// Configured address of `role`.
    pub fn contract_address(&self, role: ContractRole) -> Result<Address, PoshError> {
        let config = self.config.read();
        config.contracts.get(role).parse().map_err(|_| {
            PoshError::configuration(
                format!("Invalid contract address for {}", role.config_key()),
                None,
                "Update the client configuration with a valid contract address",
            )
        })
    }

    // -------------------------------------------------------------------------
    // Cache
    // -------------------------------------------------------------------------

    /// Fresh cached value under `key`, when caching is enabled.
    pub fn cached<T: Clone + Send + Sync + 'static>(&self, key: &str) -> Option<T> {
        if !self.config.read().caching_enabled() {
            return None;
        }
        let hit = self.cache.lock().get(key)?;
        match hit.downcast_ref::<T>() {
            Some(value) => {
                tracing::debug!(cache_key = key, "Cache hit");
                Some(value.clone())
            }
            None => None,
        }
    }

    /// Store `value` under `key`, when caching is enabled.
    pub fn store<T: Send + Sync + 'static>(&self, key: &str, value: T) {
        if self.config.read().caching_enabled() {
            self.cache.lock().set(key, Arc::new(value) as CacheValue);
        }
    }

    // -------------------------------------------------------------------------
    // Provider calls
    // -------------------------------------------------------------------------

    /// Uncached view call.
    pub async fn read(
        &self,
        role: ContractRole,
        function: AbiFunction,
        args: Vec<AbiValue>,
    ) -> Result<Vec<AbiValue>, PoshError> {
        let provider = self.provider(role, function.name)?;
        let call = ContractCall::new(self.contract_address(role)?, function, args);
        tracing::debug!(contract = role.contract_name(), function = function.name, "Reading contract");

        let retry = self.config.read().active_retry().map(RetryOptions::from);
        let result = match retry {
            Some(options) => {
                retry_if(|| provider.read_contract(&call), &options, is_retryable).await
            }
            None => provider.read_contract(&call).await,
        };
        result.map_err(|e| relabel(e, role, function.name))
    }

    /// View call memoized under `key`, decoded by `decode`.
    pub async fn read_cached<T, F>(
        &self,
        key: &str,
        role: ContractRole,
        function: AbiFunction,
        args: Vec<AbiValue>,
        decode: F,
    ) -> Result<T, PoshError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(Vec<AbiValue>) -> Result<T, PoshError>,
    {
        if let Some(hit) = self.cached::<T>(key) {
            return Ok(hit);
        }
        tracing::debug!(cache_key = key, "Cache miss");

        let value = decode(self.read(role, function, args).await?)?;
        self.store(key, value.clone());
        Ok(value)
    }

    /// Submit a state-changing call and wait for it to be mined.
    pub async fn write(
        &self,
        role: ContractRole,
        function: AbiFunction,
        args: Vec<AbiValue>,
    ) -> Result<TransactionReceipt, PoshError> {
        let provider = self.provider(role, function.name)?;
        let request = TransactionRequest::new(self.contract_address(role)?, function, args);

        let tx_hash = provider
            .write_contract(&request)
            .await
            .map_err(|e| relabel(e, role, function.name))?;
        let receipt = provider.wait_for_transaction(&tx_hash).await?;

        if receipt.status == TxStatus::Reverted {
            tracing::warn!(
                contract = role.contract_name(),
                function = function.name,
                tx_hash = ?tx_hash,
                "Transaction reverted"
            );
            return Err(PoshError::TransactionFailed {
                tx_hash,
                contract: role.contract_name().to_string(),
                function: function.name.to_string(),
            });
        }

        self.clear_cache();
        tracing::info!(
            contract = role.contract_name(),
            function = function.name,
            tx_hash = ?tx_hash,
            block_number = receipt.block_number,
            "Transaction confirmed"
        );
        Ok(receipt)
    }

    /// Gas estimate for a state-changing call. Never cached.
    pub async fn estimate(
        &self,
        role: ContractRole,
        function: AbiFunction,
        args: Vec<AbiValue>,
    ) -> Result<U256, PoshError> {
        let provider = self.provider(role, function.name)?;
        let request = TransactionRequest::new(self.contract_address(role)?, function, args);
        provider
            .estimate_gas(&request)
            .await
            .map_err(|e| relabel(e, role, function.name))
    }

    /// Historical logs of one event.
    pub async fn logs(&self, role: ContractRole, query: &LogQuery) -> Result<Vec<EventLog>, PoshError> {
        let provider = self.provider(role, query.event.name)?;
        provider.get_events(query).await
    }

    /// Live logs of one event.
    pub async fn watch(
        &self,
        role: ContractRole,
        query: &LogQuery,
        callback: EventCallback,
    ) -> Result<Subscription, PoshError> {
        let provider = self.provider(role, query.event.name)?;
        provider.watch_event(query, callback).await
    }
}

/// Adapters name contracts by address; report the contract name instead.
fn relabel(err: PoshError, role: ContractRole, function: &str) -> PoshError {
    match err {
        PoshError::Contract {
            revert_reason,
            details,
            ..
        } => match PoshError::contract(role.contract_name(), function, revert_reason) {
            PoshError::Contract {
                message,
                contract,
                function,
                revert_reason,
                ..
            } => PoshError::Contract {
                message,
                contract,
                function,
                revert_reason,
                details,
            },
            other => other,
        },
        other => other,
    }
}
