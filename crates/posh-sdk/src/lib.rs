//! # PoSH SDK
//!
//! Client-side data access for the Proof of Sustainable Humanity contracts.
//!
//! **Contracts:** HumanIdentity, ProofRegistry, HumanScore, PoSHNFT
//! **Architecture:** Hexagonal (Ports/Adapters)
//!
//! ## Purpose
//!
//! Read and write PoSH identity, proof and score state through any
//! blockchain back-end, with:
//! - One provider trait, one adapter per back-end
//! - A bounded TTL cache shared by every manager of a client
//! - Retry with linear or exponential backoff for transport failures
//! - Validation of every input before any remote call
//!
//! ## Error Policy
//!
//! | Kind | Raised | Retried |
//! |------|--------|---------|
//! | Validation | at the API boundary, before I/O | never |
//! | Contract | on revert, with the reason | never |
//! | Network | after the retry budget is spent | per policy |
//! | Configuration | at client construction | never |
//!
//! ## Module Structure
//!
//! ```text
//! posh-sdk/
//! ├── domain/          # Identifiers, records, errors, validation, formatting
//! ├── algorithms/      # TTL cache, retry/backoff, score levels and aggregates
//! ├── contracts/       # ABI codec, contract descriptors, deployment registry
//! ├── ports/           # BlockchainProvider, RpcTransport, Clock
//! ├── adapters/        # JSON-RPC, wallet bridge, in-memory chain
//! ├── application/     # PoshClient and the Identity/Proof/Score/Event managers
//! └── config.rs        # PoshConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod contracts;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{
    HttpTransport, InMemoryProvider, JsonRpcConfig, JsonRpcProvider, ScriptedLog,
    WalletBridgeProvider, WriteOutcome,
};
pub use algorithms::{
    is_retryable, level_from_score, retry, retry_if, retry_with_callback, RetryOptions, TtlCache,
};
pub use application::{
    EventManager, IdentityManager, PoshClient, ProofManager, ProviderBinding, ScoreManager,
};
pub use config::{
    default_config, BackoffKind, CachePolicy, ConfigUpdate, ContractAddresses,
    ContractAddressesUpdate, ContractRole, PoshConfig, RetryPolicy, BASE_MAINNET_CHAIN_ID,
    BASE_SEPOLIA_CHAIN_ID,
};
pub use contracts::{
    get_deployment, get_deployments_by_chain, list_deployments, register_deployment,
    ContractDeployment, HUMAN0_BASE_MAINNET, HUMAN0_BASE_SEPOLIA,
};
pub use domain::{
    format_address, format_human_id, format_impact_value, is_valid_address, is_valid_human_id,
    validate_address, validate_config, validate_human_id, Address, ErrorKind, EventFilter,
    HumanId, HumanRegisteredEvent, Identity, IdentityLinkedEvent, ImpactSummary, ImpactType,
    LevelName, NetworkFailure, PoshError, Proof, ProofQueryOptions, ProofRegisteredEvent,
    ProofTier, RegisterResult, ScoreLevel, TierBreakdown, TransactionResult, TxHash,
};
pub use ports::{
    BlockchainProvider, Clock, ContractCall, EventLog, LogQuery, ManualClock, RpcTransport,
    Subscription, SystemClock, TransactionReceipt, TransactionRequest, TxStatus,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
