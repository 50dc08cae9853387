//! # SDK Configuration
//!
//! Client configuration: chain, contract address set, and optional cache and
//! retry policies. JSON field names follow the camelCase shape used by the
//! PoSH tooling (`chainId`, `contracts.identity`, `cache.maxSize`, ...).

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::contracts::registry;
use crate::domain::{validate_config, PoshError};

/// Base Sepolia chain id.
pub const BASE_SEPOLIA_CHAIN_ID: u64 = 84532;
/// Base Mainnet chain id.
pub const BASE_MAINNET_CHAIN_ID: u64 = 8453;

/// Default cache time-to-live.
pub const DEFAULT_CACHE_TTL_MS: u64 = 60_000;
/// Default cache capacity.
pub const DEFAULT_CACHE_MAX_SIZE: usize = 1_000;

/// The four fixed contract roles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContractRole {
    /// `HumanIdentity`.
    Identity,
    /// `ProofRegistry`.
    ProofRegistry,
    /// `PoSHNFT` badges.
    BadgeRegistry,
    /// `HumanScore`.
    ScoreRegistry,
}

impl ContractRole {
    /// All roles in validation order.
    pub const ALL: [ContractRole; 4] = [
        ContractRole::Identity,
        ContractRole::ProofRegistry,
        ContractRole::BadgeRegistry,
        ContractRole::ScoreRegistry,
    ];

    /// Configuration key.
    pub fn config_key(self) -> &'static str {
        match self {
            ContractRole::Identity => "identity",
            ContractRole::ProofRegistry => "proofRegistry",
            ContractRole::BadgeRegistry => "badgeRegistry",
            ContractRole::ScoreRegistry => "scoreRegistry",
        }
    }

    /// Solidity contract name, used in contract errors.
    pub fn contract_name(self) -> &'static str {
        match self {
            ContractRole::Identity => "HumanIdentity",
            ContractRole::ProofRegistry => "ProofRegistry",
            ContractRole::BadgeRegistry => "PoSHNFT",
            ContractRole::ScoreRegistry => "HumanScore",
        }
    }
}

/// Contract address set. Missing JSON fields deserialize to empty strings so
/// validation can name the absent role.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAddresses {
    /// HumanIdentity address.
    #[serde(default, alias = "humanIdentity")]
    pub identity: String,
    /// ProofRegistry address.
    #[serde(default)]
    pub proof_registry: String,
    /// PoSHNFT address.
    #[serde(default, alias = "poshNFT")]
    pub badge_registry: String,
    /// HumanScore address.
    #[serde(default, alias = "humanScore")]
    pub score_registry: String,
}

impl ContractAddresses {
    /// Address set from four string-like values.
    pub fn new(
        identity: impl Into<String>,
        proof_registry: impl Into<String>,
        badge_registry: impl Into<String>,
        score_registry: impl Into<String>,
    ) -> Self {
        Self {
            identity: identity.into(),
            proof_registry: proof_registry.into(),
            badge_registry: badge_registry.into(),
            score_registry: score_registry.into(),
        }
    }

    /// Address configured for a role.
    pub fn get(&self, role: ContractRole) -> &str {
        match role {
            ContractRole::Identity => &self.identity,
            ContractRole::ProofRegistry => &self.proof_registry,
            ContractRole::BadgeRegistry => &self.badge_registry,
            ContractRole::ScoreRegistry => &self.score_registry,
        }
    }

    /// `(config key, address)` pairs in validation order.
    pub fn entries(&self) -> [(&'static str, &str); 4] {
        ContractRole::ALL.map(|role| (role.config_key(), self.get(role)))
    }
}

/// Read-cache policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachePolicy {
    /// Memoize reads.
    pub enabled: bool,
    /// Time-to-live in milliseconds.
    #[serde(rename = "ttl")]
    pub ttl_ms: u64,
    /// Maximum number of entries.
    pub max_size: usize,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_ms: DEFAULT_CACHE_TTL_MS,
            max_size: DEFAULT_CACHE_MAX_SIZE,
        }
    }
}

/// Delay growth between retry attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    /// `initial * n`.
    Linear,
    /// `initial * 2^(n-1)`.
    Exponential,
}

/// Retry policy for remote reads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Retry failed reads.
    pub enabled: bool,
    /// Total attempts including the first.
    pub max_attempts: u32,
    /// Delay growth.
    pub backoff: BackoffKind,
    /// Initial delay in milliseconds.
    #[serde(rename = "initialDelay")]
    pub initial_delay_ms: u64,
}

impl RetryPolicy {
    /// Initial delay as a `Duration`.
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
            backoff: BackoffKind::Exponential,
            initial_delay_ms: 1_000,
        }
    }
}

/// SDK configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoshConfig {
    /// Target chain.
    pub chain_id: u64,
    /// JSON-RPC endpoint used by the CLI and `JsonRpcProvider`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,
    /// Contract address set.
    pub contracts: ContractAddresses,
    /// Read cache; `None` disables caching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<CachePolicy>,
    /// Read retries; `None` disables them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryPolicy>,
}

impl Default for PoshConfig {
    /// Base Sepolia with placeholder addresses, caching and retries on.
    fn default() -> Self {
        Self {
            chain_id: BASE_SEPOLIA_CHAIN_ID,
            rpc_url: None,
            contracts: registry::BASE_SEPOLIA_ADDRESSES.clone(),
            cache: Some(CachePolicy::default()),
            retry: Some(RetryPolicy::default()),
        }
    }
}

impl PoshConfig {
    /// Minimal configuration: chain and contracts, no cache or retry policy.
    pub fn new(chain_id: u64, contracts: ContractAddresses) -> Self {
        Self {
            chain_id,
            rpc_url: None,
            contracts,
            cache: None,
            retry: None,
        }
    }

    /// Small values for tests: short TTL, tiny cache, fast retries.
    pub fn for_testing() -> Self {
        Self {
            cache: Some(CachePolicy {
                enabled: true,
                ttl_ms: 1_000,
                max_size: 16,
            }),
            retry: Some(RetryPolicy {
                enabled: true,
                max_attempts: 3,
                backoff: BackoffKind::Linear,
                initial_delay_ms: 1,
            }),
            ..Self::default()
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json(raw: &str) -> Result<Self, PoshError> {
        let config: PoshConfig = serde_json::from_str(raw).map_err(|e| {
            PoshError::validation(
                format!("Invalid configuration: {}", e),
                None,
                "Check the configuration field names and value types",
            )
        })?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Configuration for a known deployment, with the default policies.
    pub fn from_deployment(name: &str) -> Result<Self, PoshError> {
        let deployment = registry::get_deployment(name).ok_or_else(|| {
            PoshError::validation(
                format!("Unknown deployment: {}", name),
                Some(serde_json::json!({ "deploymentName": name })),
                "Use a known deployment name or provide custom contract addresses",
            )
        })?;
        Ok(Self {
            chain_id: deployment.chain_id,
            contracts: deployment.addresses,
            ..Self::default()
        })
    }

    /// True when reads should be memoized.
    pub fn caching_enabled(&self) -> bool {
        self.cache.as_ref().map(|c| c.enabled).unwrap_or(false)
    }

    /// Cache sizing, falling back to defaults when no policy is set.
    pub fn cache_sizing(&self) -> (u64, usize) {
        match &self.cache {
            Some(policy) => (policy.ttl_ms, policy.max_size),
            None => (DEFAULT_CACHE_TTL_MS, DEFAULT_CACHE_MAX_SIZE),
        }
    }

    /// Active retry policy, if any.
    pub fn active_retry(&self) -> Option<&RetryPolicy> {
        self.retry.as_ref().filter(|r| r.enabled)
    }

    /// Apply a partial update. The result is not validated here.
    pub fn merged(&self, update: &ConfigUpdate) -> Self {
        let mut next = self.clone();
        if let Some(chain_id) = update.chain_id {
            next.chain_id = chain_id;
        }
        if let Some(rpc_url) = &update.rpc_url {
            next.rpc_url = Some(rpc_url.clone());
        }
        if let Some(contracts) = &update.contracts {
            if let Some(v) = &contracts.identity {
                next.contracts.identity = v.clone();
            }
            if let Some(v) = &contracts.proof_registry {
                next.contracts.proof_registry = v.clone();
            }
            if let Some(v) = &contracts.badge_registry {
                next.contracts.badge_registry = v.clone();
            }
            if let Some(v) = &contracts.score_registry {
                next.contracts.score_registry = v.clone();
            }
        }
        if let Some(cache) = &update.cache {
            next.cache = Some(cache.clone());
        }
        if let Some(retry) = &update.retry {
            next.retry = Some(retry.clone());
        }
        next
    }
}

/// Default configuration for a chain: known addresses when the chain has a
/// registered deployment, Base Sepolia otherwise.
pub fn default_config(chain_id: u64) -> PoshConfig {
    let contracts = registry::contract_addresses_for_chain(chain_id)
        .unwrap_or_else(|| registry::BASE_SEPOLIA_ADDRESSES.clone());
    PoshConfig {
        chain_id,
        contracts,
        ..PoshConfig::default()
    }
}

/// Per-role address overrides.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAddressesUpdate {
    /// New HumanIdentity address.
    pub identity: Option<String>,
    /// New ProofRegistry address.
    pub proof_registry: Option<String>,
    /// New PoSHNFT address.
    pub badge_registry: Option<String>,
    /// New HumanScore address.
    pub score_registry: Option<String>,
}

/// Partial configuration update. `None` leaves a field unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    /// New chain id.
    pub chain_id: Option<u64>,
    /// New RPC endpoint.
    pub rpc_url: Option<String>,
    /// Address overrides.
    pub contracts: Option<ContractAddressesUpdate>,
    /// Replacement cache policy.
    pub cache: Option<CachePolicy>,
    /// Replacement retry policy.
    pub retry: Option<RetryPolicy>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "chainId": 84532,
            "contracts": {
                "identity": "0x0000000000000000000000000000000000000001",
                "proofRegistry": "0x0000000000000000000000000000000000000002",
                "badgeRegistry": "0x0000000000000000000000000000000000000003",
                "scoreRegistry": "0x0000000000000000000000000000000000000004"
            },
            "cache": { "enabled": true, "ttl": 60000, "maxSize": 100 },
            "retry": { "enabled": true, "maxAttempts": 3, "backoff": "exponential", "initialDelay": 1000 }
        }"#
    }

    #[test]
    fn test_default_config() {
        let config = PoshConfig::default();
        assert_eq!(config.chain_id, BASE_SEPOLIA_CHAIN_ID);
        assert!(config.caching_enabled());
        assert_eq!(config.active_retry().unwrap().max_attempts, 3);
    }

    #[test]
    fn test_from_json() {
        let config = PoshConfig::from_json(sample_json()).unwrap();
        assert_eq!(config.cache.as_ref().unwrap().max_size, 100);
        assert_eq!(config.retry.as_ref().unwrap().backoff, BackoffKind::Exponential);
        assert_eq!(
            config.contracts.get(ContractRole::ScoreRegistry),
            "0x0000000000000000000000000000000000000004"
        );
    }

    #[test]
    fn test_from_json_accepts_legacy_contract_keys() {
        let raw = r#"{
            "chainId": 8453,
            "contracts": {
                "humanIdentity": "0x0000000000000000000000000000000000000011",
                "proofRegistry": "0x0000000000000000000000000000000000000012",
                "poshNFT": "0x0000000000000000000000000000000000000013",
                "humanScore": "0x0000000000000000000000000000000000000014"
            }
        }"#;
        let config = PoshConfig::from_json(raw).unwrap();
        assert_eq!(config.contracts.badge_registry, "0x0000000000000000000000000000000000000013");
        assert!(!config.caching_enabled());
        assert!(config.active_retry().is_none());
    }

    #[test]
    fn test_from_json_rejects_nan_chain_id() {
        let raw = sample_json().replace("84532", "\"NaN\"");
        let err = PoshConfig::from_json(&raw).unwrap_err();
        assert_eq!(err.code(), crate::domain::codes::VALIDATION_ERROR);
    }

    #[test]
    fn test_from_json_rejects_negative_chain_id() {
        let raw = sample_json().replace("84532", "-1");
        assert!(PoshConfig::from_json(&raw).is_err());
    }

    #[test]
    fn test_from_json_rejects_unknown_backoff() {
        let raw = sample_json().replace("exponential", "random");
        assert!(PoshConfig::from_json(&raw).is_err());
    }

    #[test]
    fn test_from_json_names_missing_contract() {
        let raw = sample_json().replace(
            "\"badgeRegistry\": \"0x0000000000000000000000000000000000000003\",",
            "",
        );
        let err = PoshConfig::from_json(&raw).unwrap_err();
        assert_eq!(err.to_string(), "Missing contract address: badgeRegistry");
    }

    #[test]
    fn test_merged_keeps_untouched_fields() {
        let config = PoshConfig::default();
        let update = ConfigUpdate {
            rpc_url: Some("https://sepolia.base.org".into()),
            contracts: Some(ContractAddressesUpdate {
                score_registry: Some("0x00000000000000000000000000000000000000ff".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let next = config.merged(&update);
        assert_eq!(next.chain_id, config.chain_id);
        assert_eq!(next.contracts.identity, config.contracts.identity);
        assert_eq!(next.contracts.score_registry, "0x00000000000000000000000000000000000000ff");
        assert_eq!(next.rpc_url.as_deref(), Some("https://sepolia.base.org"));
    }

    #[test]
    fn test_from_deployment() {
        let config = PoshConfig::from_deployment("human0-base-mainnet").unwrap();
        assert_eq!(config.chain_id, BASE_MAINNET_CHAIN_ID);
        assert!(PoshConfig::from_deployment("nope").is_err());
    }
}
