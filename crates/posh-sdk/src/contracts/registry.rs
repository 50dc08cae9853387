//! # Deployment Registry
//!
//! Canonical address sets per chain and a process-wide name → deployment
//! table. The table is seeded once on first access with the official
//! HUMAN-0 deployments. `register_deployment` adds entries at runtime; it is
//! meant to be called during start-up, before clients are built from the
//! registry.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::{ContractAddresses, BASE_MAINNET_CHAIN_ID, BASE_SEPOLIA_CHAIN_ID};
use crate::domain::Address;

/// Name of the official testnet deployment.
pub const HUMAN0_BASE_SEPOLIA: &str = "human0-base-sepolia";
/// Name of the official mainnet deployment.
pub const HUMAN0_BASE_MAINNET: &str = "human0-base-mainnet";

lazy_static! {
    /// Base Sepolia placeholder addresses.
    pub static ref BASE_SEPOLIA_ADDRESSES: ContractAddresses = ContractAddresses::new(
        "0x0000000000000000000000000000000000000001",
        "0x0000000000000000000000000000000000000002",
        "0x0000000000000000000000000000000000000003",
        "0x0000000000000000000000000000000000000004",
    );

    /// Base Mainnet placeholder addresses.
    pub static ref BASE_MAINNET_ADDRESSES: ContractAddresses = ContractAddresses::new(
        "0x0000000000000000000000000000000000000011",
        "0x0000000000000000000000000000000000000012",
        "0x0000000000000000000000000000000000000013",
        "0x0000000000000000000000000000000000000014",
    );

    static ref KNOWN_DEPLOYMENTS: RwLock<HashMap<String, ContractDeployment>> =
        RwLock::new(seed_deployments());
}

/// A named set of PoSH contracts on one chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDeployment {
    /// Display name.
    pub name: String,
    /// Human-readable label.
    pub description: String,
    /// Chain the contracts live on.
    pub chain_id: u64,
    /// Contract address set.
    pub addresses: ContractAddresses,
    /// Deploying account, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployer: Option<Address>,
    /// Deployment time, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_at: Option<DateTime<Utc>>,
    /// Source verified on the block explorer.
    #[serde(default)]
    pub verified: bool,
    /// Live contracts exist at `addresses`. Clients built from a deployment
    /// without live contracts report every operation as not deployed.
    #[serde(default)]
    pub deployed: bool,
}

fn seed_deployments() -> HashMap<String, ContractDeployment> {
    let mut map = HashMap::new();
    map.insert(
        HUMAN0_BASE_SEPOLIA.to_string(),
        ContractDeployment {
            name: "HUMAN-0 Base Sepolia".to_string(),
            description: "Official HUMAN-0 testnet deployment".to_string(),
            chain_id: BASE_SEPOLIA_CHAIN_ID,
            addresses: BASE_SEPOLIA_ADDRESSES.clone(),
            deployer: None,
            deployed_at: None,
            verified: false,
            deployed: false,
        },
    );
    map.insert(
        HUMAN0_BASE_MAINNET.to_string(),
        ContractDeployment {
            name: "HUMAN-0 Base Mainnet".to_string(),
            description: "Official HUMAN-0 mainnet deployment".to_string(),
            chain_id: BASE_MAINNET_CHAIN_ID,
            addresses: BASE_MAINNET_ADDRESSES.clone(),
            deployer: None,
            deployed_at: None,
            verified: false,
            deployed: false,
        },
    );
    map
}

/// Canonical address set for a chain.
pub fn contract_addresses_for_chain(chain_id: u64) -> Option<ContractAddresses> {
    match chain_id {
        BASE_SEPOLIA_CHAIN_ID => Some(BASE_SEPOLIA_ADDRESSES.clone()),
        BASE_MAINNET_CHAIN_ID => Some(BASE_MAINNET_ADDRESSES.clone()),
        _ => None,
    }
}

/// Look up a deployment by name.
pub fn get_deployment(name: &str) -> Option<ContractDeployment> {
    KNOWN_DEPLOYMENTS.read().get(name).cloned()
}

/// Register or replace a deployment.
pub fn register_deployment(key: impl Into<String>, deployment: ContractDeployment) {
    let key = key.into();
    tracing::debug!(deployment = %key, chain_id = deployment.chain_id, "Registering deployment");
    KNOWN_DEPLOYMENTS.write().insert(key, deployment);
}

/// All deployments, ordered by registry key.
pub fn list_deployments() -> Vec<ContractDeployment> {
    let registry = KNOWN_DEPLOYMENTS.read();
    let mut keys: Vec<&String> = registry.keys().collect();
    keys.sort();
    keys.into_iter().filter_map(|k| registry.get(k).cloned()).collect()
}

/// Deployments on one chain, ordered by registry key.
pub fn get_deployments_by_chain(chain_id: u64) -> Vec<ContractDeployment> {
    list_deployments()
        .into_iter()
        .filter(|d| d.chain_id == chain_id)
        .collect()
}
