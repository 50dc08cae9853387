//! # Contracts Module
//!
//! ABI codec, static contract descriptors and the deployment registry.

pub mod abi;
pub mod definitions;
pub mod registry;

pub use abi::{
    decode_revert_reason, keccak256, AbiEvent, AbiFunction, AbiParam, AbiType, AbiValue,
    StateMutability,
};
pub use definitions::{badge_registry, human_identity, human_score, proof_registry};
pub use registry::{
    contract_addresses_for_chain, get_deployment, get_deployments_by_chain, list_deployments,
    register_deployment, ContractDeployment, BASE_MAINNET_ADDRESSES, BASE_SEPOLIA_ADDRESSES,
    HUMAN0_BASE_MAINNET, HUMAN0_BASE_SEPOLIA,
};
