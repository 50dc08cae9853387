//! # Validation
//!
//! Two tiers, applied uniformly:
//! - predicates (`is_valid_*`) answer with a `bool` and never fail;
//! - validators (`validate_*`) return the input unchanged on success and a
//!   [`PoshError::Validation`] naming the offending parameter on failure.
//!
//! `validate_config` walks the whole configuration and stops at the first
//! violation: chain id, presence of each contract address, address format,
//! RPC URL, then the optional cache and retry policies.

use serde_json::json;

use super::errors::PoshError;
use crate::config::PoshConfig;

const ADDRESS_HEX_LEN: usize = 40;
const HUMAN_ID_HEX_LEN: usize = 64;

const ADDRESS_REMEDIATION: &str =
    "Provide a valid Ethereum address (0x followed by 40 hexadecimal characters)";
const HUMAN_ID_REMEDIATION: &str =
    "Provide a valid humanId (0x followed by 64 hexadecimal characters)";

fn is_prefixed_hex(value: &str, digits: usize) -> bool {
    match value.strip_prefix("0x") {
        Some(body) => body.len() == digits && body.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}

/// `0x` followed by exactly 40 hex digits.
pub fn is_valid_address(value: &str) -> bool {
    is_prefixed_hex(value, ADDRESS_HEX_LEN)
}

/// `0x` followed by exactly 64 hex digits.
pub fn is_valid_human_id(value: &str) -> bool {
    is_prefixed_hex(value, HUMAN_ID_HEX_LEN)
}

/// Validate an address, naming `param` in the error.
pub fn validate_address<'a>(value: &'a str, param: &str) -> Result<&'a str, PoshError> {
    if !is_valid_address(value) {
        return Err(PoshError::validation(
            format!("Invalid {}: {}", param, value),
            Some(json!({ param: value })),
            ADDRESS_REMEDIATION,
        ));
    }
    Ok(value)
}

/// Validate a human id, naming `param` in the error.
pub fn validate_human_id<'a>(value: &'a str, param: &str) -> Result<&'a str, PoshError> {
    if !is_valid_human_id(value) {
        return Err(PoshError::validation(
            format!("Invalid {}: {}", param, value),
            Some(json!({ param: value })),
            HUMAN_ID_REMEDIATION,
        ));
    }
    Ok(value)
}

/// Proof ids share the bytes32 shape of human ids.
pub fn validate_proof_id<'a>(value: &'a str, param: &str) -> Result<&'a str, PoshError> {
    if !is_valid_human_id(value) {
        return Err(PoshError::validation(
            format!("Invalid {}: {}", param, value),
            Some(json!({ param: value })),
            "Provide a valid proof id (0x followed by 64 hexadecimal characters)",
        ));
    }
    Ok(value)
}

/// Validate a free-text field that must not be blank.
pub fn validate_non_empty<'a>(value: &'a str, param: &str) -> Result<&'a str, PoshError> {
    if value.trim().is_empty() {
        return Err(PoshError::validation(
            format!("Invalid {}: must be a non-empty string", param),
            Some(json!({ param: value })),
            format!("Provide a value for {}", param),
        ));
    }
    Ok(value)
}

/// Score thresholds must be positive.
pub fn validate_threshold(value: u64, param: &str) -> Result<u64, PoshError> {
    if value == 0 {
        return Err(PoshError::validation(
            format!("Invalid {}: must be a positive number", param),
            Some(json!({ param: value })),
            "Provide a threshold greater than zero",
        ));
    }
    Ok(value)
}

/// Validate a full configuration.
pub fn validate_config(config: &PoshConfig) -> Result<(), PoshError> {
    if config.chain_id == 0 {
        return Err(PoshError::validation(
            "Invalid chainId: must be a positive number",
            Some(json!({ "chainId": config.chain_id })),
            "Provide a valid chainId (e.g., 84532 for Base Sepolia, 8453 for Base Mainnet)",
        ));
    }

    for (name, address) in config.contracts.entries() {
        if address.trim().is_empty() {
            return Err(PoshError::validation(
                format!("Missing contract address: {}", name),
                Some(json!({ "contractName": name })),
                format!("Provide a valid address for {} contract", name),
            ));
        }
    }

    for (name, address) in config.contracts.entries() {
        if !is_valid_address(address) {
            return Err(PoshError::validation(
                format!("Invalid contract address for {}: {}", name, address),
                Some(json!({ "contractName": name, "address": address })),
                ADDRESS_REMEDIATION,
            ));
        }
    }

    if let Some(rpc_url) = &config.rpc_url {
        if rpc_url.trim().is_empty() {
            return Err(PoshError::validation(
                "Invalid rpcUrl: must be a non-empty string",
                Some(json!({ "rpcUrl": rpc_url })),
                "Provide a valid RPC URL (e.g., https://sepolia.base.org)",
            ));
        }
        if reqwest::Url::parse(rpc_url).is_err() {
            return Err(PoshError::validation(
                format!("Invalid rpcUrl format: {}", rpc_url),
                Some(json!({ "rpcUrl": rpc_url })),
                "Provide a valid URL for the RPC endpoint",
            ));
        }
    }

    if let Some(cache) = &config.cache {
        if cache.max_size == 0 {
            return Err(PoshError::validation(
                "Invalid cache.maxSize: must be a positive number",
                Some(json!({ "maxSize": cache.max_size })),
                "Set cache.maxSize to a positive number (e.g., 1000)",
            ));
        }
    }

    if let Some(retry) = &config.retry {
        if retry.max_attempts < 1 {
            return Err(PoshError::validation(
                "Invalid retry.maxAttempts: must be at least 1",
                Some(json!({ "maxAttempts": retry.max_attempts })),
                "Set retry.maxAttempts to a positive number (e.g., 3)",
            ));
        }
    }

    Ok(())
}
