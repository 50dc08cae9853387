//! # Domain Errors
//!
//! Error taxonomy for the SDK. Every failure surfaced to callers is a typed
//! `PoshError`, never a bare string, so calling code can branch on
//! [`PoshError::code`] or [`PoshError::kind`].

use primitive_types::H256;
use serde_json::Value;
use thiserror::Error;

/// Machine-checkable error codes.
pub mod codes {
    /// Code of [`super::PoshError::Validation`].
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    /// Code of [`super::PoshError::Configuration`].
    pub const CONFIGURATION_ERROR: &str = "CONFIGURATION_ERROR";
    /// Code of [`super::PoshError::Contract`].
    pub const CONTRACT_ERROR: &str = "CONTRACT_ERROR";
    /// Code of [`super::PoshError::TransactionFailed`].
    pub const TRANSACTION_FAILED: &str = "TRANSACTION_FAILED";
    /// Network failure other than timeout or rate limit.
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    /// Request timed out.
    pub const NETWORK_TIMEOUT: &str = "NETWORK_TIMEOUT";
    /// Rate limited by the endpoint.
    pub const RATE_LIMITED: &str = "RATE_LIMITED";
    /// Code of [`super::PoshError::ProviderRequired`].
    pub const PROVIDER_REQUIRED: &str = "PROVIDER_REQUIRED";
    /// Code of [`super::PoshError::NotDeployed`].
    pub const NOT_DEPLOYED: &str = "NOT_DEPLOYED";
    /// Code of [`super::PoshError::WalletRequired`].
    pub const WALLET_REQUIRED: &str = "WALLET_REQUIRED";
    /// Code of [`super::PoshError::Unsupported`].
    pub const UNSUPPORTED_PROVIDER: &str = "UNSUPPORTED_PROVIDER";
    /// Code of [`super::PoshError::InsufficientFunds`].
    pub const INSUFFICIENT_FUNDS: &str = "INSUFFICIENT_FUNDS";
    /// Code of [`super::PoshError::Decode`].
    pub const DECODE_ERROR: &str = "DECODE_ERROR";
}

/// Broad error category, used by callers that only care about the class of
/// failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input or configuration. Never retried.
    Validation,
    /// Remote call reverted or a contract precondition failed. Never retried.
    Contract,
    /// Transport failure or timeout. Retryable per policy.
    Network,
    /// Invalid client setup. Fatal at construction.
    Configuration,
    /// Missing, unbound or incapable provider.
    Provider,
}

/// What went wrong on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NetworkFailure {
    /// Connection refused, reset, DNS failure.
    Transport,
    /// Request or receipt wait exceeded its deadline.
    Timeout,
    /// HTTP 429 or an explicit rate-limit error from the node.
    RateLimited,
    /// Non-success HTTP status.
    HttpStatus(u16),
    /// JSON-RPC error object that is not a revert.
    Rpc(i64),
}

/// SDK error type.
#[derive(Clone, Debug, Error)]
pub enum PoshError {
    /// Malformed input.
    #[error("{message}")]
    Validation {
        /// Human-readable message, embeds the offending parameter name.
        message: String,
        /// Offending values.
        details: Option<Value>,
        /// How to fix it.
        remediation: Option<String>,
    },

    /// Invalid client setup.
    #[error("{message}")]
    Configuration {
        /// Human-readable message.
        message: String,
        /// Offending values.
        details: Option<Value>,
        /// How to fix it.
        remediation: Option<String>,
    },

    /// A contract call reverted or failed a precondition.
    #[error("{message}")]
    Contract {
        /// Human-readable message.
        message: String,
        /// Contract name (e.g. `HumanIdentity`).
        contract: String,
        /// Function name (e.g. `register`).
        function: String,
        /// Decoded revert reason, when the node supplied one.
        revert_reason: Option<String>,
        /// Raw error payload.
        details: Option<Value>,
    },

    /// A submitted transaction was mined with a reverted status.
    #[error("Transaction {tx_hash:?} reverted in {contract}.{function}")]
    TransactionFailed {
        /// Hash of the reverted transaction.
        tx_hash: H256,
        /// Contract name.
        contract: String,
        /// Function name.
        function: String,
    },

    /// Transport-level failure.
    #[error("{message}")]
    Network {
        /// Human-readable message.
        message: String,
        /// Chain the request targeted.
        chain_id: u64,
        /// Endpoint the request targeted.
        rpc_url: String,
        /// Failure class.
        failure: NetworkFailure,
    },

    /// The operation needs a provider and none was injected.
    #[error("Provider required for {operation}")]
    ProviderRequired {
        /// Operation that was attempted.
        operation: String,
    },

    /// The configured deployment has no live contracts behind it.
    #[error("Contract {contract} is not deployed on chain {chain_id}")]
    NotDeployed {
        /// Contract role that was needed.
        contract: String,
        /// Chain of the deployment.
        chain_id: u64,
    },

    /// The adapter has no signer/wallet for a state-changing call.
    #[error("{adapter} has no signer account; {operation} requires a connected wallet")]
    WalletRequired {
        /// Adapter name.
        adapter: &'static str,
        /// Capability that needed the signer.
        operation: &'static str,
    },

    /// The adapter cannot provide this capability.
    #[error("{capability} is not implemented for {adapter}; use a different adapter")]
    Unsupported {
        /// Adapter name.
        adapter: &'static str,
        /// Capability that was requested.
        capability: &'static str,
    },

    /// Sender cannot pay for value + gas.
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// A provider returned data that does not match the expected shape.
    #[error("Failed to decode {context}: {reason}")]
    Decode {
        /// What was being decoded.
        context: String,
        /// Why it failed.
        reason: String,
    },
}

impl PoshError {
    /// Build a validation error.
    pub fn validation(
        message: impl Into<String>,
        details: Option<Value>,
        remediation: impl Into<String>,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            details,
            remediation: Some(remediation.into()),
        }
    }

    /// Build a configuration error.
    pub fn configuration(
        message: impl Into<String>,
        details: Option<Value>,
        remediation: impl Into<String>,
    ) -> Self {
        Self::Configuration {
            message: message.into(),
            details,
            remediation: Some(remediation.into()),
        }
    }

    /// Build a contract error.
    pub fn contract(
        contract: impl Into<String>,
        function: impl Into<String>,
        revert_reason: Option<String>,
    ) -> Self {
        let contract = contract.into();
        let function = function.into();
        let message = match &revert_reason {
            Some(reason) => format!("{}.{} reverted: {}", contract, function, reason),
            None => format!("{}.{} reverted", contract, function),
        };
        Self::Contract {
            message,
            contract,
            function,
            revert_reason,
            details: None,
        }
    }

    /// Build a network error.
    pub fn network(
        message: impl Into<String>,
        chain_id: u64,
        rpc_url: impl Into<String>,
        failure: NetworkFailure,
    ) -> Self {
        Self::Network {
            message: message.into(),
            chain_id,
            rpc_url: rpc_url.into(),
            failure,
        }
    }

    /// Build a decode error.
    pub fn decode(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// Error class name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "ValidationError",
            Self::Configuration { .. } => "ConfigurationError",
            Self::Contract { .. } | Self::TransactionFailed { .. } | Self::InsufficientFunds(_) => {
                "ContractError"
            }
            Self::Network { .. } => "NetworkError",
            Self::ProviderRequired { .. }
            | Self::NotDeployed { .. }
            | Self::WalletRequired { .. }
            | Self::Unsupported { .. } => "ProviderError",
            Self::Decode { .. } => "PoshSDKError",
        }
    }

    /// Machine-checkable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => codes::VALIDATION_ERROR,
            Self::Configuration { .. } => codes::CONFIGURATION_ERROR,
            Self::Contract { .. } => codes::CONTRACT_ERROR,
            Self::TransactionFailed { .. } => codes::TRANSACTION_FAILED,
            Self::Network { failure, .. } => match failure {
                NetworkFailure::Timeout => codes::NETWORK_TIMEOUT,
                NetworkFailure::RateLimited => codes::RATE_LIMITED,
                _ => codes::NETWORK_ERROR,
            },
            Self::ProviderRequired { .. } => codes::PROVIDER_REQUIRED,
            Self::NotDeployed { .. } => codes::NOT_DEPLOYED,
            Self::WalletRequired { .. } => codes::WALLET_REQUIRED,
            Self::Unsupported { .. } => codes::UNSUPPORTED_PROVIDER,
            Self::InsufficientFunds(_) => codes::INSUFFICIENT_FUNDS,
            Self::Decode { .. } => codes::DECODE_ERROR,
        }
    }

    /// Error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::Contract { .. }
            | Self::TransactionFailed { .. }
            | Self::InsufficientFunds(_)
            | Self::Decode { .. } => ErrorKind::Contract,
            Self::Network { .. } => ErrorKind::Network,
            Self::ProviderRequired { .. }
            | Self::NotDeployed { .. }
            | Self::WalletRequired { .. }
            | Self::Unsupported { .. } => ErrorKind::Provider,
        }
    }

    /// HTTP status carried by a network error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Network {
                failure: NetworkFailure::HttpStatus(status),
                ..
            } => Some(*status),
            Self::Network {
                failure: NetworkFailure::RateLimited,
                ..
            } => Some(429),
            _ => None,
        }
    }

    /// Optional structured payload.
    pub fn details(&self) -> Option<&Value> {
        match self {
            Self::Validation { details, .. }
            | Self::Configuration { details, .. }
            | Self::Contract { details, .. } => details.as_ref(),
            _ => None,
        }
    }

    /// Optional hint on how to fix the problem.
    pub fn remediation(&self) -> Option<&str> {
        match self {
            Self::Validation { remediation, .. } | Self::Configuration { remediation, .. } => {
                remediation.as_deref()
            }
            Self::TransactionFailed { .. } => {
                Some("The transaction was reverted. Check the contract state and try again.")
            }
            Self::Network { .. } => Some("Check the RPC endpoint and network connectivity"),
            Self::ProviderRequired { .. } => {
                Some("Initialize PoshClient with a provider that supports this operation")
            }
            Self::NotDeployed { .. } => {
                Some("Use a deployment with live contracts or provide custom contract addresses")
            }
            Self::WalletRequired { .. } => Some("Configure the provider with a signer account"),
            Self::Unsupported { .. } => Some("Use the JSON-RPC provider for this capability"),
            Self::InsufficientFunds(_) => Some("Fund the sender account and retry"),
            Self::Contract { .. } | Self::Decode { .. } => None,
        }
    }
}
