//! # Adapters
//!
//! One [`BlockchainProvider`](crate::ports::BlockchainProvider) per back-end:
//!
//! - [`JsonRpcProvider`]: Ethereum JSON-RPC over HTTP, every capability.
//! - [`WalletBridgeProvider`]: injected EIP-1193 wallet, no log access.
//! - [`InMemoryProvider`]: in-process chain for tests and demos.

pub mod in_memory;
pub mod json_rpc;
pub mod rpc;
pub mod wallet_bridge;

pub use in_memory::{InMemoryProvider, ScriptedLog, WriteOutcome};
pub use json_rpc::{HttpTransport, JsonRpcConfig, JsonRpcProvider};
pub use rpc::EthRpc;
pub use wallet_bridge::WalletBridgeProvider;
