//! # Ports Module
//!
//! Outbound dependencies: blockchain providers, RPC transports and time.

pub mod outbound;

pub use outbound::*;
