//! # Application Layer
//!
//! The client and its managers. Managers only talk to the chain through the
//! shared [`ClientContext`].

pub mod client;
pub mod context;
pub mod events;
pub mod identity;
pub mod proof;
pub mod score;

pub use client::PoshClient;
pub use context::{CacheValue, ClientContext, ProviderBinding};
pub use events::EventManager;
pub use identity::IdentityManager;
pub use proof::ProofManager;
pub use score::ScoreManager;
