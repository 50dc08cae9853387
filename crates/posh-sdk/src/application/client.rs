//! # PoSH Client
//!
//! Entry point of the SDK. Validates the configuration, binds the provider
//! and hands out the managers, which all share one context and one cache.

use std::sync::Arc;

use super::context::{ClientContext, ProviderBinding};
use super::events::EventManager;
use super::identity::IdentityManager;
use super::proof::ProofManager;
use super::score::ScoreManager;
use crate::config::{ConfigUpdate, PoshConfig};
use crate::contracts::get_deployment;
use crate::domain::{validate_config, PoshError};
use crate::ports::{BlockchainProvider, Clock, SystemClock};

/// PoSH SDK client.
///
/// ```ignore
/// let client = PoshClient::new(PoshConfig::from_json(raw)?, Some(provider))?;
/// let registered = client.identity().is_registered(wallet).await?;
/// ```
pub struct PoshClient {
    context: Arc<ClientContext>,
    identity: IdentityManager,
    proofs: ProofManager,
    score: ScoreManager,
    events: EventManager,
}

impl PoshClient {
    /// Client over `config`. Without a provider every operation fails with
    /// [`PoshError::ProviderRequired`].
    pub fn new(
        config: PoshConfig,
        provider: Option<Arc<dyn BlockchainProvider>>,
    ) -> Result<Self, PoshError> {
        let binding = match provider {
            Some(provider) => ProviderBinding::Live(provider),
            None => ProviderBinding::Unbound,
        };
        Self::with_binding(config, binding)
    }

    /// Client over an explicit binding.
    pub fn with_binding(config: PoshConfig, binding: ProviderBinding) -> Result<Self, PoshError> {
        Self::build(config, binding, Arc::new(SystemClock))
    }

    /// As [`PoshClient::with_binding`], with the cache reading time from
    /// `clock`.
    pub fn with_clock(
        config: PoshConfig,
        binding: ProviderBinding,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, PoshError> {
        Self::build(config, binding, clock)
    }

    /// Client for a known deployment. Deployments without live contracts
    /// bind [`ProviderBinding::NotDeployed`] whatever `provider` is.
    pub fn from_deployment(
        name: &str,
        provider: Option<Arc<dyn BlockchainProvider>>,
    ) -> Result<Self, PoshError> {
        let config = PoshConfig::from_deployment(name)?;
        let deployed = get_deployment(name).map(|d| d.deployed).unwrap_or(false);
        if !deployed {
            tracing::warn!(deployment = name, "Deployment has no live contracts");
            return Self::with_binding(config, ProviderBinding::NotDeployed);
        }
        Self::new(config, provider)
    }

    fn build(
        config: PoshConfig,
        binding: ProviderBinding,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, PoshError> {
        validate_config(&config).map_err(as_configuration)?;
        tracing::debug!(chain_id = config.chain_id, binding = ?binding, "Creating PoSH client");

        let context = Arc::new(ClientContext::with_clock(config, binding, clock));
        Ok(Self {
            identity: IdentityManager::new(context.clone()),
            proofs: ProofManager::new(context.clone()),
            score: ScoreManager::new(context.clone()),
            events: EventManager::new(context.clone()),
            context,
        })
    }

    /// Identity operations.
    pub fn identity(&self) -> &IdentityManager {
        &self.identity
    }

    /// Proof queries.
    pub fn proofs(&self) -> &ProofManager {
        &self.proofs
    }

    /// Score queries.
    pub fn score(&self) -> &ScoreManager {
        &self.score
    }

    /// Event subscriptions and history.
    pub fn events(&self) -> &EventManager {
        &self.events
    }

    /// Snapshot of the configuration in force.
    pub fn config(&self) -> PoshConfig {
        self.context.config()
    }

    /// Provider binding.
    pub fn binding(&self) -> &ProviderBinding {
        self.context.binding()
    }

    /// Merge `update` into the configuration. The merged result is validated
    /// first; on failure the previous configuration stays in force.
    pub fn update_config(&self, update: &ConfigUpdate) -> Result<(), PoshError> {
        let config = self.context.update_config(update).map_err(as_configuration)?;
        tracing::info!(chain_id = config.chain_id, "Configuration updated");
        Ok(())
    }

    /// Drop every cached read.
    pub fn clear_cache(&self) {
        self.context.clear_cache();
    }

    /// Number of cached reads.
    pub fn cached_entries(&self) -> usize {
        self.context.cached_entries()
    }
}

fn as_configuration(err: PoshError) -> PoshError {
    match err {
        PoshError::Validation {
            message,
            details,
            remediation,
        } => PoshError::Configuration {
            message,
            details,
            remediation,
        },
        other => other,
    }
}
