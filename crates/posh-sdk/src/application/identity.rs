//! # Identity Manager
//!
//! Registration state of wallets and the identity records behind human ids.

use chrono::{DateTime, Utc};
use primitive_types::{H256, U256};
use std::sync::Arc;

use super::context::ClientContext;
use crate::config::ContractRole;
use crate::contracts::{badge_registry, human_identity, AbiValue};
use crate::domain::{
    timestamp_from_secs, validate_address, validate_human_id, validate_non_empty,
    validate_proof_id, Address, HumanId, Identity, PoshError, RegisterResult, TransactionResult,
};
use crate::ports::TransactionReceipt;

/// Identity reads and writes.
#[derive(Clone)]
pub struct IdentityManager {
    context: Arc<ClientContext>,
}

impl IdentityManager {
    pub(crate) fn new(context: Arc<ClientContext>) -> Self {
        Self { context }
    }

    /// Whether `address` owns an identity.
    pub async fn is_registered(&self, address: &str) -> Result<bool, PoshError> {
        let wallet = parse_address(address, "address")?;
        self.context
            .read_cached(
                &format!("isRegistered:{}", wallet),
                ContractRole::Identity,
                human_identity::IS_REGISTERED,
                vec![AbiValue::Address(wallet.0)],
                |values| first(values, "isRegistered")?.to_bool("isRegistered"),
            )
            .await
    }

    /// Human id owned by `address`, `None` when unregistered.
    pub async fn get_human_id(&self, address: &str) -> Result<Option<HumanId>, PoshError> {
        let wallet = parse_address(address, "address")?;
        self.context
            .read_cached(
                &format!("humanId:{}", wallet),
                ContractRole::Identity,
                human_identity::GET_HUMAN_ID,
                vec![AbiValue::Address(wallet.0)],
                |values| {
                    let id = HumanId(first(values, "getHumanId")?.to_fixed_bytes("getHumanId")?);
                    Ok((!id.is_zero()).then_some(id))
                },
            )
            .await
    }

    /// Wallet bound to `human_id`, `None` when the id is unknown.
    pub async fn get_wallet(&self, human_id: &str) -> Result<Option<Address>, PoshError> {
        let id = parse_human_id(human_id)?;
        self.context
            .read_cached(
                &format!("wallet:{}", id),
                ContractRole::Identity,
                human_identity::GET_WALLET,
                vec![AbiValue::FixedBytes(id.0)],
                |values| {
                    let wallet = Address(first(values, "getWallet")?.to_address("getWallet")?);
                    Ok((!wallet.is_zero()).then_some(wallet))
                },
            )
            .await
    }

    /// Registration time of `human_id`, `None` when the id is unknown.
    pub async fn get_registration_time(
        &self,
        human_id: &str,
    ) -> Result<Option<DateTime<Utc>>, PoshError> {
        let id = parse_human_id(human_id)?;
        self.context
            .read_cached(
                &format!("registrationTime:{}", id),
                ContractRole::Identity,
                human_identity::GET_REGISTRATION_TIME,
                vec![AbiValue::FixedBytes(id.0)],
                |values| {
                    let secs = first(values, "getRegistrationTime")?.to_uint("getRegistrationTime")?;
                    if secs.is_zero() {
                        return Ok(None);
                    }
                    timestamp_from_secs(secs, "registrationTime").map(Some)
                },
            )
            .await
    }

    /// Full identity record of `human_id`.
    pub async fn get_identity(&self, human_id: &str) -> Result<Option<Identity>, PoshError> {
        let id = parse_human_id(human_id)?;
        let Some(wallet) = self.get_wallet(human_id).await? else {
            return Ok(None);
        };
        let Some(registration_time) = self.get_registration_time(human_id).await? else {
            return Ok(None);
        };
        Ok(Some(Identity {
            human_id: id,
            wallet,
            registration_time,
        }))
    }

    /// Badges held by `address`.
    pub async fn get_badge_count(&self, address: &str) -> Result<U256, PoshError> {
        let owner = parse_address(address, "address")?;
        self.context
            .read_cached(
                &format!("badgeCount:{}", owner),
                ContractRole::BadgeRegistry,
                badge_registry::BALANCE_OF,
                vec![AbiValue::Address(owner.0)],
                |values| first(values, "balanceOf")?.to_uint("balanceOf"),
            )
            .await
    }

    /// Register the signer's wallet. The new human id is read from the
    /// `HumanRegistered` log of the receipt.
    pub async fn register(&self) -> Result<RegisterResult, PoshError> {
        let receipt = self
            .context
            .write(ContractRole::Identity, human_identity::REGISTER, Vec::new())
            .await?;
        let identity = self.context.contract_address(ContractRole::Identity)?;
        let human_id = registered_human_id(&receipt, identity)?;

        tracing::info!(human_id = %human_id, "Identity registered");
        Ok(RegisterResult {
            tx_hash: receipt.transaction_hash,
            human_id,
        })
    }

    /// Link an external proof (e.g. a KYC attestation hash) to the signer's
    /// identity.
    pub async fn link_external_proof(
        &self,
        proof_hash: &str,
        provider: &str,
    ) -> Result<TransactionResult, PoshError> {
        let args = link_args(proof_hash, provider)?;
        let receipt = self
            .context
            .write(ContractRole::Identity, human_identity::LINK_EXTERNAL_PROOF, args)
            .await?;
        Ok(TransactionResult {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
        })
    }

    /// Gas for [`IdentityManager::register`].
    pub async fn estimate_register_gas(&self) -> Result<U256, PoshError> {
        self.context
            .estimate(ContractRole::Identity, human_identity::REGISTER, Vec::new())
            .await
    }

    /// Gas for [`IdentityManager::link_external_proof`].
    pub async fn estimate_link_proof_gas(
        &self,
        proof_hash: &str,
        provider: &str,
    ) -> Result<U256, PoshError> {
        let args = link_args(proof_hash, provider)?;
        self.context
            .estimate(ContractRole::Identity, human_identity::LINK_EXTERNAL_PROOF, args)
            .await
    }
}

pub(crate) fn parse_address(value: &str, param: &str) -> Result<Address, PoshError> {
    validate_address(value, param)?.parse()
}

pub(crate) fn parse_human_id(value: &str) -> Result<HumanId, PoshError> {
    validate_human_id(value, "humanId")?.parse()
}

pub(crate) fn first(values: Vec<AbiValue>, function: &str) -> Result<AbiValue, PoshError> {
    values
        .into_iter()
        .next()
        .ok_or_else(|| PoshError::decode(function, "empty return data"))
}

fn link_args(proof_hash: &str, provider: &str) -> Result<Vec<AbiValue>, PoshError> {
    let hash: H256 = validate_proof_id(proof_hash, "proofHash")?
        .parse::<HumanId>()?
        .0;
    let provider = validate_non_empty(provider, "provider")?;
    Ok(vec![
        AbiValue::FixedBytes(hash),
        AbiValue::String(provider.to_string()),
    ])
}

fn registered_human_id(receipt: &TransactionReceipt, identity: Address) -> Result<HumanId, PoshError> {
    let topic0 = human_identity::HUMAN_REGISTERED.topic0();
    receipt
        .logs
        .iter()
        .find(|log| log.address == identity && log.topics.first() == Some(&topic0))
        .and_then(|log| log.topics.get(1))
        .map(|topic| HumanId(*topic))
        .ok_or_else(|| {
            PoshError::decode(
                "HumanRegistered",
                format!("no registration log in transaction {:?}", receipt.transaction_hash),
            )
        })
}
