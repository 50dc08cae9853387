//! # Proof Manager
//!
//! Impact proofs of a human and their aggregates.
//!
//! A listing reads the proof ids of a human, then every proof concurrently
//! on the calling task. The full listing is cached once per human; filters
//! and aggregates are computed from it without further provider calls.

use futures::future::try_join_all;
use primitive_types::{H256, U256};
use std::sync::Arc;

use super::context::ClientContext;
use super::identity::{first, parse_human_id};
use crate::algorithms::{filter_proofs, summarize_impact, total_impact};
use crate::config::ContractRole;
use crate::contracts::{proof_registry, AbiValue};
use crate::domain::{
    timestamp_from_secs, validate_proof_id, HumanId, ImpactSummary, ImpactType, PoshError, Proof,
    ProofQueryOptions, ProofTier,
};

/// Proof queries.
#[derive(Clone)]
pub struct ProofManager {
    context: Arc<ClientContext>,
}

impl ProofManager {
    pub(crate) fn new(context: Arc<ClientContext>) -> Self {
        Self { context }
    }

    /// Proofs of `human_id` matching `options`.
    pub async fn get_human_proofs(
        &self,
        human_id: &str,
        options: &ProofQueryOptions,
    ) -> Result<Vec<Proof>, PoshError> {
        let id = parse_human_id(human_id)?;
        let proofs = self.all_proofs(id).await?;
        Ok(filter_proofs(proofs, options))
    }

    /// One proof, `None` when the id is unknown.
    pub async fn get_proof(&self, proof_id: &str) -> Result<Option<Proof>, PoshError> {
        let id: H256 = validate_proof_id(proof_id, "proofId")?.parse::<HumanId>()?.0;
        self.proof_by_id(id).await
    }

    /// Number of proofs registered for `human_id`.
    pub async fn get_proof_count(&self, human_id: &str) -> Result<u64, PoshError> {
        let id = parse_human_id(human_id)?;
        self.context
            .read_cached(
                &format!("proofCount:{}", id),
                ContractRole::ProofRegistry,
                proof_registry::GET_PROOF_COUNT,
                vec![AbiValue::FixedBytes(id.0)],
                |values| {
                    let count = first(values, "getProofCount")?.to_uint("getProofCount")?;
                    u64_from(count, "getProofCount")
                },
            )
            .await
    }

    /// Sum of impact values, optionally restricted to one category.
    pub async fn get_total_impact(
        &self,
        human_id: &str,
        impact_type: Option<ImpactType>,
    ) -> Result<U256, PoshError> {
        let id = parse_human_id(human_id)?;
        let proofs = self.all_proofs(id).await?;
        Ok(total_impact(&proofs, impact_type))
    }

    /// Totals per category and per tier.
    pub async fn get_impact_summary(&self, human_id: &str) -> Result<ImpactSummary, PoshError> {
        let id = parse_human_id(human_id)?;
        let proofs = self.all_proofs(id).await?;
        Ok(summarize_impact(&proofs))
    }

    async fn all_proofs(&self, human_id: HumanId) -> Result<Vec<Proof>, PoshError> {
        let key = format!("proofs:{}", human_id);
        if let Some(hit) = self.context.cached::<Vec<Proof>>(&key) {
            return Ok(hit);
        }

        let values = self
            .context
            .read(
                ContractRole::ProofRegistry,
                proof_registry::GET_HUMAN_PROOFS,
                vec![AbiValue::FixedBytes(human_id.0)],
            )
            .await?;
        let ids = first(values, "getHumanProofs")?.to_fixed_bytes_array("getHumanProofs")?;

        let records = try_join_all(ids.iter().map(|id| self.proof_by_id(*id))).await?;
        let mut proofs = Vec::with_capacity(records.len());
        for (id, record) in ids.iter().zip(records) {
            match record {
                Some(proof) => proofs.push(proof),
                None => tracing::warn!(proof_id = ?id, "Listed proof has no record"),
            }
        }

        self.context.store(&key, proofs.clone());
        Ok(proofs)
    }

    async fn proof_by_id(&self, proof_id: H256) -> Result<Option<Proof>, PoshError> {
        self.context
            .read_cached(
                &format!("proof:{:?}", proof_id),
                ContractRole::ProofRegistry,
                proof_registry::GET_PROOF,
                vec![AbiValue::FixedBytes(proof_id)],
                |values| decode_proof(proof_id, values),
            )
            .await
    }
}

fn decode_proof(proof_id: H256, values: Vec<AbiValue>) -> Result<Option<Proof>, PoshError> {
    let [human_id, impact_type, impact_value, tier, timestamp]: [AbiValue; 5] =
        values.try_into().map_err(|v: Vec<AbiValue>| {
            PoshError::decode("getProof", format!("expected 5 values, got {}", v.len()))
        })?;

    let human_id = HumanId(human_id.to_fixed_bytes("getProof.humanId")?);
    if human_id.is_zero() {
        return Ok(None);
    }

    Ok(Some(Proof {
        proof_id,
        human_id,
        impact_type: ImpactType::try_from(small_uint(&impact_type, "getProof.impactType")?)?,
        impact_value: impact_value.to_uint("getProof.impactValue")?,
        tier: ProofTier::try_from(small_uint(&tier, "getProof.tier")?)?,
        timestamp: timestamp_from_secs(timestamp.to_uint("getProof.timestamp")?, "getProof.timestamp")?,
    }))
}

pub(crate) fn small_uint(value: &AbiValue, context: &str) -> Result<u8, PoshError> {
    let raw = value.to_uint(context)?;
    if raw.bits() > 8 {
        return Err(PoshError::decode(context, "value does not fit uint8"));
    }
    Ok(raw.low_u32() as u8)
}

pub(crate) fn u64_from(value: U256, context: &str) -> Result<u64, PoshError> {
    if value > U256::from(u64::MAX) {
        return Err(PoshError::decode(context, "value does not fit u64"));
    }
    Ok(value.as_u64())
}
