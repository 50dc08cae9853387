//! # Domain Entities
//!
//! Read-only projections of on-chain state. Every record is rebuilt from the
//! provider on each uncached read and never mutated in place.

use chrono::{DateTime, Utc};
use primitive_types::{H256, U256};
use serde::{Deserialize, Serialize};

use super::errors::PoshError;
use super::value_objects::{Address, HumanId, TxHash};

/// A registered human identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Identifier assigned by the identity registry.
    pub human_id: HumanId,
    /// Wallet bound to the identity.
    pub wallet: Address,
    /// Block time of registration.
    pub registration_time: DateTime<Utc>,
}

/// Category of sustainable impact a proof attests to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactType {
    /// Solar, wind and other renewable generation.
    RenewableEnergy,
    /// Avoided CO2 emissions.
    CarbonAvoidance,
    /// Low-carbon travel.
    SustainableTransport,
    /// Recycling and waste diverted.
    WasteReduction,
    /// Water saved.
    WaterConservation,
}

impl ImpactType {
    /// All categories in on-chain order.
    pub const ALL: [ImpactType; 5] = [
        ImpactType::RenewableEnergy,
        ImpactType::CarbonAvoidance,
        ImpactType::SustainableTransport,
        ImpactType::WasteReduction,
        ImpactType::WaterConservation,
    ];

    /// On-chain `uint8` discriminant.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Stable string form.
    pub fn as_str(self) -> &'static str {
        match self {
            ImpactType::RenewableEnergy => "renewable_energy",
            ImpactType::CarbonAvoidance => "carbon_avoidance",
            ImpactType::SustainableTransport => "sustainable_transport",
            ImpactType::WasteReduction => "waste_reduction",
            ImpactType::WaterConservation => "water_conservation",
        }
    }
}

impl TryFrom<u8> for ImpactType {
    type Error = PoshError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| PoshError::decode("impactType", format!("unknown discriminant {}", value)))
    }
}

/// Verification tier of a proof. A is the strongest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProofTier {
    /// Strongest verification.
    A = 1,
    /// Intermediate verification.
    B = 2,
    /// Weakest verification.
    C = 3,
}

impl TryFrom<u8> for ProofTier {
    type Error = PoshError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ProofTier::A),
            2 => Ok(ProofTier::B),
            3 => Ok(ProofTier::C),
            other => Err(PoshError::decode("tier", format!("unknown tier {}", other))),
        }
    }
}

/// A registered impact proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    /// Proof id.
    pub proof_id: H256,
    /// Owner.
    pub human_id: HumanId,
    /// Impact category.
    pub impact_type: ImpactType,
    /// Impact amount in the category unit.
    pub impact_value: U256,
    /// Verification tier.
    pub tier: ProofTier,
    /// Registration time.
    pub timestamp: DateTime<Utc>,
}

/// Filters applied to a proof listing. Offset/limit apply after filtering.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofQueryOptions {
    /// Only this category.
    pub impact_type: Option<ImpactType>,
    /// Only this tier.
    pub tier: Option<ProofTier>,
    /// Registered at or after.
    pub start_date: Option<DateTime<Utc>>,
    /// Registered at or before.
    pub end_date: Option<DateTime<Utc>>,
    /// Maximum results.
    pub limit: Option<usize>,
    /// Results to skip.
    pub offset: Option<usize>,
}

/// Proof counts per tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierBreakdown {
    /// Tier A proofs.
    pub tier_a: u64,
    /// Tier B proofs.
    pub tier_b: u64,
    /// Tier C proofs.
    pub tier_c: u64,
    /// All proofs.
    pub total: u64,
}

/// Aggregated impact for one human.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactSummary {
    /// Sum over all proofs.
    pub total_impact: U256,
    /// Sum per category in on-chain order, zero totals included.
    pub by_type: Vec<(ImpactType, U256)>,
    /// Proof counts per tier.
    pub by_tier: TierBreakdown,
    /// Number of proofs.
    pub proof_count: u64,
}

/// Named score band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelName {
    /// Below 100.
    None,
    /// 100 and up.
    Bronze,
    /// 1 000 and up.
    Silver,
    /// 10 000 and up.
    Gold,
    /// 100 000 and up.
    Platinum,
    /// 1 000 000 and up.
    Diamond,
}

/// Score level with its inclusive bounds. `max_score` is open-ended for the
/// top band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreLevel {
    /// Numeric level, 0 for None.
    pub level: u8,
    /// Level name.
    pub name: LevelName,
    /// Lowest score in the band.
    pub min_score: u64,
    /// Highest score in the band; `None` for the top band.
    pub max_score: Option<u64>,
}

/// Result of a successful identity registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterResult {
    /// Registration transaction.
    pub tx_hash: TxHash,
    /// New human id.
    pub human_id: HumanId,
}

/// Result of a confirmed state-changing call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionResult {
    /// Transaction hash.
    pub tx_hash: TxHash,
    /// Block it was mined in.
    pub block_number: u64,
}

/// `HumanRegistered` event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanRegisteredEvent {
    /// New human id.
    pub human_id: HumanId,
    /// Registered wallet.
    pub wallet: Address,
    /// Block time of registration.
    pub timestamp: DateTime<Utc>,
    /// Block of the log.
    pub block_number: u64,
    /// Transaction of the log.
    pub transaction_hash: TxHash,
}

/// `ProofRegistered` event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofRegisteredEvent {
    /// Proof id.
    pub proof_id: H256,
    /// Owner.
    pub human_id: HumanId,
    /// Impact category.
    pub impact_type: ImpactType,
    /// Impact amount.
    pub impact_value: U256,
    /// Verification tier.
    pub tier: ProofTier,
    /// Block of the log.
    pub block_number: u64,
    /// Transaction of the log.
    pub transaction_hash: TxHash,
}

/// `IdentityLinked` event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityLinkedEvent {
    /// Linked human.
    pub human_id: HumanId,
    /// External proof hash.
    pub proof_hash: H256,
    /// Attestation provider.
    pub provider: String,
    /// Block time of the link.
    pub timestamp: DateTime<Utc>,
    /// Block of the log.
    pub block_number: u64,
    /// Transaction of the log.
    pub transaction_hash: TxHash,
}

/// Historical event query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// First block, inclusive.
    pub from_block: Option<u64>,
    /// Last block, inclusive.
    pub to_block: Option<u64>,
    /// Restrict to one human (matched against the indexed `humanId` topic).
    pub human_id: Option<HumanId>,
}

/// Seconds since the epoch as a UTC timestamp.
pub fn timestamp_from_secs(secs: U256, context: &str) -> Result<DateTime<Utc>, PoshError> {
    if secs > U256::from(i64::MAX as u64) {
        return Err(PoshError::decode(context, "timestamp out of range"));
    }
    DateTime::<Utc>::from_timestamp(secs.as_u64() as i64, 0)
        .ok_or_else(|| PoshError::decode(context, "timestamp out of range"))
}
