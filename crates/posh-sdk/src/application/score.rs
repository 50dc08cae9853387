//! # Score Manager
//!
//! Reputation score of a human and the level band it falls into.

use primitive_types::U256;
use std::sync::Arc;

use super::context::ClientContext;
use super::identity::{first, parse_human_id};
use super::proof::u64_from;
use crate::algorithms::{level_by_number, level_from_score};
use crate::config::ContractRole;
use crate::contracts::{human_score, AbiValue};
use crate::domain::{validate_threshold, PoshError, ScoreLevel, TierBreakdown};

/// Score queries.
#[derive(Clone)]
pub struct ScoreManager {
    context: Arc<ClientContext>,
}

impl ScoreManager {
    pub(crate) fn new(context: Arc<ClientContext>) -> Self {
        Self { context }
    }

    /// Current score of `human_id`.
    pub async fn get_score(&self, human_id: &str) -> Result<U256, PoshError> {
        let id = parse_human_id(human_id)?;
        self.context
            .read_cached(
                &format!("score:{}", id),
                ContractRole::ScoreRegistry,
                human_score::GET_SCORE,
                vec![AbiValue::FixedBytes(id.0)],
                |values| first(values, "getScore")?.to_uint("getScore"),
            )
            .await
    }

    /// Level recorded on chain for `human_id`.
    pub async fn get_level(&self, human_id: &str) -> Result<ScoreLevel, PoshError> {
        let id = parse_human_id(human_id)?;
        self.context
            .read_cached(
                &format!("level:{}", id),
                ContractRole::ScoreRegistry,
                human_score::GET_LEVEL,
                vec![AbiValue::FixedBytes(id.0)],
                |values| {
                    let raw = first(values, "getLevel")?.to_uint("getLevel")?;
                    let level = u8::try_from(u64_from(raw, "getLevel")?).ok();
                    level
                        .and_then(level_by_number)
                        .ok_or_else(|| PoshError::decode("getLevel", format!("unknown level {}", raw)))
                },
            )
            .await
    }

    /// True when the score of `human_id` is at least `threshold`.
    pub async fn meets_threshold(&self, human_id: &str, threshold: u64) -> Result<bool, PoshError> {
        parse_human_id(human_id)?;
        let threshold = validate_threshold(threshold, "threshold")?;
        Ok(self.get_score(human_id).await? >= U256::from(threshold))
    }

    /// Proof counts per tier, as tallied by the score contract.
    pub async fn get_tier_breakdown(&self, human_id: &str) -> Result<TierBreakdown, PoshError> {
        let id = parse_human_id(human_id)?;
        self.context
            .read_cached(
                &format!("tierBreakdown:{}", id),
                ContractRole::ScoreRegistry,
                human_score::GET_TIER_BREAKDOWN,
                vec![AbiValue::FixedBytes(id.0)],
                |values| {
                    let counts = values
                        .iter()
                        .map(|v| u64_from(v.to_uint("getTierBreakdown")?, "getTierBreakdown"))
                        .collect::<Result<Vec<u64>, PoshError>>()?;
                    match counts.as_slice() {
                        [tier_a, tier_b, tier_c] => Ok(TierBreakdown {
                            tier_a: *tier_a,
                            tier_b: *tier_b,
                            tier_c: *tier_c,
                            total: tier_a.saturating_add(*tier_b).saturating_add(*tier_c),
                        }),
                        other => Err(PoshError::decode(
                            "getTierBreakdown",
                            format!("expected 3 values, got {}", other.len()),
                        )),
                    }
                },
            )
            .await
    }

    /// Band containing `score`. Needs no provider.
    pub fn level_from_score(&self, score: U256) -> ScoreLevel {
        level_from_score(score)
    }
}
