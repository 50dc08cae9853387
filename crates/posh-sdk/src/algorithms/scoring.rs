//! # Score Levels and Impact Aggregation
//!
//! Pure functions over records already fetched from the chain.

use primitive_types::U256;

use crate::domain::{ImpactSummary, ImpactType, LevelName, Proof, ProofQueryOptions, ProofTier, ScoreLevel, TierBreakdown};

/// Score bands, lowest first.
pub const SCORE_LEVELS: [ScoreLevel; 6] = [
    ScoreLevel { level: 0, name: LevelName::None, min_score: 0, max_score: Some(99) },
    ScoreLevel { level: 1, name: LevelName::Bronze, min_score: 100, max_score: Some(999) },
    ScoreLevel { level: 2, name: LevelName::Silver, min_score: 1_000, max_score: Some(9_999) },
    ScoreLevel { level: 3, name: LevelName::Gold, min_score: 10_000, max_score: Some(99_999) },
    ScoreLevel { level: 4, name: LevelName::Platinum, min_score: 100_000, max_score: Some(999_999) },
    ScoreLevel { level: 5, name: LevelName::Diamond, min_score: 1_000_000, max_score: None },
];

/// Band containing `score`.
pub fn level_from_score(score: U256) -> ScoreLevel {
    SCORE_LEVELS
        .iter()
        .rev()
        .find(|level| score >= U256::from(level.min_score))
        .copied()
        .unwrap_or(SCORE_LEVELS[0])
}

/// Band with the given on-chain level number.
pub fn level_by_number(level: u8) -> Option<ScoreLevel> {
    SCORE_LEVELS.get(level as usize).copied()
}

/// Apply type, tier and date filters, then offset and limit.
pub fn filter_proofs(proofs: Vec<Proof>, options: &ProofQueryOptions) -> Vec<Proof> {
    let filtered = proofs.into_iter().filter(|proof| {
        options.impact_type.map_or(true, |t| proof.impact_type == t)
            && options.tier.map_or(true, |t| proof.tier == t)
            && options.start_date.map_or(true, |start| proof.timestamp >= start)
            && options.end_date.map_or(true, |end| proof.timestamp <= end)
    });

    let offset = options.offset.unwrap_or(0);
    match options.limit {
        Some(limit) => filtered.skip(offset).take(limit).collect(),
        None => filtered.skip(offset).collect(),
    }
}

/// Sum of impact values, optionally restricted to one type.
pub fn total_impact(proofs: &[Proof], impact_type: Option<ImpactType>) -> U256 {
    proofs
        .iter()
        .filter(|p| impact_type.map_or(true, |t| p.impact_type == t))
        .fold(U256::zero(), |acc, p| acc.saturating_add(p.impact_value))
}

/// Proof counts per tier.
pub fn tier_breakdown(proofs: &[Proof]) -> TierBreakdown {
    let mut breakdown = TierBreakdown::default();
    for proof in proofs {
        match proof.tier {
            ProofTier::A => breakdown.tier_a += 1,
            ProofTier::B => breakdown.tier_b += 1,
            ProofTier::C => breakdown.tier_c += 1,
        }
        breakdown.total += 1;
    }
    breakdown
}

/// Totals by type and tier. `by_type` lists every impact type in on-chain
/// order, including zero totals.
pub fn summarize_impact(proofs: &[Proof]) -> ImpactSummary {
    ImpactSummary {
        total_impact: total_impact(proofs, None),
        by_type: ImpactType::ALL
            .iter()
            .map(|t| (*t, total_impact(proofs, Some(*t))))
            .collect(),
        by_tier: tier_breakdown(proofs),
        proof_count: proofs.len() as u64,
    }
}
