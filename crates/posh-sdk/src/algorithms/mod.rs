//! # Algorithms Module
//!
//! Read cache, retry policy, and score/impact aggregation.

pub mod cache;
pub mod retry;
pub mod scoring;

pub use cache::TtlCache;
pub use retry::{backoff_delay, is_retryable, retry, retry_if, retry_with_callback, RetryOptions};
pub use scoring::{
    filter_proofs, level_by_number, level_from_score, summarize_impact, tier_breakdown,
    total_impact, SCORE_LEVELS,
};
