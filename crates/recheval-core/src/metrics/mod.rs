//! Metric library: ranking metrics and rating-error metrics.
//!
//! Every metric compares a *recommended* store (predicted scores, already
//! filtered by a candidate strategy) with a *truth* store (held-out test
//! ratings). Metrics are two-phase: construct, call [`Metric::compute`]
//! once, then read cached results through the accessors.
//!
//! # Metrics Reference
//!
//! | Metric | Description |
//! |--------|-------------|
//! | NDCG@k | Graded, position-aware ranking quality |
//! | P@k | Fraction of the top k that is relevant (fixed denominator k) |
//! | R@k | Fraction of the relevant items found in the top k |
//! | MAP@k | Mean average precision truncated at k |
//! | RMSE | Root mean squared error over pairs present in both stores |
//! | MAE | Mean absolute error over the same pairs |

pub mod ranking;
pub mod rating_error;

pub use ranking::{
    average_precision_at_k, ndcg_at_k, precision_at_k, ranked_items, recall_at_k,
    validate_cutoffs, NdcgGain, RankingKind, RankingMetric,
};
pub use rating_error::{ErrorKind, ErrorMetric};

/// Two-phase metric interface.
pub trait Metric {
    /// Short identifier used in reports and errors.
    fn name(&self) -> &'static str;

    /// Performs the full pass and caches the results.
    fn compute(&mut self);

    fn is_computed(&self) -> bool;
}
