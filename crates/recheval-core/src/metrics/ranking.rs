//! Ranking metrics: NDCG, Precision, Recall and MAP at cutoffs.
//!
//! The free functions score one user's ranked list; [`RankingMetric`]
//! runs them over whole stores and macro-averages across users.
//!
//! # References
//!
//! - Järvelin & Kekäläinen (2002). "Cumulated gain-based evaluation of IR techniques"
//! - Voorhees & Harman (2005). "TREC: Experiment and Evaluation in Information Retrieval"

use super::Metric;
use crate::error::{ConfigError, MetricError};
use crate::model::{ItemId, RatingStore, UserId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Gain applied to a relevance value in DCG.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NdcgGain {
    /// The relevance itself
    #[default]
    Linear,
    /// `2^rel - 1`, rewarding highly relevant items more steeply
    Exponential,
}

/// Sorts predictions into a ranked list.
///
/// Highest predicted value first; ties break by ascending item id. NaN
/// predictions rank after every number.
pub fn ranked_items(predictions: &BTreeMap<ItemId, f64>) -> Vec<(ItemId, f64)> {
    let mut ranked: Vec<(ItemId, f64)> = predictions.iter().map(|(i, v)| (*i, *v)).collect();
    ranked.sort_by(|a, b| match sort_key(b.1).total_cmp(&sort_key(a.1)) {
        Ordering::Equal => a.0.cmp(&b.0),
        ord => ord,
    });
    ranked
}

#[inline]
fn sort_key(value: f64) -> f64 {
    if value.is_nan() {
        f64::NEG_INFINITY
    } else {
        value
    }
}

// ============================================================================
// NDCG (Normalized Discounted Cumulative Gain)
// ============================================================================

/// Computes NDCG@k for one user.
///
/// # Formula
///
/// ```text
/// DCG@k  = Σ gain(rel_r) / log₂(r + 1)   for r in 1..=min(k, len)
/// IDCG@k = DCG@k of the truth values sorted descending
/// NDCG@k = DCG@k / IDCG@k, or 0 when IDCG@k = 0
/// ```
///
/// The relevance of a ranked item is its truth value, or 0 when the item has
/// no truth entry. Non-finite and negative truth values count as 0, which
/// keeps the result in [0, 1].
pub fn ndcg_at_k(
    ranked: &[(ItemId, f64)],
    truth: &BTreeMap<ItemId, f64>,
    k: usize,
    gain_type: NdcgGain,
) -> f64 {
    let dcg: f64 = ranked
        .iter()
        .take(k)
        .enumerate()
        .map(|(i, (item, _))| {
            let rel = truth.get(item).copied().map_or(0.0, relevance);
            gain(rel, gain_type) / discount(i + 1)
        })
        .sum();

    let mut ideal: Vec<f64> = truth.values().copied().map(relevance).collect();
    ideal.sort_by(|a, b| b.total_cmp(a));

    let idcg: f64 = ideal
        .iter()
        .take(k)
        .enumerate()
        .map(|(i, &rel)| gain(rel, gain_type) / discount(i + 1))
        .sum();

    if idcg == 0.0 {
        0.0
    } else {
        dcg / idcg
    }
}

#[inline]
fn relevance(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[inline]
fn gain(relevance: f64, gain_type: NdcgGain) -> f64 {
    match gain_type {
        NdcgGain::Linear => relevance,
        NdcgGain::Exponential => relevance.exp2() - 1.0,
    }
}

/// Logarithmic discount for a 1-indexed position: log₂(position + 1).
#[inline]
fn discount(position: usize) -> f64 {
    (position as f64 + 1.0).log2()
}

// ============================================================================
// Set-Based Metrics: Precision, Recall, MAP
// ============================================================================

fn is_relevant(truth: &BTreeMap<ItemId, f64>, item: &ItemId, threshold: f64) -> bool {
    truth.get(item).is_some_and(|v| *v >= threshold)
}

fn relevant_count(truth: &BTreeMap<ItemId, f64>, threshold: f64) -> usize {
    truth.values().filter(|v| **v >= threshold).count()
}

fn hits_at_k(ranked: &[(ItemId, f64)], truth: &BTreeMap<ItemId, f64>, threshold: f64, k: usize) -> usize {
    ranked
        .iter()
        .take(k)
        .filter(|(item, _)| is_relevant(truth, item, threshold))
        .count()
}

/// Computes Precision@k for one user.
///
/// ```text
/// P@k = |relevant ∩ top_k| / k
/// ```
///
/// The denominator is always `k`, so a list shorter than `k` is penalised.
/// An item is relevant when its truth value is at least `threshold`.
pub fn precision_at_k(
    ranked: &[(ItemId, f64)],
    truth: &BTreeMap<ItemId, f64>,
    threshold: f64,
    k: usize,
) -> f64 {
    if k == 0 {
        return 0.0;
    }
    hits_at_k(ranked, truth, threshold, k) as f64 / k as f64
}

/// Computes Recall@k for one user.
///
/// ```text
/// R@k = |relevant ∩ top_k| / |relevant|
/// ```
///
/// Returns 0.0 when the user has no relevant truth items.
pub fn recall_at_k(
    ranked: &[(ItemId, f64)],
    truth: &BTreeMap<ItemId, f64>,
    threshold: f64,
    k: usize,
) -> f64 {
    let total_relevant = relevant_count(truth, threshold);
    if total_relevant == 0 {
        return 0.0;
    }
    hits_at_k(ranked, truth, threshold, k) as f64 / total_relevant as f64
}

/// Computes Average Precision@k for one user.
///
/// ```text
/// AP@k = Σ P@r · rel(r) / min(k, |relevant|)   for r in 1..=k
/// ```
///
/// Returns 0.0 when the user has no relevant truth items.
pub fn average_precision_at_k(
    ranked: &[(ItemId, f64)],
    truth: &BTreeMap<ItemId, f64>,
    threshold: f64,
    k: usize,
) -> f64 {
    let total_relevant = relevant_count(truth, threshold);
    if total_relevant == 0 || k == 0 {
        return 0.0;
    }

    let mut precision_sum = 0.0;
    let mut relevant_found = 0;
    for (i, (item, _)) in ranked.iter().take(k).enumerate() {
        if is_relevant(truth, item, threshold) {
            relevant_found += 1;
            precision_sum += relevant_found as f64 / (i + 1) as f64;
        }
    }

    precision_sum / total_relevant.min(k) as f64
}

// ============================================================================
// Store-level metric
// ============================================================================

/// Which ranking metric a [`RankingMetric`] computes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RankingKind {
    Ndcg(NdcgGain),
    Precision { threshold: f64 },
    Recall { threshold: f64 },
    AveragePrecision { threshold: f64 },
}

impl RankingKind {
    pub fn name(&self) -> &'static str {
        match self {
            RankingKind::Ndcg(_) => "ndcg",
            RankingKind::Precision { .. } => "precision",
            RankingKind::Recall { .. } => "recall",
            RankingKind::AveragePrecision { .. } => "map",
        }
    }

    fn score(&self, ranked: &[(ItemId, f64)], truth: &BTreeMap<ItemId, f64>, k: usize) -> f64 {
        match *self {
            RankingKind::Ndcg(gain) => ndcg_at_k(ranked, truth, k, gain),
            RankingKind::Precision { threshold } => precision_at_k(ranked, truth, threshold, k),
            RankingKind::Recall { threshold } => recall_at_k(ranked, truth, threshold, k),
            RankingKind::AveragePrecision { threshold } => {
                average_precision_at_k(ranked, truth, threshold, k)
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
struct CutoffResults {
    per_user: BTreeMap<usize, BTreeMap<UserId, f64>>,
    mean: BTreeMap<usize, f64>,
}

/// A ranking metric over a recommended store and a truth store.
///
/// # Averaging
///
/// Scores are computed per truth user and macro-averaged. Every user in the
/// truth store takes part; a user missing from the recommended store scores 0.
/// Users who only appear in the recommended store are ignored. With no truth
/// users at all, every cutoff averages to 0.
///
/// # Example
///
/// ```ignore
/// let mut ndcg = RankingMetric::ndcg(&recommended, &test, &[5, 10])?;
/// ndcg.compute();
/// println!("NDCG@10: {:.4}", ndcg.value_at(10)?);
/// ```
#[derive(Debug, Clone)]
pub struct RankingMetric<'a> {
    kind: RankingKind,
    recommended: &'a RatingStore,
    truth: &'a RatingStore,
    cutoffs: Vec<usize>,
    results: Option<CutoffResults>,
}

impl<'a> RankingMetric<'a> {
    /// Creates a metric, validating the cutoffs.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NoCutoffs`] for an empty list,
    /// [`ConfigError::InvalidCutoff`] for a zero cutoff.
    pub fn new(
        kind: RankingKind,
        recommended: &'a RatingStore,
        truth: &'a RatingStore,
        cutoffs: &[usize],
    ) -> Result<Self, ConfigError> {
        validate_cutoffs(cutoffs)?;
        let mut cutoffs = cutoffs.to_vec();
        cutoffs.sort_unstable();
        cutoffs.dedup();
        Ok(Self {
            kind,
            recommended,
            truth,
            cutoffs,
            results: None,
        })
    }

    /// NDCG with linear gain.
    pub fn ndcg(
        recommended: &'a RatingStore,
        truth: &'a RatingStore,
        cutoffs: &[usize],
    ) -> Result<Self, ConfigError> {
        Self::new(RankingKind::Ndcg(NdcgGain::Linear), recommended, truth, cutoffs)
    }

    pub fn precision(
        recommended: &'a RatingStore,
        truth: &'a RatingStore,
        threshold: f64,
        cutoffs: &[usize],
    ) -> Result<Self, ConfigError> {
        Self::new(RankingKind::Precision { threshold }, recommended, truth, cutoffs)
    }

    pub fn recall(
        recommended: &'a RatingStore,
        truth: &'a RatingStore,
        threshold: f64,
        cutoffs: &[usize],
    ) -> Result<Self, ConfigError> {
        Self::new(RankingKind::Recall { threshold }, recommended, truth, cutoffs)
    }

    pub fn map(
        recommended: &'a RatingStore,
        truth: &'a RatingStore,
        threshold: f64,
        cutoffs: &[usize],
    ) -> Result<Self, ConfigError> {
        Self::new(
            RankingKind::AveragePrecision { threshold },
            recommended,
            truth,
            cutoffs,
        )
    }

    pub fn kind(&self) -> RankingKind {
        self.kind
    }

    /// Configured cutoffs, ascending and deduplicated.
    pub fn cutoffs(&self) -> &[usize] {
        &self.cutoffs
    }

    /// Mean over users at cutoff `k`.
    pub fn value_at(&self, k: usize) -> Result<f64, MetricError> {
        self.results()?
            .mean
            .get(&k)
            .copied()
            .ok_or(MetricError::UnknownCutoff {
                metric: self.name(),
                cutoff: k,
            })
    }

    /// Mean over users for every cutoff.
    pub fn values(&self) -> Result<&BTreeMap<usize, f64>, MetricError> {
        Ok(&self.results()?.mean)
    }

    /// Per-user scores at cutoff `k`.
    pub fn per_user_at(&self, k: usize) -> Result<&BTreeMap<UserId, f64>, MetricError> {
        self.results()?
            .per_user
            .get(&k)
            .ok_or(MetricError::UnknownCutoff {
                metric: self.name(),
                cutoff: k,
            })
    }

    fn results(&self) -> Result<&CutoffResults, MetricError> {
        self.results
            .as_ref()
            .ok_or(MetricError::NotComputed(self.name()))
    }
}

impl Metric for RankingMetric<'_> {
    fn name(&self) -> &'static str {
        self.kind.name()
    }

    fn compute(&mut self) {
        let mut results = CutoffResults::default();
        let user_count = self.truth.num_users();

        for (user, truth) in self.truth.iter_users() {
            let ranked = self
                .recommended
                .user_preferences(user)
                .map(ranked_items)
                .unwrap_or_default();

            for &k in &self.cutoffs {
                let score = self.kind.score(&ranked, truth, k);
                results.per_user.entry(k).or_default().insert(user, score);
            }
        }

        for &k in &self.cutoffs {
            let sum: f64 = results
                .per_user
                .get(&k)
                .map(|scores| scores.values().sum())
                .unwrap_or(0.0);
            let mean = if user_count == 0 {
                0.0
            } else {
                sum / user_count as f64
            };
            results.mean.insert(k, mean);
        }

        self.results = Some(results);
    }

    fn is_computed(&self) -> bool {
        self.results.is_some()
    }
}

/// Rejects empty cutoff lists and zero cutoffs.
pub fn validate_cutoffs(cutoffs: &[usize]) -> Result<(), ConfigError> {
    if cutoffs.is_empty() {
        return Err(ConfigError::NoCutoffs);
    }
    match cutoffs.iter().find(|k| **k == 0) {
        Some(&k) => Err(ConfigError::InvalidCutoff(k)),
        None => Ok(()),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u64) -> ItemId {
        ItemId::from_u64(id)
    }

    fn user(id: u64) -> UserId {
        UserId::from_u64(id)
    }

    fn prefs(entries: &[(u64, f64)]) -> BTreeMap<ItemId, f64> {
        entries.iter().map(|&(i, v)| (item(i), v)).collect()
    }

    fn ranked(ids: &[u64]) -> Vec<(ItemId, f64)> {
        ids.iter()
            .enumerate()
            .map(|(i, &id)| (item(id), 1.0 - i as f64 * 0.1))
            .collect()
    }

    fn store(entries: &[(u64, u64, f64)]) -> RatingStore {
        let mut store = RatingStore::new();
        for &(u, i, v) in entries {
            store.add_preference(user(u), item(i), v);
        }
        store
    }

    #[test]
    fn test_ranked_items_ties_break_by_item() {
        let ranked = ranked_items(&prefs(&[(5, 2.0), (3, 2.0), (9, 4.0), (1, f64::NAN)]));
        let order: Vec<u64> = ranked.iter().map(|(i, _)| i.as_u64()).collect();
        assert_eq!(order, vec![9, 3, 5, 1]);
    }

    #[test]
    fn test_ndcg_perfect_ranking() {
        let truth = prefs(&[(1, 5.0), (2, 3.0), (3, 1.0)]);
        let ndcg = ndcg_at_k(&ranked(&[1, 2, 3]), &truth, 3, NdcgGain::Linear);
        assert!((ndcg - 1.0).abs() < 1e-12, "Perfect ranking should have NDCG = 1.0");
    }

    #[test]
    fn test_ndcg_reversed_ranking() {
        let truth = prefs(&[(1, 5.0), (2, 3.0), (3, 1.0)]);
        let ndcg = ndcg_at_k(&ranked(&[3, 2, 1]), &truth, 3, NdcgGain::Linear);

        // DCG = 1/1 + 3/log2(3) + 5/2, IDCG = 5/1 + 3/log2(3) + 1/2
        let dcg = 1.0 + 3.0 / 3f64.log2() + 2.5;
        let idcg = 5.0 + 3.0 / 3f64.log2() + 0.5;
        assert!((ndcg - dcg / idcg).abs() < 1e-12);
        assert!(ndcg < 1.0);
    }

    #[test]
    fn test_ndcg_ideal_uses_all_truth_items() {
        // Only one of two truth items is recommended
        let truth = prefs(&[(1, 2.0), (2, 2.0)]);
        let ndcg = ndcg_at_k(&ranked(&[1, 7]), &truth, 2, NdcgGain::Linear);
        let expected = 2.0 / (2.0 + 2.0 / 3f64.log2());
        assert!((ndcg - expected).abs() < 1e-12);
    }

    #[test]
    fn test_ndcg_no_truth_is_zero() {
        let ndcg = ndcg_at_k(&ranked(&[1, 2, 3]), &BTreeMap::new(), 10, NdcgGain::Linear);
        assert_eq!(ndcg, 0.0);
    }

    #[test]
    fn test_ndcg_ignores_negative_and_nan_truth() {
        let truth = prefs(&[(1, -3.0), (2, f64::NAN), (3, 2.0)]);
        let ndcg = ndcg_at_k(&ranked(&[1, 2, 3]), &truth, 3, NdcgGain::Linear);
        assert!((0.0..=1.0).contains(&ndcg));
        assert!((ndcg - 0.5).abs() < 1e-12, "item 3 at rank 3: 2/log2(4) / 2");
    }

    #[test]
    fn test_ndcg_exponential_gain() {
        let truth = prefs(&[(1, 1.0), (2, 2.0)]);
        let ndcg = ndcg_at_k(&ranked(&[1, 2]), &truth, 2, NdcgGain::Exponential);
        // DCG = 1 + 3/log2(3), IDCG = 3 + 1/log2(3)
        let expected = (1.0 + 3.0 / 3f64.log2()) / (3.0 + 1.0 / 3f64.log2());
        assert!((ndcg - expected).abs() < 1e-12);
    }

    #[test]
    fn test_precision_at_k() {
        let truth = prefs(&[(1, 4.0), (3, 5.0), (4, 1.0)]);
        let list = ranked(&[1, 2, 3, 4, 5]);

        assert!((precision_at_k(&list, &truth, 3.0, 1) - 1.0).abs() < 1e-12);
        assert!((precision_at_k(&list, &truth, 3.0, 2) - 0.5).abs() < 1e-12);
        assert!((precision_at_k(&list, &truth, 3.0, 3) - 2.0 / 3.0).abs() < 1e-12);
        assert!((precision_at_k(&list, &truth, 3.0, 5) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_precision_short_list_divides_by_k() {
        let truth = prefs(&[(1, 5.0)]);
        let p = precision_at_k(&ranked(&[1]), &truth, 3.0, 10);
        assert!((p - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_precision_example_from_docs() {
        // Truth {i1: 5, i2: 3}; predictions {i1: 5.0, i2: 1.0, i3: 4.0}
        let truth = prefs(&[(1, 5.0), (2, 3.0)]);
        let list = ranked_items(&prefs(&[(1, 5.0), (2, 1.0), (3, 4.0)]));

        let order: Vec<u64> = list.iter().map(|(i, _)| i.as_u64()).collect();
        assert_eq!(order, vec![1, 3, 2]);
        assert!((precision_at_k(&list, &truth, 3.0, 2) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_recall_at_k() {
        let truth = prefs(&[(1, 4.0), (3, 4.0), (10, 4.0)]);
        let list = ranked(&[1, 2, 3, 4, 5]);

        assert!((recall_at_k(&list, &truth, 3.0, 1) - 1.0 / 3.0).abs() < 1e-12);
        assert!((recall_at_k(&list, &truth, 3.0, 5) - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(recall_at_k(&list, &prefs(&[(1, 1.0)]), 3.0, 5), 0.0);
    }

    #[test]
    fn test_average_precision_at_k() {
        let truth = prefs(&[(1, 5.0), (3, 5.0)]);
        let list = ranked(&[1, 2, 3, 4, 5]);

        // (P@1 + P@3) / 2 = (1 + 2/3) / 2
        let ap = average_precision_at_k(&list, &truth, 3.0, 5);
        assert!((ap - (1.0 + 2.0 / 3.0) / 2.0).abs() < 1e-12);

        // At k = 1 only one relevant item fits, so the denominator is 1
        assert!((average_precision_at_k(&list, &truth, 3.0, 1) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_metric_accessors_before_compute() {
        let recs = store(&[(1, 1, 1.0)]);
        let truth = store(&[(1, 1, 5.0)]);
        let metric = RankingMetric::ndcg(&recs, &truth, &[5]).unwrap();

        assert_eq!(metric.value_at(5), Err(MetricError::NotComputed("ndcg")));
        assert!(metric.per_user_at(5).is_err());
    }

    #[test]
    fn test_metric_unknown_cutoff() {
        let recs = store(&[(1, 1, 1.0)]);
        let truth = store(&[(1, 1, 5.0)]);
        let mut metric = RankingMetric::precision(&recs, &truth, 3.0, &[5]).unwrap();
        metric.compute();

        assert_eq!(
            metric.value_at(10),
            Err(MetricError::UnknownCutoff {
                metric: "precision",
                cutoff: 10
            })
        );
    }

    #[test]
    fn test_invalid_cutoffs_rejected() {
        let empty = RatingStore::new();
        assert_eq!(
            RankingMetric::ndcg(&empty, &empty, &[]).unwrap_err(),
            ConfigError::NoCutoffs
        );
        assert_eq!(
            RankingMetric::ndcg(&empty, &empty, &[5, 0]).unwrap_err(),
            ConfigError::InvalidCutoff(0)
        );
    }

    #[test]
    fn test_missing_user_counts_as_zero() {
        // User 1 ranked perfectly, user 2 has truth but no recommendations
        let recs = store(&[(1, 1, 0.9), (1, 2, 0.8)]);
        let truth = store(&[(1, 1, 5.0), (1, 2, 4.0), (2, 1, 5.0)]);

        let mut ndcg = RankingMetric::ndcg(&recs, &truth, &[2]).unwrap();
        ndcg.compute();
        assert!((ndcg.value_at(2).unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(ndcg.per_user_at(2).unwrap().get(&user(2)), Some(&0.0));

        let mut precision = RankingMetric::precision(&recs, &truth, 3.0, &[2]).unwrap();
        precision.compute();
        assert!((precision.value_at(2).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_recommendation_only_users_ignored() {
        let recs = store(&[(1, 1, 0.9), (5, 1, 0.9)]);
        let truth = store(&[(1, 1, 5.0)]);
        let mut ndcg = RankingMetric::ndcg(&recs, &truth, &[1]).unwrap();
        ndcg.compute();

        assert!((ndcg.value_at(1).unwrap() - 1.0).abs() < 1e-12);
        assert!(!ndcg.per_user_at(1).unwrap().contains_key(&user(5)));
    }

    #[test]
    fn test_multiple_cutoffs_in_one_pass() {
        let recs = store(&[(1, 1, 0.9), (1, 2, 0.8), (1, 3, 0.7)]);
        let truth = store(&[(1, 1, 5.0), (1, 3, 5.0)]);
        let mut precision = RankingMetric::precision(&recs, &truth, 3.0, &[3, 1, 3]).unwrap();
        precision.compute();

        assert_eq!(precision.cutoffs(), &[1, 3]);
        assert!((precision.value_at(1).unwrap() - 1.0).abs() < 1e-12);
        assert!((precision.value_at(3).unwrap() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_scores_stay_in_unit_interval() {
        let mut recs = RatingStore::new();
        let mut truth = RatingStore::new();
        for u in 0..10u64 {
            for i in 0..15u64 {
                let predicted = ((u * 31 + i * 17) % 11) as f64 / 2.0;
                recs.add_preference(user(u), item(i), predicted);
                if (u + i) % 3 == 0 {
                    truth.add_preference(user(u), item(i), ((u + i) % 5) as f64 + 1.0);
                }
            }
        }

        let cutoffs = [1, 5, 10, 20];
        let kinds = [
            RankingKind::Ndcg(NdcgGain::Linear),
            RankingKind::Ndcg(NdcgGain::Exponential),
            RankingKind::Precision { threshold: 3.0 },
            RankingKind::Recall { threshold: 3.0 },
            RankingKind::AveragePrecision { threshold: 3.0 },
        ];
        for kind in kinds {
            let mut metric = RankingMetric::new(kind, &recs, &truth, &cutoffs).unwrap();
            metric.compute();
            for &k in &cutoffs {
                for score in metric.per_user_at(k).unwrap().values() {
                    assert!((0.0..=1.0 + 1e-12).contains(score), "{kind:?}@{k}: {score}");
                }
            }
        }
    }
}
