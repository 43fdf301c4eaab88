//! Rating-error metrics: RMSE and MAE.

use super::Metric;
use crate::error::MetricError;
use crate::model::{RatingStore, UserId};
use std::collections::BTreeMap;

/// Which error a [`ErrorMetric`] computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// `sqrt(mean((predicted - observed)²))`
    Rmse,
    /// `mean(|predicted - observed|)`
    Mae,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Rmse => "rmse",
            ErrorKind::Mae => "mae",
        }
    }

    fn term(&self, diff: f64) -> f64 {
        match self {
            ErrorKind::Rmse => diff * diff,
            ErrorKind::Mae => diff.abs(),
        }
    }

    fn finish(&self, mean: f64) -> f64 {
        match self {
            ErrorKind::Rmse => mean.sqrt(),
            ErrorKind::Mae => mean,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct ErrorResults {
    value: Option<f64>,
    per_user: BTreeMap<UserId, f64>,
    pairs: usize,
}

/// Error between predicted and observed values.
///
/// Only (user, item) pairs present in both stores count. When there are
/// none the metric is undefined and [`ErrorMetric::value`] returns
/// [`MetricError::Undefined`] instead of a made-up number. Per-user values
/// exist only for users with at least one such pair.
#[derive(Debug, Clone)]
pub struct ErrorMetric<'a> {
    kind: ErrorKind,
    recommended: &'a RatingStore,
    truth: &'a RatingStore,
    results: Option<ErrorResults>,
}

impl<'a> ErrorMetric<'a> {
    pub fn new(kind: ErrorKind, recommended: &'a RatingStore, truth: &'a RatingStore) -> Self {
        Self {
            kind,
            recommended,
            truth,
            results: None,
        }
    }

    pub fn rmse(recommended: &'a RatingStore, truth: &'a RatingStore) -> Self {
        Self::new(ErrorKind::Rmse, recommended, truth)
    }

    pub fn mae(recommended: &'a RatingStore, truth: &'a RatingStore) -> Self {
        Self::new(ErrorKind::Mae, recommended, truth)
    }

    /// The error over all intersecting pairs.
    pub fn value(&self) -> Result<f64, MetricError> {
        self.results()?.value.ok_or(MetricError::Undefined {
            metric: self.name(),
            reason: "no (user, item) pair present in both stores",
        })
    }

    /// Per-user error, for users with at least one intersecting pair.
    pub fn per_user(&self) -> Result<&BTreeMap<UserId, f64>, MetricError> {
        Ok(&self.results()?.per_user)
    }

    /// Number of pairs the error was computed over.
    pub fn pair_count(&self) -> Result<usize, MetricError> {
        Ok(self.results()?.pairs)
    }

    fn results(&self) -> Result<&ErrorResults, MetricError> {
        self.results
            .as_ref()
            .ok_or(MetricError::NotComputed(self.name()))
    }
}

impl Metric for ErrorMetric<'_> {
    fn name(&self) -> &'static str {
        self.kind.name()
    }

    fn compute(&mut self) {
        let mut results = ErrorResults::default();
        let mut total = 0.0;

        for (user, predicted) in self.recommended.iter_users() {
            let Some(observed) = self.truth.user_preferences(user) else {
                continue;
            };

            let mut user_total = 0.0;
            let mut user_pairs = 0usize;
            for (item, prediction) in predicted {
                if let Some(actual) = observed.get(item) {
                    user_total += self.kind.term(prediction - actual);
                    user_pairs += 1;
                }
            }

            if user_pairs > 0 {
                results
                    .per_user
                    .insert(user, self.kind.finish(user_total / user_pairs as f64));
                total += user_total;
                results.pairs += user_pairs;
            }
        }

        if results.pairs > 0 {
            results.value = Some(self.kind.finish(total / results.pairs as f64));
        }
        self.results = Some(results);
    }

    fn is_computed(&self) -> bool {
        self.results.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemId;

    fn store(entries: &[(u64, u64, f64)]) -> RatingStore {
        let mut store = RatingStore::new();
        for &(u, i, v) in entries {
            store.add_preference(UserId::from_u64(u), ItemId::from_u64(i), v);
        }
        store
    }

    #[test]
    fn test_rmse_zero_for_exact_predictions() {
        let truth = store(&[(1, 1, 4.0), (1, 2, 2.0), (2, 1, 5.0)]);
        let mut rmse = ErrorMetric::rmse(&truth, &truth);
        rmse.compute();
        assert_eq!(rmse.value(), Ok(0.0));
    }

    #[test]
    fn test_rmse_intersection_only() {
        let recs = store(&[(1, 1, 3.0), (1, 2, 4.0), (1, 9, 1.0), (7, 1, 2.0)]);
        let truth = store(&[(1, 1, 5.0), (1, 2, 4.0), (2, 3, 1.0)]);
        let mut rmse = ErrorMetric::rmse(&recs, &truth);
        rmse.compute();

        // Pairs (1,1) and (1,2): errors 2 and 0
        assert!((rmse.value().unwrap() - 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(rmse.pair_count(), Ok(2));
        assert_eq!(rmse.per_user().unwrap().len(), 1);
    }

    #[test]
    fn test_rmse_grows_with_uniform_noise() {
        let truth = store(&[(1, 1, 4.0), (1, 2, 2.0), (2, 3, 3.5), (3, 4, 1.0)]);
        let mut previous = 0.0;
        for step in 1..=5 {
            let offset = step as f64 * 0.25;
            let noisy: RatingStore = truth
                .iter()
                .map(|mut r| {
                    r.value += offset;
                    r
                })
                .collect();
            let mut rmse = ErrorMetric::rmse(&noisy, &truth);
            rmse.compute();
            let value = rmse.value().unwrap();
            assert!(value > previous);
            assert!((value - offset).abs() < 1e-12);
            previous = value;
        }
    }

    #[test]
    fn test_empty_intersection_is_undefined() {
        let recs = store(&[(1, 1, 3.0)]);
        let truth = store(&[(1, 2, 3.0)]);
        let mut rmse = ErrorMetric::rmse(&recs, &truth);
        rmse.compute();

        assert!(matches!(
            rmse.value(),
            Err(MetricError::Undefined { metric: "rmse", .. })
        ));
        assert_eq!(rmse.pair_count(), Ok(0));
    }

    #[test]
    fn test_value_before_compute() {
        let empty = RatingStore::new();
        let mae = ErrorMetric::mae(&empty, &empty);
        assert_eq!(mae.value(), Err(MetricError::NotComputed("mae")));
    }

    #[test]
    fn test_mae() {
        let recs = store(&[(1, 1, 3.0), (1, 2, 5.0), (2, 1, 1.0)]);
        let truth = store(&[(1, 1, 4.0), (1, 2, 2.0), (2, 1, 1.0)]);
        let mut mae = ErrorMetric::mae(&recs, &truth);
        mae.compute();

        assert!((mae.value().unwrap() - 4.0 / 3.0).abs() < 1e-12);
        assert_eq!(
            mae.per_user().unwrap().get(&UserId::from_u64(2)),
            Some(&0.0)
        );
    }
}
