//! Fold evaluation and cross-validation driver.

use super::report::{EvaluationReport, FoldReport};
use crate::config::EvalConfig;
use crate::error::{ConfigError, EvalError, MetricError, RecommenderError};
use crate::metrics::{ErrorMetric, Metric, RankingKind, RankingMetric};
use crate::model::RatingStore;
use crate::split::{CrossValidationSplitter, Fold, Splitter};
use crate::strategy::CandidateStrategy;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

/// The injected recommender capability.
///
/// Given a training store, returns predicted scores per user. Higher scores
/// rank first. Implementations are free to score any items; the candidate
/// strategy decides which ones are evaluated.
pub trait Recommender {
    fn recommend(&self, training: &RatingStore) -> Result<RatingStore, RecommenderError>;
}

impl<F> Recommender for F
where
    F: Fn(&RatingStore) -> Result<RatingStore, RecommenderError>,
{
    fn recommend(&self, training: &RatingStore) -> Result<RatingStore, RecommenderError> {
        self(training)
    }
}

/// Runs evaluations for one validated [`EvalConfig`].
///
/// Construction resolves the candidate strategy and the splitter, so every
/// configuration error surfaces before any fold is processed.
#[derive(Debug, Clone)]
pub struct Evaluator {
    config: EvalConfig,
    strategy: CandidateStrategy,
    splitter: CrossValidationSplitter,
}

impl Evaluator {
    /// Validates `config` and sorts and deduplicates its cutoffs, so
    /// [`config`](Self::config) matches the keys of every report.
    pub fn new(mut config: EvalConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        config.cutoffs.sort_unstable();
        config.cutoffs.dedup();
        let strategy = CandidateStrategy::from_config(&config.strategy)?;
        let splitter = CrossValidationSplitter::new(config.folds, config.per_user, config.seed)?;
        Ok(Self {
            config,
            strategy,
            splitter,
        })
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn strategy(&self) -> &CandidateStrategy {
        &self.strategy
    }

    /// Splits `data` with the configured cross-validation settings.
    pub fn split(&self, data: &RatingStore) -> Vec<Fold> {
        self.splitter.split(data)
    }

    /// Filters `recommended` through the candidate strategy and scores it
    /// against `test`.
    #[instrument(skip_all, fields(fold = fold))]
    pub fn evaluate_fold(
        &self,
        fold: usize,
        training: &RatingStore,
        test: &RatingStore,
        recommended: &RatingStore,
    ) -> Result<FoldReport, EvalError> {
        let filtered = self.strategy.bind(training, test).filter(recommended);
        debug!(
            test_users = test.num_users(),
            recommended = recommended.num_preferences(),
            kept = filtered.num_preferences(),
            "Applied candidate strategy"
        );

        let threshold = self.config.relevance_threshold;
        let ndcg = self.ranking(fold, RankingKind::Ndcg(self.config.ndcg_gain), &filtered, test)?;
        let precision = self.ranking(fold, RankingKind::Precision { threshold }, &filtered, test)?;
        let recall = self.ranking(fold, RankingKind::Recall { threshold }, &filtered, test)?;
        let map = self.ranking(fold, RankingKind::AveragePrecision { threshold }, &filtered, test)?;

        let mut rmse = ErrorMetric::rmse(&filtered, test);
        rmse.compute();
        let mut mae = ErrorMetric::mae(&filtered, test);
        mae.compute();

        let report = FoldReport {
            fold,
            users: test.num_users(),
            recommended_pairs: filtered.num_preferences(),
            ndcg,
            precision,
            recall,
            map,
            rmse: defined(fold, rmse.value())?,
            mae: defined(fold, mae.value())?,
        };

        info!(users = report.users, rmse = ?report.rmse, "Evaluated fold");
        Ok(report)
    }

    fn ranking(
        &self,
        fold: usize,
        kind: RankingKind,
        recommended: &RatingStore,
        truth: &RatingStore,
    ) -> Result<BTreeMap<usize, f64>, EvalError> {
        let mut metric = RankingMetric::new(kind, recommended, truth, &self.config.cutoffs)?;
        metric.compute();
        let values = metric
            .values()
            .map_err(|source| EvalError::Metric { fold, source })?;
        Ok(values.clone())
    }

    /// Splits `data`, asks `recommender` for predictions on every training
    /// side and evaluates each fold in order.
    pub fn cross_validate<R>(
        &self,
        data: &RatingStore,
        recommender: &R,
    ) -> Result<EvaluationReport, EvalError>
    where
        R: Recommender + ?Sized,
    {
        let folds = self.split(data);
        info!(
            folds = folds.len(),
            users = data.num_users(),
            ratings = data.num_preferences(),
            "Starting cross-validation"
        );

        let reports = folds
            .iter()
            .enumerate()
            .map(|(index, fold)| self.run_fold(index, fold, recommender))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EvaluationReport::from_folds(reports))
    }

    /// Same as [`cross_validate`](Self::cross_validate), one scoped thread
    /// per fold.
    ///
    /// Folds share no mutable state; the only synchronisation is joining
    /// the threads before averaging. Results keep fold order.
    pub fn cross_validate_parallel<R>(
        &self,
        data: &RatingStore,
        recommender: &R,
    ) -> Result<EvaluationReport, EvalError>
    where
        R: Recommender + Sync + ?Sized,
    {
        let folds = self.split(data);
        info!(folds = folds.len(), "Starting parallel cross-validation");

        let reports = std::thread::scope(|scope| {
            let handles: Vec<_> = folds
                .iter()
                .enumerate()
                .map(|(index, fold)| scope.spawn(move || self.run_fold(index, fold, recommender)))
                .collect();

            handles
                .into_iter()
                .enumerate()
                .map(|(index, handle)| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(EvalError::WorkerPanicked(index)))
                })
                .collect::<Result<Vec<_>, _>>()
        })?;

        Ok(EvaluationReport::from_folds(reports))
    }

    fn run_fold<R>(&self, index: usize, fold: &Fold, recommender: &R) -> Result<FoldReport, EvalError>
    where
        R: Recommender + ?Sized,
    {
        let recommended = recommender
            .recommend(&fold.training)
            .map_err(|source| EvalError::Recommender {
                fold: index,
                source,
            })?;
        self.evaluate_fold(index, &fold.training, &fold.test, &recommended)
    }
}

/// Maps an undefined error metric to `None`; other failures keep fold context.
fn defined(fold: usize, value: Result<f64, MetricError>) -> Result<Option<f64>, EvalError> {
    match value {
        Ok(v) => Ok(Some(v)),
        Err(MetricError::Undefined { metric, reason }) => {
            warn!("Fold {}: {} undefined ({})", fold, metric, reason);
            Ok(None)
        }
        Err(source) => Err(EvalError::Metric { fold, source }),
    }
}
