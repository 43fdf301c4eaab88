//! Per-fold and aggregated results.

use serde::Serialize;
use std::collections::BTreeMap;

/// Metric values for one fold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoldReport {
    /// Fold index
    pub fold: usize,
    /// Users in the test store (the averaging population)
    pub users: usize,
    /// Recommended pairs left after candidate filtering
    pub recommended_pairs: usize,
    pub ndcg: BTreeMap<usize, f64>,
    pub precision: BTreeMap<usize, f64>,
    pub recall: BTreeMap<usize, f64>,
    pub map: BTreeMap<usize, f64>,
    /// `None` when no filtered prediction has a test rating
    pub rmse: Option<f64>,
    pub mae: Option<f64>,
}

/// Fold-averaged metric values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeanReport {
    pub ndcg: BTreeMap<usize, f64>,
    pub precision: BTreeMap<usize, f64>,
    pub recall: BTreeMap<usize, f64>,
    pub map: BTreeMap<usize, f64>,
    /// Mean over folds where RMSE was defined; `None` if it never was
    pub rmse: Option<f64>,
    pub mae: Option<f64>,
}

/// Results of a full run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub folds: Vec<FoldReport>,
    pub mean: MeanReport,
}

impl EvaluationReport {
    /// Aggregates fold reports. Ranking metrics average over all folds,
    /// error metrics over the folds where they were defined.
    pub fn from_folds(folds: Vec<FoldReport>) -> Self {
        let mean = MeanReport {
            ndcg: mean_by_cutoff(folds.iter().map(|f| &f.ndcg)),
            precision: mean_by_cutoff(folds.iter().map(|f| &f.precision)),
            recall: mean_by_cutoff(folds.iter().map(|f| &f.recall)),
            map: mean_by_cutoff(folds.iter().map(|f| &f.map)),
            rmse: mean_defined(folds.iter().map(|f| f.rmse)),
            mae: mean_defined(folds.iter().map(|f| f.mae)),
        };
        Self { folds, mean }
    }
}

fn mean_by_cutoff<'a>(
    maps: impl Iterator<Item = &'a BTreeMap<usize, f64>>,
) -> BTreeMap<usize, f64> {
    let mut sums: BTreeMap<usize, (f64, usize)> = BTreeMap::new();
    for map in maps {
        for (k, v) in map {
            let entry = sums.entry(*k).or_insert((0.0, 0));
            entry.0 += v;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(k, (sum, n))| (k, sum / n as f64))
        .collect()
}

fn mean_defined(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let defined: Vec<f64> = values.flatten().collect();
    if defined.is_empty() {
        None
    } else {
        Some(defined.iter().sum::<f64>() / defined.len() as f64)
    }
}
