//! Subcommand execution.
//!
//! Each command works fold by fold on files laid out as described in
//! [`crate::config`]. Core errors are wrapped with the path or fold they
//! concern.

use crate::config::{
    fold_file, RECS_PREFIX, STRATEGY_PREFIX, TEST_PREFIX, TRAIN_PREFIX,
};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use recheval_core::io::{load_ratings, save_ratings, ParsePolicy};
use recheval_core::split::{CrossValidationSplitter, Splitter};
use recheval_core::strategy::CandidateStrategy;
use recheval_core::{EvalConfig, EvaluationReport, Evaluator, RatingStore};
use std::path::Path;
use tracing::info;

/// Splits one ratings file into `train_<i>.tsv` / `test_<i>.tsv` pairs.
///
/// Returns the number of folds written.
pub fn split(
    input: &Path,
    output_dir: &Path,
    config: &EvalConfig,
    policy: ParsePolicy,
) -> Result<usize> {
    let data = load(input, policy)?;
    let splitter = CrossValidationSplitter::new(config.folds, config.per_user, config.seed)?;

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let folds = splitter.split(&data);
    for (index, fold) in folds.iter().enumerate() {
        save(&fold.training, &fold_file(output_dir, TRAIN_PREFIX, index))?;
        save(&fold.test, &fold_file(output_dir, TEST_PREFIX, index))?;
        info!(
            fold = index,
            training = fold.training.num_preferences(),
            test = fold.test.num_preferences(),
            "Wrote fold"
        );
    }
    Ok(folds.len())
}

/// Applies the configured candidate strategy to every fold's
/// `recs_<i>.tsv`, writing `strategy_<i>.tsv` to `output_dir`.
pub fn filter(
    splits: &Path,
    recommendations: &Path,
    output_dir: &Path,
    folds: usize,
    config: &EvalConfig,
) -> Result<()> {
    let strategy = CandidateStrategy::from_config(&config.strategy)?;

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    for index in 0..folds {
        let training = load(&fold_file(splits, TRAIN_PREFIX, index), ParsePolicy::Abort)?;
        let test = load(&fold_file(splits, TEST_PREFIX, index), ParsePolicy::Abort)?;
        let recs = load(
            &fold_file(recommendations, RECS_PREFIX, index),
            ParsePolicy::Abort,
        )?;

        let filtered = strategy.bind(&training, &test).filter(&recs);
        info!(
            fold = index,
            recommended = recs.num_preferences(),
            kept = filtered.num_preferences(),
            "Filtered recommendations"
        );
        save(&filtered, &fold_file(output_dir, STRATEGY_PREFIX, index))?;
    }
    Ok(())
}

/// Scores every fold's `recs_<i>.tsv` against its test file.
pub fn evaluate(
    evaluator: &Evaluator,
    splits: &Path,
    recommendations: &Path,
    folds: usize,
    show_progress: bool,
) -> Result<EvaluationReport> {

    let pb = if show_progress {
        let pb = ProgressBar::new(folds as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.set_message("Folds");
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut reports = Vec::with_capacity(folds);
    for index in 0..folds {
        let training = load(&fold_file(splits, TRAIN_PREFIX, index), ParsePolicy::Abort)?;
        let test = load(&fold_file(splits, TEST_PREFIX, index), ParsePolicy::Abort)?;
        let recs = load(
            &fold_file(recommendations, RECS_PREFIX, index),
            ParsePolicy::Abort,
        )?;

        reports.push(evaluator.evaluate_fold(index, &training, &test, &recs)?);
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(EvaluationReport::from_folds(reports))
}

fn load(path: &Path, policy: ParsePolicy) -> Result<RatingStore> {
    let (store, summary) = load_ratings(path, policy)
        .with_context(|| format!("Failed to load ratings from {}", path.display()))?;
    if summary.skipped > 0 {
        info!(
            path = %path.display(),
            skipped = summary.skipped,
            "Skipped malformed lines"
        );
    }
    Ok(store)
}

fn save(store: &RatingStore, path: &Path) -> Result<()> {
    save_ratings(store, path).with_context(|| format!("Failed to write {}", path.display()))
}
