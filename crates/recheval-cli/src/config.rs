//! Run configuration and fold file layout for the CLI.
//!
//! A split directory holds `train_<i>.tsv` and `test_<i>.tsv` for folds
//! `0..n`. A recommendations directory holds `recs_<i>.tsv` for the same
//! folds, and `filter` writes `strategy_<i>.tsv` next to them.

use anyhow::{bail, Context, Result};
use recheval_core::EvalConfig;
use std::path::{Path, PathBuf};

/// Training side of a fold.
pub const TRAIN_PREFIX: &str = "train";

/// Test side of a fold.
pub const TEST_PREFIX: &str = "test";

/// Recommender output for a fold.
pub const RECS_PREFIX: &str = "recs";

/// Strategy-filtered recommender output for a fold.
pub const STRATEGY_PREFIX: &str = "strategy";

const FOLD_FILE_EXTENSION: &str = "tsv";

/// Path of the `prefix` file for fold `fold` inside `dir`.
pub fn fold_file(dir: &Path, prefix: &str, fold: usize) -> PathBuf {
    dir.join(format!("{prefix}_{fold}.{FOLD_FILE_EXTENSION}"))
}

/// Counts consecutive training files starting at fold 0.
///
/// # Errors
///
/// Fails when `dir` holds no `train_0.tsv`.
pub fn count_folds(dir: &Path) -> Result<usize> {
    let mut folds = 0;
    while fold_file(dir, TRAIN_PREFIX, folds).is_file() {
        folds += 1;
    }
    if folds == 0 {
        bail!(
            "No fold files found in {} (expected {})",
            dir.display(),
            fold_file(dir, TRAIN_PREFIX, 0).display()
        );
    }
    Ok(folds)
}

/// Loads an [`EvalConfig`] from a JSON file, or the defaults without one.
///
/// Missing fields in the file fall back to their defaults.
pub fn load_config(path: Option<&Path>) -> Result<EvalConfig> {
    let Some(path) = path else {
        return Ok(EvalConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse config {}", path.display()))
}

/// Overrides the splitting section of `config` with the `split` flags.
pub fn apply_split_flags(
    config: &mut EvalConfig,
    folds: Option<usize>,
    seed: Option<u64>,
    global: bool,
) {
    if let Some(folds) = folds {
        config.folds = folds;
    }
    if let Some(seed) = seed {
        config.seed = seed;
    }
    if global {
        config.per_user = false;
    }
}

/// Strategy flags shared by `filter` and `evaluate`.
#[derive(Debug, Default, Clone, clap::Args)]
pub struct StrategyArgs {
    /// Candidate strategy (user-test, relevant-test, test-items, rel-plus-n)
    #[arg(long)]
    pub strategy: Option<String>,

    /// Relevance threshold used by the strategy
    #[arg(long)]
    pub strategy_threshold: Option<f64>,

    /// Unseen items sampled per user (rel-plus-n)
    #[arg(long)]
    pub sample_size: Option<usize>,
}

impl StrategyArgs {
    /// Overrides the strategy section of `config` with any flags given.
    pub fn apply(&self, config: &mut EvalConfig) {
        if let Some(name) = &self.strategy {
            config.strategy.name = name.clone();
        }
        if let Some(threshold) = self.strategy_threshold {
            config.strategy.threshold = threshold;
        }
        if self.sample_size.is_some() {
            config.strategy.sample_size = self.sample_size;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_fold_file_naming() {
        let path = fold_file(Path::new("/data/splits"), TRAIN_PREFIX, 3);
        assert_eq!(path, PathBuf::from("/data/splits/train_3.tsv"));
    }

    #[test]
    fn test_count_folds_stops_at_gap() {
        let dir = tempdir().unwrap();
        for fold in [0, 1, 3] {
            std::fs::write(fold_file(dir.path(), TRAIN_PREFIX, fold), "").unwrap();
        }
        assert_eq!(count_folds(dir.path()).unwrap(), 2);
    }

    #[test]
    fn test_count_folds_empty_dir() {
        let dir = tempdir().unwrap();
        assert!(count_folds(dir.path()).is_err());
    }

    #[test]
    fn test_load_config_defaults_without_file() {
        assert_eq!(load_config(None).unwrap(), EvalConfig::default());
    }

    #[test]
    fn test_load_config_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"folds": 3, "cutoffs": [1, 20]}}"#).unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.folds, 3);
        assert_eq!(config.cutoffs, vec![1, 20]);
        assert_eq!(config.strategy, EvalConfig::default().strategy);
    }

    #[test]
    fn test_load_config_rejects_bad_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "folds = 3").unwrap();
        assert!(load_config(Some(file.path())).is_err());
    }

    #[test]
    fn test_split_flags_override_config() {
        let mut config = EvalConfig::default();
        apply_split_flags(&mut config, None, None, false);
        assert_eq!(config, EvalConfig::default());

        apply_split_flags(&mut config, Some(3), Some(7), true);
        assert_eq!(config.folds, 3);
        assert_eq!(config.seed, 7);
        assert!(!config.per_user);
    }

    #[test]
    fn test_strategy_args_override_only_given_flags() {
        let mut config = EvalConfig::default();
        let args = StrategyArgs {
            strategy: Some("rel-plus-n".to_string()),
            strategy_threshold: None,
            sample_size: Some(50),
        };
        args.apply(&mut config);

        assert_eq!(config.strategy.name, "rel-plus-n");
        assert_eq!(config.strategy.sample_size, Some(50));
        assert_eq!(
            config.strategy.threshold,
            EvalConfig::default().strategy.threshold
        );
    }
}
