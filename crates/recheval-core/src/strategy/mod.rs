//! Candidate-item strategies.
//!
//! A strategy decides, per user, which items may be scored. Recommended
//! items outside the candidate set are dropped before metrics run; candidates
//! the recommender did not return simply count as not recommended.
//!
//! | Name | Candidates for a user |
//! |------|------------------------|
//! | `user-test` | every item the user rated in test |
//! | `relevant-test` | test items rated at or above the threshold |
//! | `test-items` | test item universe minus the user's training items |
//! | `rel-plus-n` | relevant test items plus `n` sampled unseen items |
//!
//! Strategies are resolved once from a [`StrategyConfig`], then bound to a
//! fold with [`CandidateStrategy::bind`].

mod candidates;

pub use candidates::FoldStrategy;

use crate::config::{DEFAULT_SEED, DEFAULT_STRATEGY, DEFAULT_STRATEGY_THRESHOLD};
use crate::error::ConfigError;
use crate::model::RatingStore;
use serde::{Deserialize, Serialize};

/// Names accepted by [`CandidateStrategy::from_config`].
pub const STRATEGY_NAMES: &[&str] = &["user-test", "relevant-test", "test-items", "rel-plus-n"];

/// Strategy selection as it appears in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// One of [`STRATEGY_NAMES`]
    pub name: String,
    /// Minimum test value for an item to count as relevant
    pub threshold: f64,
    /// Unseen items drawn per user (`rel-plus-n` only)
    pub sample_size: Option<usize>,
    /// Seed for sampling strategies
    pub seed: u64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_STRATEGY.to_string(),
            threshold: DEFAULT_STRATEGY_THRESHOLD,
            sample_size: None,
            seed: DEFAULT_SEED,
        }
    }
}

/// How many unseen items the training-complement variant keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnseenItems {
    /// The whole complement
    All,
    /// A seeded sample without replacement
    Sample { size: usize, seed: u64 },
}

/// Which items a user is evaluated on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrategyKind {
    /// Every item the user rated in test
    AllTestItems,
    /// Test items with value ≥ threshold
    RelevantTestItems,
    /// Items the user did not rate in training, within the test item universe
    TrainingComplement {
        unseen: UnseenItems,
        include_relevant: bool,
    },
}

/// A resolved candidate strategy with its relevance threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateStrategy {
    kind: StrategyKind,
    threshold: f64,
}

impl CandidateStrategy {
    pub fn new(kind: StrategyKind, threshold: f64) -> Self {
        Self { kind, threshold }
    }

    /// Resolves a strategy by name.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::UnknownStrategy`] for names outside [`STRATEGY_NAMES`]
    /// - [`ConfigError::MissingSampleSize`] for `rel-plus-n` without a positive size
    /// - [`ConfigError::InvalidThreshold`] for a NaN threshold
    pub fn from_config(config: &StrategyConfig) -> Result<Self, ConfigError> {
        if config.threshold.is_nan() {
            return Err(ConfigError::InvalidThreshold(config.threshold));
        }

        let kind = match config.name.as_str() {
            "user-test" => StrategyKind::AllTestItems,
            "relevant-test" => StrategyKind::RelevantTestItems,
            "test-items" => StrategyKind::TrainingComplement {
                unseen: UnseenItems::All,
                include_relevant: false,
            },
            "rel-plus-n" => match config.sample_size {
                Some(size) if size > 0 => StrategyKind::TrainingComplement {
                    unseen: UnseenItems::Sample {
                        size,
                        seed: config.seed,
                    },
                    include_relevant: true,
                },
                _ => return Err(ConfigError::MissingSampleSize(config.name.clone())),
            },
            other => return Err(ConfigError::UnknownStrategy(other.to_string())),
        };

        Ok(Self::new(kind, config.threshold))
    }

    pub fn kind(&self) -> StrategyKind {
        self.kind
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Binds the strategy to one fold's training and test stores.
    pub fn bind<'a>(&self, training: &'a RatingStore, test: &'a RatingStore) -> FoldStrategy<'a> {
        FoldStrategy::new(*self, training, test)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(name: &str) -> StrategyConfig {
        StrategyConfig {
            name: name.to_string(),
            ..StrategyConfig::default()
        }
    }

    #[test]
    fn test_known_names_resolve() {
        assert_eq!(
            CandidateStrategy::from_config(&config("user-test")).unwrap().kind(),
            StrategyKind::AllTestItems
        );
        assert_eq!(
            CandidateStrategy::from_config(&config("relevant-test")).unwrap().kind(),
            StrategyKind::RelevantTestItems
        );
        assert_eq!(
            CandidateStrategy::from_config(&config("test-items")).unwrap().kind(),
            StrategyKind::TrainingComplement {
                unseen: UnseenItems::All,
                include_relevant: false
            }
        );
    }

    #[test]
    fn test_rel_plus_n_needs_sample_size() {
        let err = CandidateStrategy::from_config(&config("rel-plus-n")).unwrap_err();
        assert_eq!(err, ConfigError::MissingSampleSize("rel-plus-n".to_string()));

        let zero = StrategyConfig {
            sample_size: Some(0),
            ..config("rel-plus-n")
        };
        assert!(CandidateStrategy::from_config(&zero).is_err());

        let ok = StrategyConfig {
            sample_size: Some(100),
            seed: 9,
            ..config("rel-plus-n")
        };
        assert_eq!(
            CandidateStrategy::from_config(&ok).unwrap().kind(),
            StrategyKind::TrainingComplement {
                unseen: UnseenItems::Sample { size: 100, seed: 9 },
                include_relevant: true
            }
        );
    }

    #[test]
    fn test_unknown_name_rejected() {
        let err = CandidateStrategy::from_config(&config("UserTest")).unwrap_err();
        assert_eq!(err, ConfigError::UnknownStrategy("UserTest".to_string()));
    }

    #[test]
    fn test_nan_threshold_rejected() {
        let cfg = StrategyConfig {
            threshold: f64::NAN,
            ..config("user-test")
        };
        assert!(matches!(
            CandidateStrategy::from_config(&cfg),
            Err(ConfigError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let cfg: StrategyConfig =
            serde_json::from_str(r#"{"name": "relevant-test", "threshold": 4.0}"#).unwrap();
        assert_eq!(cfg.name, "relevant-test");
        assert_eq!(cfg.threshold, 4.0);
        assert_eq!(cfg.sample_size, None);
        assert_eq!(cfg.seed, DEFAULT_SEED);
    }
}
