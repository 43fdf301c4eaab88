//! Evaluation defaults and the run configuration.
//!
//! Defaults follow the usual MovieLens cross-validation protocol: five
//! per-user folds, NDCG and precision at 5 and 10, ratings of 3 or more
//! counted as relevant.
//!
//! # Usage
//!
//! ```
//! use recheval_core::config::EvalConfig;
//!
//! let config = EvalConfig {
//!     folds: 10,
//!     ..EvalConfig::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use crate::error::ConfigError;
use crate::metrics::{validate_cutoffs, NdcgGain};
use crate::strategy::{CandidateStrategy, StrategyConfig};
use serde::{Deserialize, Serialize};

// =============================================================================
// Splitting
// =============================================================================

/// Number of cross-validation folds.
pub const DEFAULT_FOLDS: usize = 5;

/// Seed shared by splitting and sampling unless overridden.
pub const DEFAULT_SEED: u64 = 2048;

// =============================================================================
// Candidate strategy
// =============================================================================

/// Strategy used when none is configured: every test item of the user.
pub const DEFAULT_STRATEGY: &str = "user-test";

/// Relevance threshold handed to the candidate strategy.
pub const DEFAULT_STRATEGY_THRESHOLD: f64 = 2.0;

// =============================================================================
// Metrics
// =============================================================================

/// Ranking cutoffs reported by default.
pub const DEFAULT_CUTOFFS: &[usize] = &[5, 10];

/// Minimum truth rating for an item to count as relevant in precision,
/// recall and MAP.
pub const DEFAULT_RELEVANCE_THRESHOLD: f64 = 3.0;

/// Everything one evaluation run needs.
///
/// Built once, validated once, then passed by reference to each stage.
/// Nothing reads configuration from globals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Cross-validation folds
    pub folds: usize,
    /// Split each user's ratings separately (otherwise split globally)
    pub per_user: bool,
    /// Split seed
    pub seed: u64,
    /// Candidate strategy
    pub strategy: StrategyConfig,
    /// Ranking cutoffs
    pub cutoffs: Vec<usize>,
    /// Relevance threshold for precision, recall and MAP
    pub relevance_threshold: f64,
    /// DCG gain function
    pub ndcg_gain: NdcgGain,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            folds: DEFAULT_FOLDS,
            per_user: true,
            seed: DEFAULT_SEED,
            strategy: StrategyConfig::default(),
            cutoffs: DEFAULT_CUTOFFS.to_vec(),
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
            ndcg_gain: NdcgGain::default(),
        }
    }
}

impl EvalConfig {
    /// Runs every configuration check.
    ///
    /// # Errors
    ///
    /// The first [`ConfigError`] found: fold count, cutoffs, relevance
    /// threshold, then strategy resolution.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.folds == 0 {
            return Err(ConfigError::InvalidFoldCount(self.folds));
        }
        validate_cutoffs(&self.cutoffs)?;
        if self.relevance_threshold.is_nan() {
            return Err(ConfigError::InvalidThreshold(self.relevance_threshold));
        }
        CandidateStrategy::from_config(&self.strategy)?;
        Ok(())
    }
}
