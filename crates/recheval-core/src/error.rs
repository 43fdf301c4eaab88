//! Error types for recheval-core.
//!
//! Each concern gets its own enum: parsing rating files, validating
//! configuration, reading metric results, and running the injected
//! recommender. [`EvalError`] wraps them with fold context for the pipeline.

use thiserror::Error;

/// Errors raised while reading ratings or recommendation files.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A record could not be parsed
    #[error("Line {line}: {reason} ('{content}')")]
    Malformed {
        /// 1-based line number within the input
        line: usize,
        /// The offending line, verbatim
        content: String,
        /// What was wrong with it
        reason: String,
    },
    /// Underlying reader or file failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    pub(crate) fn malformed(line: usize, content: &str, reason: impl Into<String>) -> Self {
        ParseError::Malformed {
            line,
            content: content.to_string(),
            reason: reason.into(),
        }
    }
}

/// Invalid evaluation setup. Always raised before any fold is processed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Fold count must be at least 1
    #[error("Invalid fold count: {0} (must be at least 1)")]
    InvalidFoldCount(usize),
    /// Ranking cutoffs must be at least 1
    #[error("Invalid cutoff: {0} (must be at least 1)")]
    InvalidCutoff(usize),
    /// No cutoffs were configured for ranking metrics
    #[error("No cutoffs configured")]
    NoCutoffs,
    /// Holdout fraction outside (0, 1)
    #[error("Invalid test fraction: {0} (must be in (0, 1))")]
    InvalidTestFraction(f64),
    /// Threshold is NaN
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(f64),
    /// Strategy name does not match any known variant
    #[error("Unknown candidate strategy '{0}' (expected one of: {known})", known = crate::strategy::STRATEGY_NAMES.join(", "))]
    UnknownStrategy(String),
    /// Sampling strategy configured without a positive sample size
    #[error("Strategy '{0}' requires a positive sample size")]
    MissingSampleSize(String),
}

/// Errors returned by metric accessors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricError {
    /// An accessor was called before `compute()`
    #[error("Metric '{0}' has not been computed")]
    NotComputed(&'static str),
    /// The requested cutoff was not configured for this metric
    #[error("Cutoff {cutoff} was not configured for metric '{metric}'")]
    UnknownCutoff {
        /// Metric name
        metric: &'static str,
        /// Requested cutoff
        cutoff: usize,
    },
    /// The metric has no defined value for this input
    #[error("Metric '{metric}' is undefined: {reason}")]
    Undefined {
        /// Metric name
        metric: &'static str,
        /// Why no value exists
        reason: &'static str,
    },
}

/// Failure reported by an injected recommender.
#[derive(Debug, Clone, Error)]
#[error("Recommender failed: {0}")]
pub struct RecommenderError(pub String);

impl From<String> for RecommenderError {
    fn from(s: String) -> Self {
        RecommenderError(s)
    }
}

impl From<&str> for RecommenderError {
    fn from(s: &str) -> Self {
        RecommenderError(s.to_string())
    }
}

/// Errors from the evaluation pipeline.
#[derive(Debug, Error)]
pub enum EvalError {
    /// Configuration rejected at setup
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The recommender failed on a fold
    #[error("Fold {fold}: {source}")]
    Recommender {
        /// Fold index
        fold: usize,
        /// Underlying failure
        #[source]
        source: RecommenderError,
    },
    /// A metric could not be read on a fold
    #[error("Fold {fold}: {source}")]
    Metric {
        /// Fold index
        fold: usize,
        /// Underlying failure
        #[source]
        source: MetricError,
    },
    /// A fold worker thread panicked
    #[error("Fold {0} worker panicked")]
    WorkerPanicked(usize),
}
