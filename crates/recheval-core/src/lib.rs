//! # Recheval Core
//!
//! Offline evaluation engine for recommender algorithms.
//!
//! This crate splits rating data into reproducible train/test folds, narrows a
//! recommender's output to an evaluation-appropriate candidate set, and scores
//! it with ranking and error metrics against the held-out ratings. The
//! recommender itself is injected through [`evaluation::Recommender`].
//!
//! ## Modules
//!
//! - [`model`] - In-memory ratings store and identifier types
//! - [`split`] - Cross-validation and holdout splitters
//! - [`strategy`] - Candidate-item strategies selected by name
//! - [`metrics`] - NDCG, Precision, Recall, MAP, RMSE, MAE
//! - [`evaluation`] - Fold evaluation and cross-validation pipeline
//! - [`io`] - Rating file parsing and writing
//! - [`config`] - Defaults and the immutable run configuration
//! - [`error`] - Error types for parsing, configuration and metrics

pub mod config;
pub mod error;
pub mod evaluation;
pub mod io;
pub mod metrics;
pub mod model;
pub mod seed;
pub mod split;
pub mod strategy;

pub use config::EvalConfig;
pub use error::{ConfigError, EvalError, MetricError, ParseError, RecommenderError};
pub use evaluation::{EvaluationReport, Evaluator, FoldReport, Recommender};
pub use model::{ItemId, Rating, RatingStore, UserId};
