//! Evaluation pipeline.
//!
//! Wires the stages together for one fold or a whole cross-validation run:
//!
//! ```text
//! RatingStore ─split→ Fold{training, test}
//!             training ─Recommender→ recommended
//!             recommended ─CandidateStrategy→ filtered
//!             filtered vs test ─metrics→ FoldReport
//! FoldReport* ─mean→ EvaluationReport
//! ```
//!
//! The recommender is injected through the [`Recommender`] trait; the core
//! never depends on a specific algorithm.
//!
//! # Example
//!
//! ```ignore
//! use recheval_core::config::EvalConfig;
//! use recheval_core::evaluation::Evaluator;
//!
//! let evaluator = Evaluator::new(EvalConfig::default())?;
//! let report = evaluator.cross_validate(&ratings, &my_recommender)?;
//! println!("NDCG@10: {:.4}", report.mean.ndcg[&10]);
//! ```

pub mod evaluator;
pub mod report;

pub use evaluator::{Evaluator, Recommender};
pub use report::{EvaluationReport, FoldReport, MeanReport};
