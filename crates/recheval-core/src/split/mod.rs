//! Train/test partitioning of a [`RatingStore`].
//!
//! - [`CrossValidationSplitter`] - k-fold partition, per user or global
//! - [`RandomSplitter`] - single seeded holdout split
//!
//! Both are deterministic: the same store, parameters and seed always give
//! identical folds.

pub mod cross_validation;
pub mod random;

pub use cross_validation::CrossValidationSplitter;
pub use random::RandomSplitter;

use crate::model::RatingStore;

/// One train/test partition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fold {
    pub training: RatingStore,
    pub test: RatingStore,
}

/// Produces folds from a ratings store.
///
/// Folds are returned fully materialised, index 0..N-1.
pub trait Splitter {
    fn split(&self, data: &RatingStore) -> Vec<Fold>;
}
