//! k-fold cross-validation splitter.

use super::{Fold, Splitter};
use crate::error::ConfigError;
use crate::model::{Rating, RatingStore};
use crate::seed;
use rand::seq::SliceRandom;
use tracing::debug;

/// Partitions ratings into `folds` disjoint test buckets.
///
/// # Algorithm
///
/// Per-user mode: each user's ratings (ascending item order) are shuffled
/// with an RNG seeded from `(seed, user)`, then dealt round-robin, so
/// shuffled position `p` lands in bucket `p % folds`. When the count is not
/// divisible, the lower-numbered buckets get the extra ratings. Fold `i`
/// tests on bucket `i` and trains on everything else, so the test sides of
/// all folds cover every rating exactly once.
///
/// Global mode: all triples are shuffled once with an RNG seeded from
/// `seed` and dealt the same way. A user may be missing from some test sides.
#[derive(Debug, Clone)]
pub struct CrossValidationSplitter {
    folds: usize,
    per_user: bool,
    seed: u64,
}

impl CrossValidationSplitter {
    /// Creates a splitter.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidFoldCount`] if `folds` is zero.
    pub fn new(folds: usize, per_user: bool, seed: u64) -> Result<Self, ConfigError> {
        if folds == 0 {
            return Err(ConfigError::InvalidFoldCount(folds));
        }
        Ok(Self {
            folds,
            per_user,
            seed,
        })
    }

    pub fn folds(&self) -> usize {
        self.folds
    }

    fn deal(&self, ratings: &[Rating], out: &mut [Fold]) {
        for (position, rating) in ratings.iter().enumerate() {
            let bucket = position % self.folds;
            for (index, fold) in out.iter_mut().enumerate() {
                let target = if index == bucket {
                    &mut fold.test
                } else {
                    &mut fold.training
                };
                target.add_preference(rating.user, rating.item, rating.value);
            }
        }
    }
}

impl Splitter for CrossValidationSplitter {
    fn split(&self, data: &RatingStore) -> Vec<Fold> {
        let mut out = vec![Fold::default(); self.folds];

        if self.per_user {
            for (user, items) in data.iter_users() {
                let mut ratings: Vec<Rating> = items
                    .iter()
                    .map(|(item, value)| Rating::new(user, *item, *value))
                    .collect();
                ratings.shuffle(&mut seed::user_rng(self.seed, user));
                self.deal(&ratings, &mut out);
            }
        } else {
            let mut ratings: Vec<Rating> = data.iter().collect();
            ratings.shuffle(&mut seed::run_rng(self.seed));
            self.deal(&ratings, &mut out);
        }

        debug!(
            folds = self.folds,
            per_user = self.per_user,
            ratings = data.num_preferences(),
            "Split ratings into folds"
        );
        out
    }
}
