//! Seeded single holdout split.

use super::{Fold, Splitter};
use crate::error::ConfigError;
use crate::model::{Rating, RatingStore};
use crate::seed;
use rand::seq::SliceRandom;

/// Sends a fixed fraction of ratings to the test side.
///
/// Ratings are shuffled the same way as in
/// [`CrossValidationSplitter`](super::CrossValidationSplitter), and the
/// first `round(count * test_fraction)` of each shuffled list become test
/// ratings. In per-user mode the fraction applies to each user separately.
#[derive(Debug, Clone)]
pub struct RandomSplitter {
    test_fraction: f64,
    per_user: bool,
    seed: u64,
}

impl RandomSplitter {
    /// # Errors
    ///
    /// [`ConfigError::InvalidTestFraction`] unless `0 < test_fraction < 1`.
    pub fn new(test_fraction: f64, per_user: bool, seed: u64) -> Result<Self, ConfigError> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(ConfigError::InvalidTestFraction(test_fraction));
        }
        Ok(Self {
            test_fraction,
            per_user,
            seed,
        })
    }

    fn assign(&self, ratings: &[Rating], fold: &mut Fold) {
        let test_count = (ratings.len() as f64 * self.test_fraction).round() as usize;
        for (position, rating) in ratings.iter().enumerate() {
            let target = if position < test_count {
                &mut fold.test
            } else {
                &mut fold.training
            };
            target.add_preference(rating.user, rating.item, rating.value);
        }
    }
}

impl Splitter for RandomSplitter {
    fn split(&self, data: &RatingStore) -> Vec<Fold> {
        let mut fold = Fold::default();

        if self.per_user {
            for (user, items) in data.iter_users() {
                let mut ratings: Vec<Rating> = items
                    .iter()
                    .map(|(item, value)| Rating::new(user, *item, *value))
                    .collect();
                ratings.shuffle(&mut seed::user_rng(self.seed, user));
                self.assign(&ratings, &mut fold);
            }
        } else {
            let mut ratings: Vec<Rating> = data.iter().collect();
            ratings.shuffle(&mut seed::run_rng(self.seed));
            self.assign(&ratings, &mut fold);
        }

        vec![fold]
    }
}
