//! Per-fold candidate computation.

use super::{CandidateStrategy, StrategyKind, UnseenItems};
use crate::model::{ItemId, RatingStore, UserId};
use crate::seed;
use rand::seq::SliceRandom;
use std::collections::BTreeSet;
use tracing::debug;

/// A [`CandidateStrategy`] bound to one fold.
///
/// Holds borrowed training and test stores plus the precomputed test item
/// universe. Every candidate set is a subset of that universe, since nothing
/// outside it has ground truth to score against.
#[derive(Debug)]
pub struct FoldStrategy<'a> {
    strategy: CandidateStrategy,
    training: &'a RatingStore,
    test: &'a RatingStore,
    test_items: BTreeSet<ItemId>,
}

impl<'a> FoldStrategy<'a> {
    pub(super) fn new(
        strategy: CandidateStrategy,
        training: &'a RatingStore,
        test: &'a RatingStore,
    ) -> Self {
        Self {
            strategy,
            training,
            test,
            test_items: test.items(),
        }
    }

    /// Items eligible for scoring for `user`.
    ///
    /// Never fails; unknown users get an empty set (or, for the
    /// training-complement variant, the unseen part of the universe).
    pub fn candidate_items(&self, user: UserId) -> BTreeSet<ItemId> {
        match self.strategy.kind() {
            StrategyKind::AllTestItems => self.test.user_items(user),
            StrategyKind::RelevantTestItems => self.relevant_test_items(user),
            StrategyKind::TrainingComplement {
                unseen,
                include_relevant,
            } => {
                let mut candidates = match unseen {
                    UnseenItems::All => {
                        let trained = self.training.user_items(user);
                        self.test_items.difference(&trained).copied().collect()
                    }
                    UnseenItems::Sample { size, seed } => self.sample_unseen(user, size, seed),
                };
                if include_relevant {
                    candidates.extend(self.relevant_test_items(user));
                }
                candidates
            }
        }
    }

    /// Keeps only the recommended (user, item) pairs whose item is a
    /// candidate for that user.
    pub fn filter(&self, recommended: &RatingStore) -> RatingStore {
        let mut filtered = RatingStore::new();
        for (user, items) in recommended.iter_users() {
            let candidates = self.candidate_items(user);
            for (item, value) in items {
                if candidates.contains(item) {
                    filtered.add_preference(user, *item, *value);
                }
            }
        }
        debug!(
            kept = filtered.num_preferences(),
            total = recommended.num_preferences(),
            "Filtered recommendations through candidate strategy"
        );
        filtered
    }

    fn relevant_test_items(&self, user: UserId) -> BTreeSet<ItemId> {
        let threshold = self.strategy.threshold();
        self.test
            .user_preferences(user)
            .map(|items| {
                items
                    .iter()
                    .filter(|(_, value)| **value >= threshold)
                    .map(|(item, _)| *item)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Draws `size` items without replacement from the test universe minus
    /// everything the user rated in training or test.
    fn sample_unseen(&self, user: UserId, size: usize, seed: u64) -> BTreeSet<ItemId> {
        let trained = self.training.user_items(user);
        let tested = self.test.user_items(user);
        let pool: Vec<ItemId> = self
            .test_items
            .iter()
            .filter(|item| !trained.contains(*item) && !tested.contains(*item))
            .copied()
            .collect();

        let mut rng = seed::user_rng(seed, user);
        pool.choose_multiple(&mut rng, size).copied().collect()
    }
}
