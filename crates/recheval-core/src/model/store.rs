//! In-memory ratings table.

use super::types::{ItemId, Rating, UserId};
use std::collections::{BTreeMap, BTreeSet};

/// Sparse matrix of (user, item) → preference value.
///
/// At most one value is stored per pair; a later write overwrites the
/// earlier one. Both levels are `BTreeMap`s, so users, items and triples
/// always iterate in ascending id order. Splitting and tie-breaking rely on
/// that order for reproducibility.
///
/// Stores are built by a single writer (parser, splitter, strategy filter)
/// and then only read, so no interior mutability is involved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingStore {
    prefs: BTreeMap<UserId, BTreeMap<ItemId, f64>>,
}

impl RatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the value for (user, item).
    ///
    /// Any f64 is accepted, including NaN and negative values.
    pub fn add_preference(&mut self, user: UserId, item: ItemId, value: f64) {
        self.prefs.entry(user).or_default().insert(item, value);
    }

    /// Returns the stored value, or `None` when the pair is absent.
    ///
    /// A stored `0.0` is returned as `Some(0.0)`.
    pub fn preference(&self, user: UserId, item: ItemId) -> Option<f64> {
        self.prefs.get(&user)?.get(&item).copied()
    }

    /// All user identifiers, ascending.
    pub fn users(&self) -> BTreeSet<UserId> {
        self.prefs.keys().copied().collect()
    }

    /// All item identifiers rated by any user, ascending.
    pub fn items(&self) -> BTreeSet<ItemId> {
        self.prefs
            .values()
            .flat_map(|items| items.keys().copied())
            .collect()
    }

    /// Items rated by `user`. Empty for unknown users.
    pub fn user_items(&self, user: UserId) -> BTreeSet<ItemId> {
        self.prefs
            .get(&user)
            .map(|items| items.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Number of items rated by `user`. Zero for unknown users.
    pub fn user_item_count(&self, user: UserId) -> usize {
        self.prefs.get(&user).map_or(0, BTreeMap::len)
    }

    /// The item → value map of `user`, if the user has any preference.
    pub fn user_preferences(&self, user: UserId) -> Option<&BTreeMap<ItemId, f64>> {
        self.prefs.get(&user)
    }

    pub fn contains_user(&self, user: UserId) -> bool {
        self.prefs.contains_key(&user)
    }

    pub fn num_users(&self) -> usize {
        self.prefs.len()
    }

    pub fn num_items(&self) -> usize {
        self.items().len()
    }

    /// Total number of stored (user, item) pairs.
    pub fn num_preferences(&self) -> usize {
        self.prefs.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.prefs.is_empty()
    }

    /// Iterates over users and their item maps, ascending by user.
    pub fn iter_users(&self) -> impl Iterator<Item = (UserId, &BTreeMap<ItemId, f64>)> {
        self.prefs.iter().map(|(user, items)| (*user, items))
    }

    /// Iterates over every stored triple, ascending by (user, item).
    pub fn iter(&self) -> impl Iterator<Item = Rating> + '_ {
        self.prefs.iter().flat_map(|(user, items)| {
            items
                .iter()
                .map(move |(item, value)| Rating::new(*user, *item, *value))
        })
    }
}

impl FromIterator<Rating> for RatingStore {
    fn from_iter<I: IntoIterator<Item = Rating>>(iter: I) -> Self {
        let mut store = RatingStore::new();
        store.extend(iter);
        store
    }
}

impl Extend<Rating> for RatingStore {
    fn extend<I: IntoIterator<Item = Rating>>(&mut self, iter: I) {
        for rating in iter {
            self.add_preference(rating.user, rating.item, rating.value);
        }
    }
}
