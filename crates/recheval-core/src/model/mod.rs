//! Ratings data model.
//!
//! [`RatingStore`] is the sparse (user, item) → value table every other
//! component reads or writes. Identifiers are the [`UserId`] and [`ItemId`]
//! newtypes so the two id spaces cannot be mixed up.

pub mod store;
pub mod types;

pub use store::RatingStore;
pub use types::{ItemId, Rating, UserId};
