//! Deterministic seeding for splitters and sampling strategies.
//!
//! Each user gets an RNG derived from the run seed and the user id, so a
//! user's shuffle or sample does not depend on which other users exist or
//! in which order they are visited.

use crate::model::UserId;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Mixes a salt into a seed with the SplitMix64 finaliser.
pub fn mix(seed: u64, salt: u64) -> u64 {
    let mut z = seed ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// RNG for the whole run (global splitting).
pub fn run_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// RNG dedicated to one user.
pub fn user_rng(seed: u64, user: UserId) -> StdRng {
    StdRng::seed_from_u64(mix(seed, user.as_u64()))
}
