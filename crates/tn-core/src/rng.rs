//! Deterministic per-row and per-stage RNG wrappers.
//!
//! # Determinism strategy
//!
//! Each trip row gets its own independent `SmallRng` seeded by:
//!
//!   seed = global_seed XOR (row * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive row numbers uniformly across the seed space.
//! This means:
//!
//! - Rows never share RNG state, so sampling can run on any number of
//!   threads and still produce identical output.
//! - Truncating the trip file (`trip_limit`) does not change the samples
//!   drawn for the rows that remain.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

// ── RowRng ────────────────────────────────────────────────────────────────────

/// Per-row deterministic RNG.
///
/// Create one per trip at the start of mapping; it is dropped with the row.
pub struct RowRng(SmallRng);

impl RowRng {
    /// Seed deterministically from the run's global seed and a row number.
    pub fn new(global_seed: u64, row: u64) -> Self {
        let seed = global_seed ^ row.wrapping_mul(MIXING_CONSTANT);
        RowRng(SmallRng::seed_from_u64(seed))
    }

    /// Choose a uniformly random element from a slice.
    /// Returns `None` if the slice is empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        slice.choose(&mut self.0)
    }
}

// ── StageRng ──────────────────────────────────────────────────────────────────

/// Stage-level RNG for single-threaded operations such as picking the
/// node pairs spot-checked after pruning.
pub struct StageRng(SmallRng);

impl StageRng {
    pub fn new(seed: u64) -> Self {
        StageRng(SmallRng::seed_from_u64(seed))
    }

    /// Generate a value uniformly in `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }
}
