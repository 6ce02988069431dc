//! Value pickers used by the log generator.
//!
//! Every picker draws from the caller's RNG so a seeded generator stays
//! reproducible end to end.

pub mod network;

use rand::Rng;
use std::ops::RangeInclusive;

/// Pick one element uniformly. `values` must not be empty.
pub fn one_of<'a, T, R: Rng>(rng: &mut R, values: &'a [T]) -> &'a T {
    let idx = rng.gen_range(0..values.len());
    &values[idx]
}

/// Build a `<prefix>-<n>` label with `n` drawn uniformly from `range`.
pub fn numbered_label<R: Rng>(rng: &mut R, prefix: &str, range: RangeInclusive<u32>) -> String {
    format!("{prefix}-{}", rng.gen_range(range))
}
