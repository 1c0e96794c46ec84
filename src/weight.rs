//! Nice-to-weight mapping and vruntime arithmetic.
//!
//! The 40-entry table is the standard CFS weight table: each niceness
//! step changes a task's CPU share by roughly 10%, with nice 0 pinned
//! to [`NICE_0_LOAD`]. These are free functions with no engine
//! dependencies, testable offline.

use crate::types::{Nice, Vtime, Weight};

/// Weight of a nice-0 task; the unit all share math is normalized to.
pub const NICE_0_LOAD: Weight = 1024;

/// Lowest (most favorable) niceness.
pub const NICE_MIN: Nice = -20;

/// Highest (least favorable) niceness.
pub const NICE_MAX: Nice = 19;

/// Ceiling on effective weight, keeping `quanta * NICE_0_LOAD / weight`
/// inside i64 range.
const WEIGHT_MAX: Weight = 2_000_000_000;

#[rustfmt::skip]
const NICE_TO_WEIGHT: [Weight; 40] = [
    88761, 71755, 56483, 46273, 36291,
    29154, 23254, 18705, 14949, 11916,
     9548,  7620,  6100,  4904,  3906,
     3121,  2501,  1991,  1586,  1277,
     1024,   820,   655,   526,   423,
      335,   272,   215,   172,   137,
      110,    87,    70,    56,    45,
       36,    29,    23,    18,    15,
];

/// Clamp a niceness value into `[NICE_MIN, NICE_MAX]`.
pub fn clamp_nice(nice: Nice) -> Nice {
    nice.clamp(NICE_MIN, NICE_MAX)
}

/// Look up the weight for a niceness value (clamped first).
pub fn nice_to_weight(nice: Nice) -> Weight {
    NICE_TO_WEIGHT[(clamp_nice(nice) - NICE_MIN) as usize]
}

/// A task's weight scaled by its cgroup's `cpu_shares`, normalized to
/// [`NICE_0_LOAD`], floored at 1 and capped at 2e9. Truncating integer
/// arithmetic throughout.
pub fn effective_weight(weight: Weight, shares: i64) -> Weight {
    (weight.saturating_mul(shares) / NICE_0_LOAD).clamp(1, WEIGHT_MAX)
}

/// Per-tick vruntime advance for a task with the given effective
/// weight: `max(1, quanta * NICE_0_LOAD / eweight)`. Higher weight
/// falls behind more slowly in the runqueue.
pub fn vruntime_delta(quanta: i64, eweight: Weight) -> Vtime {
    (quanta.saturating_mul(NICE_0_LOAD) / eweight).max(1)
}
