//! Random sources for dice, attribute rolls and vocabulary picks.
//!
//! Games own a boxed [`RandomSource`] so tests can swap in a seeded or a
//! fully scripted source.

use rand::{Rng, RngCore, SeedableRng, rngs::StdRng};
use std::collections::VecDeque;

/// Uniform integer draws.
pub trait RandomSource: Send {
    /// Uniform draw from the closed interval `low..=high`.
    ///
    /// Returns `low` when the interval is empty or a single value.
    fn range(&mut self, low: i64, high: i64) -> i64;
}

impl<R: RngCore + Send> RandomSource for R {
    fn range(&mut self, low: i64, high: i64) -> i64 {
        if low >= high {
            return low;
        }
        self.random_range(low..=high)
    }
}

/// OS-seeded source for production games
#[must_use]
pub fn os_rng() -> Box<dyn RandomSource> {
    Box::new(StdRng::from_os_rng())
}

/// Reproducible source
#[must_use]
pub fn seeded(seed: u64) -> Box<dyn RandomSource> {
    Box::new(StdRng::seed_from_u64(seed))
}

/// Pick one item uniformly. Returns `None` for an empty slice.
pub fn pick<'a, T>(rng: &mut dyn RandomSource, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    let idx = rng.range(0, items.len() as i64 - 1);
    items.get(idx as usize)
}

/// Percentile roll from two independent digits.
///
/// The digits form `10 * d1 + d2`, except `(0, 0)` which counts as 100, so
/// the result is always in `1..=100`.
pub fn percentile_roll(rng: &mut dyn RandomSource) -> u32 {
    let tens = rng.range(0, 9) as u32;
    let ones = rng.range(0, 9) as u32;
    combine_digits(tens, ones)
}

#[must_use]
pub const fn combine_digits(tens: u32, ones: u32) -> u32 {
    if tens == 0 && ones == 0 {
        100
    } else {
        tens * 10 + ones
    }
}

/// Replays a fixed list of values.
///
/// Values outside the requested interval are clamped into it. Once the
/// script runs out every draw returns the low end of the interval.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRandom {
    values: VecDeque<i64>,
}

impl ScriptedRandom {
    pub fn new(values: impl IntoIterator<Item = i64>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    pub fn push(&mut self, value: i64) {
        self.values.push_back(value);
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn range(&mut self, low: i64, high: i64) -> i64 {
        match self.values.pop_front() {
            Some(value) => value.clamp(low, high.max(low)),
            None => low,
        }
    }
}
