//! Cosmetic upload progress.
//!
//! Progress is not derived from transferred bytes. While an upload is in
//! flight the bar advances by a small increment on every tick and stops short
//! of completion until the network call resolves.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Highest value simulated progress may reach before the upload resolves.
pub const PROGRESS_CAP: f64 = 90.0;

/// Value shown once the upload resolved successfully.
pub const PROGRESS_COMPLETE: f64 = 100.0;

/// Interval between simulated progress increments.
pub const PROGRESS_TICK: Duration = Duration::from_millis(200);

/// How long the success checkmark stays visible.
pub const SUCCESS_DISPLAY: Duration = Duration::from_secs(1);

const MAX_INCREMENT: f64 = 15.0;

/// Source of per-tick progress increments.
pub trait ProgressSource: Send {
    /// Next increment, in percentage points.
    fn next_increment(&mut self) -> f64;
}

/// Uniform random increments in `[0, 15)`.
#[derive(Debug, Clone)]
pub struct RandomProgress {
    rng: StdRng,
}

impl RandomProgress {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence for a given seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSource for RandomProgress {
    fn next_increment(&mut self) -> f64 {
        self.rng.gen_range(0.0..MAX_INCREMENT)
    }
}

/// Constant increments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedProgress(pub f64);

impl ProgressSource for FixedProgress {
    fn next_increment(&mut self) -> f64 {
        self.0
    }
}

/// Advance `current` by `increment`, never past [`PROGRESS_CAP`].
pub fn advance(current: f64, increment: f64) -> f64 {
    (current + increment.max(0.0)).min(PROGRESS_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_caps_below_completion() {
        assert!((advance(0.0, 10.0) - 10.0).abs() < f64::EPSILON);
        assert!((advance(85.0, 14.0) - PROGRESS_CAP).abs() < f64::EPSILON);
        assert!((advance(PROGRESS_CAP, 5.0) - PROGRESS_CAP).abs() < f64::EPSILON);
    }

    #[test]
    fn advance_ignores_negative_increments() {
        assert!((advance(40.0, -5.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn random_progress_stays_in_range() {
        let mut source = RandomProgress::new();
        for _ in 0..200 {
            let increment = source.next_increment();
            assert!((0.0..MAX_INCREMENT).contains(&increment));
        }
    }

    #[test]
    fn seeded_progress_is_reproducible() {
        let mut first = RandomProgress::seeded(7);
        let mut second = RandomProgress::seeded(7);
        let a: Vec<f64> = (0..10).map(|_| first.next_increment()).collect();
        let b: Vec<f64> = (0..10).map(|_| second.next_increment()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn repeated_ticks_never_reach_completion() {
        let mut source = FixedProgress(15.0);
        let mut progress = 0.0;
        for _ in 0..50 {
            progress = advance(progress, source.next_increment());
        }
        assert!(progress < PROGRESS_COMPLETE);
    }
}
