//! Time management for the simulation
//!
//! Each environment advances in discrete steps. Steps group into coarse
//! time bins (12 five-minute steps per 2-hour bin, 24 bins wrapping daily).
//! This module provides deterministic step advancement and bin derivation.

use serde::{Deserialize, Serialize};

/// Manages simulation time in discrete steps and coarse bins
///
/// # Example
/// ```
/// use dispatch_simulator_core_rs::core::time::StepClock;
///
/// let mut clock = StepClock::new(12, 24);
/// assert_eq!(clock.current_step(), 0);
/// assert_eq!(clock.time_bin(), 0);
///
/// clock.advance();
/// assert_eq!(clock.current_step(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepClock {
    /// Total steps elapsed since simulation start
    current_step: usize,
    /// Number of steps in one coarse time bin
    steps_per_bin: usize,
    /// Number of bins before the bin index wraps
    bins_per_day: usize,
}

impl StepClock {
    /// Create a new StepClock
    ///
    /// # Arguments
    /// * `steps_per_bin` - Number of steps grouped into one coarse bin
    /// * `bins_per_day` - Number of bins before the index wraps to 0
    pub fn new(steps_per_bin: usize, bins_per_day: usize) -> Self {
        assert!(steps_per_bin > 0, "steps_per_bin must be positive");
        assert!(bins_per_day > 0, "bins_per_day must be positive");
        Self {
            current_step: 0,
            steps_per_bin,
            bins_per_day,
        }
    }

    /// Restore a clock at a given step position (for snapshot loading).
    pub fn at_step(step: usize, steps_per_bin: usize, bins_per_day: usize) -> Self {
        let mut clock = Self::new(steps_per_bin, bins_per_day);
        clock.current_step = step;
        clock
    }

    /// Advance time by one step
    pub fn advance(&mut self) {
        self.current_step += 1;
    }

    /// Get the current step (total steps since start)
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Get the coarse time bin for the current step
    ///
    /// Computed as `(current_step / steps_per_bin) % bins_per_day`.
    ///
    /// # Example
    /// ```
    /// use dispatch_simulator_core_rs::core::time::StepClock;
    ///
    /// let mut clock = StepClock::new(12, 24);
    /// for _ in 0..12 {
    ///     clock.advance();
    /// }
    /// assert_eq!(clock.time_bin(), 1);
    /// ```
    pub fn time_bin(&self) -> usize {
        (self.current_step / self.steps_per_bin) % self.bins_per_day
    }
}
