//! Simulation clock
//!
//! The environment reads the last step duration when integrating motion
//! and calls `increment` exactly once at the end of every tick.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::types::Tick;

/// Source of simulated time for an environment
pub trait TimeManager: Send {
    /// Elapsed simulated time in seconds
    fn current_time(&self) -> f32;

    /// Duration of the last step in seconds
    fn last_step_duration(&self) -> f32;

    /// Number of completed ticks
    fn tick(&self) -> Tick;

    /// Advance by one step
    fn increment(&mut self);

    /// Real time a driver should wait between two ticks
    fn simulation_delay(&self) -> Duration;
}

/// Fixed-step clock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepTimeManager {
    tick: Tick,
    time: f32,
    step_duration: f32,
    delay_ms: u64,
}

impl StepTimeManager {
    /// Clock advancing `step_duration` seconds per tick, paced at `delay_ms`
    pub fn new(step_duration: f32, delay_ms: u64) -> Self {
        Self {
            tick: 0,
            time: 0.0,
            step_duration,
            delay_ms,
        }
    }

    /// One-second steps, 500 ms apart
    pub fn with_delay(delay_ms: u64) -> Self {
        Self::new(1.0, delay_ms)
    }
}

impl Default for StepTimeManager {
    fn default() -> Self {
        Self::with_delay(500)
    }
}

impl TimeManager for StepTimeManager {
    fn current_time(&self) -> f32 {
        self.time
    }

    fn last_step_duration(&self) -> f32 {
        self.step_duration
    }

    fn tick(&self) -> Tick {
        self.tick
    }

    fn increment(&mut self) {
        self.tick += 1;
        self.time += self.step_duration;
    }

    fn simulation_delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_time_manager_advances() {
        let mut time = StepTimeManager::new(0.5, 100);
        assert_eq!(time.current_time(), 0.0);
        time.increment();
        time.increment();
        assert_eq!(time.tick(), 2);
        assert_eq!(time.current_time(), 1.0);
        assert_eq!(time.last_step_duration(), 0.5);
        assert_eq!(time.simulation_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_default_delay() {
        let time = StepTimeManager::default();
        assert_eq!(time.simulation_delay(), Duration::from_millis(500));
        assert_eq!(time.last_step_duration(), 1.0);
    }
}
