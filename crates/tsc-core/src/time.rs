//! Simulation time model.
//!
//! # Design
//!
//! Time is a monotonically increasing `Tick` counter: one tick is one call to
//! the simulator's step function.  The mapping to simulated seconds lives in
//! `SimClock`:
//!
//!   elapsed_secs = tick * step_length_secs
//!
//! Tick 0 is "before the first step".  The driver advances the simulator and
//! then the clock, so the first tick the controllers ever see is `T1`.  Tick
//! cadences (`every 10 ticks`) are therefore evaluated on the 1-based counter.

use std::fmt;

use crate::{CoreError, CoreResult};

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }

    /// `true` if this tick falls on an `interval`-tick cadence.
    ///
    /// Tick 0 never matches, and an interval of 0 never matches.
    #[inline]
    pub fn on_cadence(self, interval: u64) -> bool {
        interval > 0 && self.0 > 0 && self.0.is_multiple_of(interval)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl std::ops::Sub for Tick {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Tick) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Converts tick counts into simulated seconds.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Simulated seconds per step (the simulator's `--step-length`).
    pub step_length_secs: f64,
    /// The current tick: advanced by `SimClock::advance()` after each step.
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(step_length_secs: f64) -> Self {
        Self { step_length_secs, current_tick: Tick::ZERO }
    }

    /// Advance the clock by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    /// Elapsed simulated seconds since tick 0.
    #[inline]
    pub fn elapsed_secs(&self) -> f64 {
        self.secs_at(self.current_tick)
    }

    /// Simulated seconds at an arbitrary tick.
    #[inline]
    pub fn secs_at(&self, tick: Tick) -> f64 {
        tick.0 as f64 * self.step_length_secs
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2} s)", self.current_tick, self.elapsed_secs())
    }
}

// ── RunConfig ─────────────────────────────────────────────────────────────────

/// Driver-level configuration for one run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunConfig {
    /// Simulated seconds per step.  Only used for reporting; the simulator
    /// owns the real step length.
    pub step_length_secs: f64,

    /// Stop after this many ticks even if the simulator still expects
    /// vehicles.  `None` runs until the simulator is exhausted.
    pub max_ticks: Option<u64>,
}

impl RunConfig {
    /// Reject non-positive step lengths and a zero tick budget.
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.step_length_secs.is_finite() && self.step_length_secs > 0.0) {
            return Err(CoreError::Config(format!(
                "step_length_secs must be a positive number, got {}",
                self.step_length_secs
            )));
        }
        if self.max_ticks == Some(0) {
            return Err(CoreError::Config("max_ticks must be at least 1".into()));
        }
        Ok(())
    }

    /// `true` once `tick` has used up the budget.
    #[inline]
    pub fn budget_exhausted(&self, tick: Tick) -> bool {
        self.max_ticks.is_some_and(|max| tick.0 >= max)
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.step_length_secs)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { step_length_secs: 1.0, max_ticks: None }
    }
}
