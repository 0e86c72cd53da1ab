//! Per-tick and per-run summaries handed to observers.

use std::fmt;

use tsc_core::Tick;

/// What happened in one tick.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TickSummary {
    pub tick:         Tick,
    /// Simulated seconds at the end of the tick.
    pub elapsed_secs: f64,
    /// Vehicles on the network after the step.
    pub vehicles:     usize,
    /// Events emitted by all controllers this tick.
    pub decisions:    usize,
}

/// Why the tick loop stopped.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The simulator expects no further vehicles.
    Exhausted,
    /// `RunConfig::max_ticks` was reached first.
    BudgetReached,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::Exhausted     => "simulation exhausted",
            StopReason::BudgetReached => "tick budget reached",
        })
    }
}

/// Totals for a completed run.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RunSummary {
    /// Ticks executed.
    pub ticks:        u64,
    pub elapsed_secs: f64,
    pub decisions:    usize,
    pub stop_reason:  StopReason,
}
