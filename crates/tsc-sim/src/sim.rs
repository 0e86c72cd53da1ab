//! The `SignalSim` struct and its tick loop.

use tracing::{debug, info, warn};

use tsc_control::{
    ControlEvent, Decision, DensityController, EventSink, PreemptionController, SpeedRegulator,
};
use tsc_core::{RunConfig, SimClock, Tick};
use tsc_telemetry::TelemetryAdapter;

use crate::observer::ObserverSink;
use crate::{Arbitration, RunSummary, SimObserver, SimResult, StopReason, TickSummary};

// ── SignalSim ─────────────────────────────────────────────────────────────────

/// The main simulation runner.
///
/// `SignalSim<A>` owns the adapter and the configured controllers and drives
/// the tick loop:
///
/// 1. **Termination**: stop when the simulator expects no more vehicles or
///    the tick budget is used up.
/// 2. **Step**: advance the simulator one step, then the clock.
/// 3. **Preemption**: emergency overrides (every tick).
/// 4. **Density**: tiered durations (on its cadence), subject to
///    [`Arbitration`].
/// 5. **Speed**: band enforcement (every tick).
///
/// Any subset of controllers may be configured.  Create via
/// [`SimBuilder`][crate::SimBuilder].
pub struct SignalSim<A: TelemetryAdapter> {
    /// Step length and tick budget.
    pub config: RunConfig,

    /// Simulation clock; tracks the current tick and maps it to seconds.
    pub clock: SimClock,

    /// The simulator connection.  Closed when `run` returns.
    pub adapter: A,

    pub preemption: Option<PreemptionController>,
    pub density:    Option<DensityController>,
    pub speed:      Option<SpeedRegulator>,

    pub arbitration: Arbitration,
}

impl<A: TelemetryAdapter> SignalSim<A> {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run until the simulator is exhausted or the tick budget is reached,
    /// then close the adapter.
    ///
    /// The adapter is closed on every exit path, including errors; a close
    /// failure after a successful run is returned as an error.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<RunSummary> {
        info!(
            step_length_secs = self.config.step_length_secs,
            max_ticks = ?self.config.max_ticks,
            preemption = self.preemption.is_some(),
            density = self.density.is_some(),
            speed = self.speed.is_some(),
            arbitration = %self.arbitration,
            "run starting"
        );

        let outcome = self.drive(observer);
        let closed = self.adapter.close();

        match outcome {
            Ok(summary) => {
                closed?;
                info!(
                    ticks = summary.ticks,
                    elapsed_secs = summary.elapsed_secs,
                    decisions = summary.decisions,
                    reason = %summary.stop_reason,
                    "run finished"
                );
                observer.on_sim_end(&summary);
                Ok(summary)
            }
            Err(e) => {
                if let Err(close_err) = closed {
                    warn!(error = %close_err, "close failed after aborted run");
                }
                warn!(tick = self.clock.current_tick.0, error = %e, "run aborted");
                Err(e)
            }
        }
    }

    /// Run exactly `n` ticks from the current position, ignoring the
    /// termination checks and leaving the adapter open.
    ///
    /// Useful for tests and incremental stepping.
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.step(observer)?;
        }
        Ok(())
    }

    /// Advance the simulator one step and run every configured controller.
    pub fn step<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<TickSummary> {
        self.adapter.advance_step()?;
        self.clock.advance();
        let now = self.clock.current_tick;
        observer.on_tick_start(now);

        let vehicles = self.adapter.list_vehicles()?.len();
        let mut sink = ObserverSink::new(observer);

        if let Some(preemption) = self.preemption.as_mut() {
            preemption.tick(now, &mut self.adapter, &mut sink)?;
        }
        if self.density.as_ref().is_some_and(|d| d.is_due(now)) {
            self.run_density(now, &mut sink)?;
        }
        if let Some(speed) = self.speed.as_ref() {
            speed.regulate(now, &mut self.adapter, &mut sink)?;
        }

        let summary = TickSummary {
            tick:         now,
            elapsed_secs: self.clock.elapsed_secs(),
            vehicles,
            decisions:    sink.emitted(),
        };
        observer.on_tick_end(&summary);
        Ok(summary)
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn drive<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<RunSummary> {
        let mut decisions = 0;
        let stop_reason = loop {
            if self.adapter.remaining_expected_entities()? == 0 {
                break StopReason::Exhausted;
            }
            if self.config.budget_exhausted(self.clock.current_tick) {
                break StopReason::BudgetReached;
            }
            decisions += self.step(observer)?.decisions;
        };
        Ok(RunSummary {
            ticks:        self.clock.current_tick.0,
            elapsed_secs: self.clock.elapsed_secs(),
            decisions,
            stop_reason,
        })
    }

    /// Evaluate every monitored intersection, honouring the arbitration mode.
    fn run_density<S: EventSink>(&mut self, now: Tick, sink: &mut S) -> SimResult<()> {
        let Some(density) = self.density.as_ref() else {
            return Ok(());
        };
        for site in density.intersections() {
            let overridden = self.arbitration == Arbitration::PreemptionPrecedence
                && self.preemption.as_ref().is_some_and(|p| p.is_overriding(&site.id));
            if overridden {
                debug!(tick = now.0, intersection = %site.id, "density write suppressed by preemption");
                sink.emit(ControlEvent {
                    tick:     now,
                    decision: Decision::DensitySuppressed { intersection: site.id.clone() },
                });
                continue;
            }
            density.evaluate_intersection(now, site, &mut self.adapter, sink)?;
        }
        Ok(())
    }
}
