//! Simulation observer trait for progress reporting and decision logging.

use tsc_control::{ControlEvent, EventSink};
use tsc_core::Tick;

use crate::{RunSummary, TickSummary};

/// Callbacks invoked by [`SignalSim::run`][crate::SignalSim::run] at key
/// points in the tick loop.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: progress printer
///
/// ```rust,ignore
/// struct ProgressPrinter { interval: u64 }
///
/// impl SimObserver for ProgressPrinter {
///     fn on_tick_end(&mut self, summary: &TickSummary) {
///         if summary.tick.0 % self.interval == 0 {
///             println!("{:.1} s: {} vehicles", summary.elapsed_secs, summary.vehicles);
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called right after the simulator has stepped, before any controller
    /// runs.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called for every event a controller emits, in emission order.
    fn on_decision(&mut self, _event: &ControlEvent) {}

    /// Called once all controllers have run for the tick.
    fn on_tick_end(&mut self, _summary: &TickSummary) {}

    /// Called once after the loop stops and the adapter is closed.  Not
    /// called when the run ends in an error.
    fn on_sim_end(&mut self, _summary: &RunSummary) {}
}

/// A [`SimObserver`] that does nothing.  Use when you need to call `run` but
/// don't want callbacks.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}

/// Forwards controller events to an observer and counts them.
pub(crate) struct ObserverSink<'a, O: SimObserver> {
    observer: &'a mut O,
    emitted:  usize,
}

impl<'a, O: SimObserver> ObserverSink<'a, O> {
    pub(crate) fn new(observer: &'a mut O) -> Self {
        Self { observer, emitted: 0 }
    }

    pub(crate) fn emitted(&self) -> usize {
        self.emitted
    }
}

impl<O: SimObserver> EventSink for ObserverSink<'_, O> {
    fn emit(&mut self, event: ControlEvent) {
        self.emitted += 1;
        self.observer.on_decision(&event);
    }
}
