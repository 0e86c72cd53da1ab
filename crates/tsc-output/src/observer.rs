//! `DecisionLogObserver<W>`: bridges `SimObserver` to an `OutputWriter`.

use tsc_control::ControlEvent;
use tsc_core::{RunConfig, SimClock};
use tsc_sim::{RunSummary, SimObserver, TickSummary};

use crate::row::{DecisionRow, TickSummaryRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`SimObserver`] that writes every controller decision and tick summary
/// to any [`OutputWriter`] backend (CSV, SQLite).
///
/// Decisions are buffered per tick and written as one batch when the tick
/// ends.  Errors from the writer are stored internally because `SimObserver`
/// methods have no return value.  After `sim.run()` returns, check for errors
/// with [`take_error`][Self::take_error].
///
/// If the run aborts with an error, `on_sim_end` is not called; call
/// [`finish`][Self::finish] to flush what was logged.
pub struct DecisionLogObserver<W: OutputWriter> {
    writer:     W,
    clock:      SimClock,
    pending:    Vec<DecisionRow>,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> DecisionLogObserver<W> {
    /// Create an observer backed by `writer`, using `config` to stamp rows
    /// with simulated seconds.
    pub fn new(writer: W, config: &RunConfig) -> Self {
        Self {
            writer,
            clock:      config.make_clock(),
            pending:    Vec::new(),
            last_error: None,
        }
    }

    /// Take the stored write error (if any) after `sim.run()` returns.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Write any buffered decisions and flush the writer.
    pub fn finish(&mut self) -> OutputResult<()> {
        self.flush_pending()?;
        self.writer.finish()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the sim).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn flush_pending(&mut self) -> OutputResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let rows = std::mem::take(&mut self.pending);
        self.writer.write_decisions(&rows)
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for DecisionLogObserver<W> {
    fn on_decision(&mut self, event: &ControlEvent) {
        let elapsed = self.clock.secs_at(event.tick);
        self.pending.push(DecisionRow::from_event(event, elapsed));
    }

    fn on_tick_end(&mut self, summary: &TickSummary) {
        let result = self.flush_pending();
        self.store_err(result);

        let row = TickSummaryRow {
            tick:         summary.tick.0,
            elapsed_secs: summary.elapsed_secs,
            vehicles:     summary.vehicles as u64,
            decisions:    summary.decisions as u64,
        };
        let result = self.writer.write_tick_summary(&row);
        self.store_err(result);
    }

    fn on_sim_end(&mut self, _summary: &RunSummary) {
        let result = self.finish();
        self.store_err(result);
    }
}
