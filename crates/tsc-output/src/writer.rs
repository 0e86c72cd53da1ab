//! The `OutputWriter` trait implemented by all backend writers.

use crate::{DecisionRow, OutputResult, TickSummaryRow};

/// Trait implemented by the CSV and SQLite writers.
///
/// Errors are surfaced to the caller; [`DecisionLogObserver`][crate::DecisionLogObserver]
/// stores the first one for [`take_error`][crate::DecisionLogObserver::take_error].
pub trait OutputWriter {
    /// Write a batch of decision rows (one tick's worth).
    fn write_decisions(&mut self, rows: &[DecisionRow]) -> OutputResult<()>;

    /// Write one tick summary row.
    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent: safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
