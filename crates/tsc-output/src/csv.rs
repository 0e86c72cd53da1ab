//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `decisions.csv`
//! - `tick_summaries.csv`
//!
//! Empty columns are written as empty fields.

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::{DecisionRow, OutputResult, TickSummaryRow};
use crate::writer::OutputWriter;

/// Writes decision logs to two CSV files.
pub struct CsvWriter {
    decisions: Writer<File>,
    summaries: Writer<File>,
    finished:  bool,
}

impl CsvWriter {
    /// Open (or create) the two CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut decisions = Writer::from_path(dir.join("decisions.csv"))?;
        decisions.write_record([
            "tick", "elapsed_secs", "kind", "intersection", "subject", "before", "after", "detail",
        ])?;

        let mut summaries = Writer::from_path(dir.join("tick_summaries.csv"))?;
        summaries.write_record(["tick", "elapsed_secs", "vehicles", "decisions"])?;

        Ok(Self {
            decisions,
            summaries,
            finished: false,
        })
    }
}

fn opt_num(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

impl OutputWriter for CsvWriter {
    fn write_decisions(&mut self, rows: &[DecisionRow]) -> OutputResult<()> {
        for row in rows {
            self.decisions.write_record(&[
                row.tick.to_string(),
                row.elapsed_secs.to_string(),
                row.kind.to_owned(),
                row.intersection.clone().unwrap_or_default(),
                row.subject.clone().unwrap_or_default(),
                opt_num(row.before),
                opt_num(row.after),
                row.detail.clone().unwrap_or_default(),
            ])?;
        }
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.summaries.write_record(&[
            row.tick.to_string(),
            row.elapsed_secs.to_string(),
            row.vehicles.to_string(),
            row.decisions.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.decisions.flush()?;
        self.summaries.flush()?;
        Ok(())
    }
}
