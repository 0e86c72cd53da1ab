//! `tsc-output`: decision log writers for the rust_tsc framework.
//!
//! Two backends are provided behind Cargo features:
//!
//! | Feature   | Backend     | Files created                               |
//! |-----------|-------------|---------------------------------------------|
//! | *(none)*  | CSV         | `decisions.csv`, `tick_summaries.csv`       |
//! | `sqlite`  | SQLite      | `output.db`                                 |
//!
//! Both backends implement [`OutputWriter`] and are driven by
//! [`DecisionLogObserver`], which implements `tsc_sim::SimObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tsc_output::{CsvWriter, DecisionLogObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = DecisionLogObserver::new(writer, &run_config);
//! sim.run(&mut obs)?;
//! obs.take_error().map(|e| eprintln!("output error: {e}"));
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::DecisionLogObserver;
pub use row::{DecisionRow, TickSummaryRow};
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;
