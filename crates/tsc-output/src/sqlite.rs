//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `output.db` file in the configured output directory with
//! two tables: `decisions` and `tick_summaries`.  Empty columns are `NULL`.

use std::path::Path;

use rusqlite::Connection;

use crate::{DecisionRow, OutputResult, TickSummaryRow};
use crate::writer::OutputWriter;

/// Writes decision logs to an SQLite database.
pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `output.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("output.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS decisions (
                 tick         INTEGER NOT NULL,
                 elapsed_secs REAL    NOT NULL,
                 kind         TEXT    NOT NULL,
                 intersection TEXT,
                 subject      TEXT,
                 before       REAL,
                 after        REAL,
                 detail       TEXT
             );
             CREATE TABLE IF NOT EXISTS tick_summaries (
                 tick         INTEGER PRIMARY KEY,
                 elapsed_secs REAL    NOT NULL,
                 vehicles     INTEGER NOT NULL,
                 decisions    INTEGER NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl OutputWriter for SqliteWriter {
    fn write_decisions(&mut self, rows: &[DecisionRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO decisions \
                 (tick, elapsed_secs, kind, intersection, subject, before, after, detail) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.tick,
                    row.elapsed_secs,
                    row.kind,
                    row.intersection,
                    row.subject,
                    row.before,
                    row.after,
                    row.detail,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO tick_summaries (tick, elapsed_secs, vehicles, decisions) \
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![row.tick, row.elapsed_secs, row.vehicles, row.decisions],
        )?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn
            .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
