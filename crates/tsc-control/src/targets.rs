//! The static `(intersection, direction) → phase` routing table.
//!
//! # CSV format
//!
//! ```csv
//! intersection,direction,phase
//! J1,EW,0
//! J1,NS,2
//! ```
//!
//! `direction` is `NS` or `EW` (case-insensitive).  Every row must be unique
//! on `(intersection, direction)`.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use tsc_core::{Direction, IntersectionId, PhaseIndex};

use crate::{ControlError, ControlResult};

/// One row of the target table: vehicles approaching `intersection` from
/// `direction` want `phase`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhaseTarget {
    pub intersection: IntersectionId,
    pub direction:    Direction,
    pub phase:        PhaseIndex,
}

/// Immutable, validated lookup table built once before the tick loop.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhaseTargetTable {
    inner: BTreeMap<(IntersectionId, Direction), PhaseIndex>,
}

impl PhaseTargetTable {
    /// Validate and index `targets`.
    ///
    /// Fails on an empty list, an `unknown` direction, or a repeated
    /// `(intersection, direction)` key.
    pub fn from_targets(targets: &[PhaseTarget]) -> ControlResult<Self> {
        if targets.is_empty() {
            return Err(ControlError::Config("phase target table is empty".into()));
        }
        let mut inner = BTreeMap::new();
        for t in targets {
            if !t.direction.is_known() {
                return Err(ControlError::Config(format!(
                    "target for {} has no usable direction",
                    t.intersection
                )));
            }
            if inner.insert((t.intersection.clone(), t.direction), t.phase).is_some() {
                return Err(ControlError::Config(format!(
                    "duplicate target for {} {}",
                    t.intersection, t.direction
                )));
            }
        }
        Ok(Self { inner })
    }

    /// Desired phase for vehicles approaching `intersection` from `direction`.
    pub fn get(&self, intersection: &IntersectionId, direction: Direction) -> Option<PhaseIndex> {
        self.inner.get(&(intersection.clone(), direction)).copied()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

// ── CSV loading ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TargetRecord {
    intersection: String,
    direction:    String,
    phase:        u32,
}

/// Load target rows from a CSV file.
pub fn load_targets_csv(path: &Path) -> ControlResult<Vec<PhaseTarget>> {
    let file = std::fs::File::open(path).map_err(ControlError::Io)?;
    load_targets_reader(file)
}

/// Like [`load_targets_csv`] but accepts any `Read` source.
pub fn load_targets_reader<R: Read>(reader: R) -> ControlResult<Vec<PhaseTarget>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut targets = Vec::new();

    for result in csv_reader.deserialize::<TargetRecord>() {
        let row = result.map_err(|e| ControlError::Parse(e.to_string()))?;
        let direction = row
            .direction
            .parse::<Direction>()
            .map_err(|e| ControlError::Parse(e.to_string()))?;
        targets.push(PhaseTarget {
            intersection: IntersectionId::from(row.intersection.trim()),
            direction,
            phase:        PhaseIndex(row.phase),
        });
    }

    Ok(targets)
}
