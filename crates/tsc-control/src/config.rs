//! Control configuration, loaded once before the tick loop.
//!
//! # JSON shape
//!
//! ```json
//! {
//!   "classifier": { "ns_tokens": ["e0", "e1"], "ew_tokens": ["e2", "e3", "e4"] },
//!   "preemption": {
//!     "emergency_type": "emergency",
//!     "targets": [
//!       { "intersection": "J1", "direction": "EW", "phase": 0 },
//!       { "intersection": "J1", "direction": "NS", "phase": 2 }
//!     ]
//!   },
//!   "density": {
//!     "interval_ticks": 10,
//!     "intersections": [ { "id": "J1", "lanes": ["-E3", "-E1", "-E4", "-E2", "E0"] } ]
//!   },
//!   "speed": { "lower": 5.0, "recovery": 10.0, "upper": 15.0 }
//! }
//! ```
//!
//! A section's presence enables its controller.  Site-specific keys
//! (`targets`, `intersections`) are required; policy constants default to the
//! values shown.  Unknown keys are rejected so a typo cannot silently fall
//! back to a default.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use tsc_core::{IntersectionId, LaneId};

use crate::classifier::{ClassifierConfig, DirectionClassifier};
use crate::density::DurationTiers;
use crate::preemption::PreemptionTiming;
use crate::speed::SpeedBand;
use crate::targets::{PhaseTarget, PhaseTargetTable};
use crate::{ControlError, ControlResult};

// ── Sections ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreemptionConfig {
    #[serde(default = "default_emergency_type")]
    pub emergency_type:   String,
    pub targets:          Vec<PhaseTarget>,
    #[serde(default = "default_min_green_secs")]
    pub min_green_secs:   f64,
    #[serde(default = "default_extend_by_secs")]
    pub extend_by_secs:   f64,
    #[serde(default = "default_truncate_to_secs")]
    pub truncate_to_secs: f64,
}

impl PreemptionConfig {
    pub fn timing(&self) -> PreemptionTiming {
        PreemptionTiming {
            min_green_secs:   self.min_green_secs,
            extend_by_secs:   self.extend_by_secs,
            truncate_to_secs: self.truncate_to_secs,
        }
    }
}

/// An intersection sampled by the density controller, with its approach
/// lanes in evaluation order (ties go to the earliest lane).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitoredIntersection {
    pub id:    IntersectionId,
    pub lanes: Vec<LaneId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DensityConfig {
    #[serde(default = "default_interval_ticks")]
    pub interval_ticks: u64,
    pub intersections:  Vec<MonitoredIntersection>,
    #[serde(default)]
    pub tiers:          DurationTiers,
}

impl DensityConfig {
    pub fn validate(&self) -> ControlResult<()> {
        if self.interval_ticks == 0 {
            return Err(ControlError::Config("density interval_ticks must be at least 1".into()));
        }
        if self.intersections.is_empty() {
            return Err(ControlError::Config("density section lists no intersections".into()));
        }
        let mut seen = BTreeSet::new();
        for site in &self.intersections {
            if !seen.insert(&site.id) {
                return Err(ControlError::Config(format!("intersection {} is monitored twice", site.id)));
            }
            if site.lanes.is_empty() {
                return Err(ControlError::Config(format!("intersection {} has no lanes", site.id)));
            }
        }
        self.tiers.validate()
    }
}

fn default_emergency_type() -> String {
    "emergency".into()
}

fn default_min_green_secs() -> f64 {
    PreemptionTiming::default().min_green_secs
}

fn default_extend_by_secs() -> f64 {
    PreemptionTiming::default().extend_by_secs
}

fn default_truncate_to_secs() -> f64 {
    PreemptionTiming::default().truncate_to_secs
}

fn default_interval_ticks() -> u64 {
    10
}

// ── ControlConfig ─────────────────────────────────────────────────────────────

/// Top-level control configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlConfig {
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub preemption: Option<PreemptionConfig>,
    #[serde(default)]
    pub density:    Option<DensityConfig>,
    #[serde(default)]
    pub speed:      Option<SpeedBand>,
}

impl ControlConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> ControlResult<Self> {
        let config: ControlConfig =
            serde_json::from_str(json).map_err(|e| ControlError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a JSON file.
    pub fn from_path(path: &Path) -> ControlResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check every enabled section.  At least one controller must be enabled.
    pub fn validate(&self) -> ControlResult<()> {
        if self.preemption.is_none() && self.density.is_none() && self.speed.is_none() {
            return Err(ControlError::Config(
                "no controller enabled: add a preemption, density, or speed section".into(),
            ));
        }
        if let Some(p) = &self.preemption {
            DirectionClassifier::new(&self.classifier)?;
            PhaseTargetTable::from_targets(&p.targets)?;
            if p.emergency_type.trim().is_empty() {
                return Err(ControlError::Config("emergency type tag must not be empty".into()));
            }
            p.timing().validate()?;
        }
        if let Some(d) = &self.density {
            d.validate()?;
        }
        if let Some(s) = &self.speed {
            s.validate()?;
        }
        Ok(())
    }
}
