//! Emergency-vehicle signal preemption.
//!
//! # Per-tick algorithm
//!
//! ```text
//! for each vehicle whose type tag is the emergency tag (adapter order):
//!   direction  = classify(segment)            skip if Unknown
//!   signal     = next signal on its route     skip if none
//!   desired    = targets[(signal, direction)] skip if unmapped
//!   mark signal active
//!   if record[signal] != desired:
//!     current == desired → duration = max(min_green, current_duration + extend_by)
//!     current != desired → duration = truncate_to
//!     record[signal] = desired
//! drop every record entry that was not marked active
//! ```
//!
//! The record makes repeated identical requests no-ops, so a vehicle sitting
//! in front of a light does not keep resetting its timer.  When two emergency
//! vehicles want different phases at the same intersection in one tick, both
//! writes go out and the later vehicle in enumeration order owns the record.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use tsc_core::{IntersectionId, PhaseIndex, Tick};
use tsc_telemetry::TelemetryAdapter;

use crate::classifier::{ClassifierConfig, DirectionClassifier};
use crate::config::PreemptionConfig;
use crate::fault::tolerate;
use crate::targets::PhaseTargetTable;
use crate::{ControlError, ControlEvent, ControlResult, Decision, EventSink};

// ── AdjustedLights ────────────────────────────────────────────────────────────

/// Intersections currently under emergency override, with the phase that was
/// forced.  An intersection is present iff it is being overridden.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdjustedLights {
    inner: BTreeMap<IntersectionId, PhaseIndex>,
}

impl AdjustedLights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, intersection: &IntersectionId) -> Option<PhaseIndex> {
        self.inner.get(intersection).copied()
    }

    pub fn contains(&self, intersection: &IntersectionId) -> bool {
        self.inner.contains_key(intersection)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IntersectionId, PhaseIndex)> {
        self.inner.iter().map(|(id, &phase)| (id, phase))
    }

    fn record(&mut self, intersection: IntersectionId, phase: PhaseIndex) {
        self.inner.insert(intersection, phase);
    }

    /// Remove and return every entry not in `active`.
    fn lapse_inactive(&mut self, active: &BTreeSet<IntersectionId>) -> Vec<(IntersectionId, PhaseIndex)> {
        let lapsed: Vec<IntersectionId> = self
            .inner
            .keys()
            .filter(|id| !active.contains(*id))
            .cloned()
            .collect();
        lapsed
            .into_iter()
            .filter_map(|id| self.inner.remove(&id).map(|phase| (id, phase)))
            .collect()
    }
}

// ── Timing ────────────────────────────────────────────────────────────────────

/// Which way an override pushes the current phase.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Override {
    /// The desired phase is showing: keep it longer.
    Extend,
    /// Another phase is showing: end it now.
    Truncate,
}

/// Duration constants for preemption writes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PreemptionTiming {
    /// Floor applied to an extended phase.
    pub min_green_secs:   f64,
    /// Added to the current phase duration when extending.
    pub extend_by_secs:   f64,
    /// Near-zero duration that forces an imminent phase change.
    pub truncate_to_secs: f64,
}

impl PreemptionTiming {
    pub fn override_for(current: PhaseIndex, desired: PhaseIndex) -> Override {
        if current == desired { Override::Extend } else { Override::Truncate }
    }

    /// `max(min_green, current_duration + extend_by)`.
    pub fn extended_duration(&self, current_duration: f64) -> f64 {
        (current_duration + self.extend_by_secs).max(self.min_green_secs)
    }

    pub fn validate(&self) -> ControlResult<()> {
        let checks = [
            ("min_green_secs", self.min_green_secs, false),
            ("extend_by_secs", self.extend_by_secs, true),
            ("truncate_to_secs", self.truncate_to_secs, true),
        ];
        for (name, value, allow_zero) in checks {
            let ok = value.is_finite() && (value > 0.0 || (allow_zero && value == 0.0));
            if !ok {
                return Err(ControlError::Config(format!("preemption {name} is invalid: {value}")));
            }
        }
        if self.truncate_to_secs >= self.min_green_secs {
            return Err(ControlError::Config(format!(
                "preemption truncate_to_secs ({}) must be below min_green_secs ({})",
                self.truncate_to_secs, self.min_green_secs
            )));
        }
        Ok(())
    }
}

impl Default for PreemptionTiming {
    fn default() -> Self {
        Self { min_green_secs: 20.0, extend_by_secs: 10.0, truncate_to_secs: 0.1 }
    }
}

// ── Controller ────────────────────────────────────────────────────────────────

/// What one [`PreemptionController::tick`] call did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PreemptionReport {
    /// Emergency vehicles seen this tick.
    pub emergency_vehicles: usize,
    /// Intersections marked active this tick.
    pub active:             usize,
    /// Duration writes issued.
    pub writes:             usize,
    /// Record entries dropped because preemption lapsed.
    pub lapsed:             usize,
}

/// Detects emergency vehicles and forces the phase they need.
///
/// Owns its [`AdjustedLights`] record; independent instances (one per
/// corridor, one per test) never share state.
pub struct PreemptionController {
    emergency_type: String,
    classifier:     DirectionClassifier,
    targets:        PhaseTargetTable,
    timing:         PreemptionTiming,
    adjusted:       AdjustedLights,
}

impl PreemptionController {
    pub fn new(
        emergency_type: impl Into<String>,
        classifier:     DirectionClassifier,
        targets:        PhaseTargetTable,
        timing:         PreemptionTiming,
    ) -> ControlResult<Self> {
        let emergency_type = emergency_type.into();
        if emergency_type.trim().is_empty() {
            return Err(ControlError::Config("emergency type tag must not be empty".into()));
        }
        if targets.is_empty() {
            return Err(ControlError::Config("phase target table is empty".into()));
        }
        timing.validate()?;
        Ok(Self {
            emergency_type,
            classifier,
            targets,
            timing,
            adjusted: AdjustedLights::new(),
        })
    }

    /// Validate `config` and build a controller with an empty record.
    pub fn from_config(config: &PreemptionConfig, classifier: &ClassifierConfig) -> ControlResult<Self> {
        Self::new(
            config.emergency_type.clone(),
            DirectionClassifier::new(classifier)?,
            PhaseTargetTable::from_targets(&config.targets)?,
            config.timing(),
        )
    }

    pub fn adjusted(&self) -> &AdjustedLights {
        &self.adjusted
    }

    /// `true` while an emergency override holds `intersection`.
    pub fn is_overriding(&self, intersection: &IntersectionId) -> bool {
        self.adjusted.contains(intersection)
    }

    pub fn timing(&self) -> &PreemptionTiming {
        &self.timing
    }

    /// Run one tick of preemption.
    ///
    /// # Errors
    ///
    /// Only fatal adapter failures; transient ones skip the vehicle.
    pub fn tick<A, S>(&mut self, now: Tick, adapter: &mut A, sink: &mut S) -> ControlResult<PreemptionReport>
    where
        A: TelemetryAdapter + ?Sized,
        S: EventSink,
    {
        let mut report = PreemptionReport::default();
        let mut active: BTreeSet<IntersectionId> = BTreeSet::new();

        for vehicle in adapter.list_vehicles()? {
            let Some(tag) = tolerate(adapter.vehicle_type(&vehicle), now, &vehicle, sink)? else {
                continue;
            };
            if tag != self.emergency_type {
                continue;
            }
            report.emergency_vehicles += 1;

            let Some(segment) = tolerate(adapter.vehicle_road_segment(&vehicle), now, &vehicle, sink)? else {
                continue;
            };
            let direction = self.classifier.classify(segment.as_str());
            if !direction.is_known() {
                debug!(tick = now.0, %vehicle, %segment, "emergency vehicle off the monitored approaches");
                continue;
            }

            let Some(next) = tolerate(adapter.next_signal_for_vehicle(&vehicle), now, &vehicle, sink)? else {
                continue;
            };
            let Some(signal) = next else {
                continue;
            };
            let intersection = signal.intersection;
            let Some(desired) = self.targets.get(&intersection, direction) else {
                continue;
            };
            active.insert(intersection.clone());

            let Some(current) = tolerate(adapter.current_phase(&intersection), now, &intersection, sink)? else {
                continue;
            };
            if self.adjusted.get(&intersection) == Some(desired) {
                continue;
            }

            let Some(before) =
                tolerate(adapter.current_phase_duration(&intersection), now, &intersection, sink)?
            else {
                continue;
            };

            let decision = match PreemptionTiming::override_for(current, desired) {
                Override::Extend => {
                    let after = self.timing.extended_duration(before);
                    if tolerate(adapter.set_phase_duration(&intersection, after), now, &intersection, sink)?
                        .is_none()
                    {
                        continue;
                    }
                    Decision::PreemptionExtended {
                        intersection: intersection.clone(),
                        vehicle,
                        phase:        current,
                        before_secs:  before,
                        after_secs:   after,
                    }
                }
                Override::Truncate => {
                    let after = self.timing.truncate_to_secs;
                    if tolerate(adapter.set_phase_duration(&intersection, after), now, &intersection, sink)?
                        .is_none()
                    {
                        continue;
                    }
                    Decision::PreemptionTruncated {
                        intersection:  intersection.clone(),
                        vehicle,
                        current_phase: current,
                        desired_phase: desired,
                        before_secs:   before,
                        after_secs:    after,
                    }
                }
            };

            self.adjusted.record(intersection, desired);
            report.writes += 1;
            debug!(tick = now.0, kind = decision.kind(), ?decision, "preemption decision");
            sink.emit(ControlEvent { tick: now, decision });
        }

        for (intersection, phase) in self.adjusted.lapse_inactive(&active) {
            info!(tick = now.0, %intersection, %phase, "preemption lapsed, resuming normal operation");
            report.lapsed += 1;
            sink.emit(ControlEvent {
                tick:     now,
                decision: Decision::PreemptionLapsed { intersection, phase },
            });
        }

        report.active = active.len();
        Ok(report)
    }
}
