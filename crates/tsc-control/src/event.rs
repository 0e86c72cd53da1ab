//! Structured decision events and the sink they are delivered to.

use serde::Serialize;

use tsc_core::{IntersectionId, LaneId, PhaseIndex, Tick, VehicleId};

use crate::DensityTier;

/// One decision taken (or one state reset) during a tick.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ControlEvent {
    pub tick:     Tick,
    #[serde(flatten)]
    pub decision: Decision,
}

/// What was decided.  Durations are in seconds.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    /// The desired phase is already showing; it was lengthened.
    PreemptionExtended {
        intersection: IntersectionId,
        vehicle:      VehicleId,
        phase:        PhaseIndex,
        before_secs:  f64,
        after_secs:   f64,
    },

    /// A different phase is showing; it was cut short.
    PreemptionTruncated {
        intersection:  IntersectionId,
        vehicle:       VehicleId,
        current_phase: PhaseIndex,
        desired_phase: PhaseIndex,
        before_secs:   f64,
        after_secs:    f64,
    },

    /// No emergency vehicle needs the intersection any more; the override
    /// record was dropped.  No command is sent.
    PreemptionLapsed {
        intersection: IntersectionId,
        phase:        PhaseIndex,
    },

    /// Green duration set from the busiest monitored lane.
    DensityAdjusted {
        intersection: IntersectionId,
        lane:         LaneId,
        vehicles:     u32,
        tier:         DensityTier,
        before_secs:  f64,
        after_secs:   f64,
    },

    /// A density write was withheld because preemption holds the
    /// intersection.
    DensitySuppressed {
        intersection: IntersectionId,
    },

    /// A vehicle's speed was pulled back into the admissible band.
    SpeedClamped {
        vehicle: VehicleId,
        before:  f64,
        after:   f64,
    },

    /// A transient adapter failure; the entity is skipped for this tick.
    EntitySkipped {
        entity: String,
        reason: String,
    },
}

impl Decision {
    /// Stable snake_case name, matching the serialized `kind` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Decision::PreemptionExtended { .. }  => "preemption_extended",
            Decision::PreemptionTruncated { .. } => "preemption_truncated",
            Decision::PreemptionLapsed { .. }    => "preemption_lapsed",
            Decision::DensityAdjusted { .. }     => "density_adjusted",
            Decision::DensitySuppressed { .. }   => "density_suppressed",
            Decision::SpeedClamped { .. }        => "speed_clamped",
            Decision::EntitySkipped { .. }       => "entity_skipped",
        }
    }

    /// The intersection the decision concerns, if any.
    pub fn intersection(&self) -> Option<&IntersectionId> {
        match self {
            Decision::PreemptionExtended { intersection, .. }
            | Decision::PreemptionTruncated { intersection, .. }
            | Decision::PreemptionLapsed { intersection, .. }
            | Decision::DensityAdjusted { intersection, .. }
            | Decision::DensitySuppressed { intersection } => Some(intersection),
            Decision::SpeedClamped { .. } | Decision::EntitySkipped { .. } => None,
        }
    }

    /// `true` if the decision issued an actuation command.
    pub fn is_actuation(&self) -> bool {
        matches!(
            self,
            Decision::PreemptionExtended { .. }
                | Decision::PreemptionTruncated { .. }
                | Decision::DensityAdjusted { .. }
                | Decision::SpeedClamped { .. }
        )
    }
}

/// Receives every [`ControlEvent`] as it is produced.
pub trait EventSink {
    fn emit(&mut self, event: ControlEvent);
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: ControlEvent) {
        (**self).emit(event);
    }
}

/// An [`EventSink`] that discards everything.
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&mut self, _event: ControlEvent) {}
}

/// An [`EventSink`] that collects events in order.
#[derive(Default, Debug)]
pub struct VecSink {
    pub events: Vec<ControlEvent>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events of one kind, in emission order.
    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a ControlEvent> + 'a {
        self.events.iter().filter(move |e| e.decision.kind() == kind)
    }

    pub fn take(&mut self) -> Vec<ControlEvent> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for VecSink {
    fn emit(&mut self, event: ControlEvent) {
        self.events.push(event);
    }
}
