//! Plain data row types written by output backends.

use tsc_control::{ControlEvent, Decision};

/// One controller decision, flattened for tabular output.
///
/// Columns that do not apply to a decision kind are empty (`None`).
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionRow {
    pub tick:         u64,
    pub elapsed_secs: f64,
    /// Snake-case decision kind, e.g. `preemption_extended`.
    pub kind:         &'static str,
    pub intersection: Option<String>,
    /// The vehicle, lane, or skipped entity the decision was about.
    pub subject:      Option<String>,
    /// Value before the write (phase duration or speed).
    pub before:       Option<f64>,
    /// Value written (phase duration or speed).
    pub after:        Option<f64>,
    /// Free-form context: phases, density status, skip reason.
    pub detail:       Option<String>,
}

impl DecisionRow {
    /// Flatten `event`, stamping it with the simulated time of its tick.
    pub fn from_event(event: &ControlEvent, elapsed_secs: f64) -> Self {
        let mut row = DecisionRow {
            tick: event.tick.0,
            elapsed_secs,
            kind: event.decision.kind(),
            intersection: event.decision.intersection().map(|id| id.to_string()),
            subject: None,
            before: None,
            after: None,
            detail: None,
        };
        match &event.decision {
            Decision::PreemptionExtended { vehicle, phase, before_secs, after_secs, .. } => {
                row.subject = Some(vehicle.to_string());
                row.before = Some(*before_secs);
                row.after = Some(*after_secs);
                row.detail = Some(phase.to_string());
            }
            Decision::PreemptionTruncated {
                vehicle,
                current_phase,
                desired_phase,
                before_secs,
                after_secs,
                ..
            } => {
                row.subject = Some(vehicle.to_string());
                row.before = Some(*before_secs);
                row.after = Some(*after_secs);
                row.detail = Some(format!("{current_phase} -> {desired_phase}"));
            }
            Decision::PreemptionLapsed { phase, .. } => {
                row.detail = Some(phase.to_string());
            }
            Decision::DensityAdjusted { lane, vehicles, tier, before_secs, after_secs, .. } => {
                row.subject = Some(lane.to_string());
                row.before = Some(*before_secs);
                row.after = Some(*after_secs);
                row.detail = Some(format!("{vehicles} vehicles, {tier}"));
            }
            Decision::DensitySuppressed { .. } => {
                row.detail = Some("preemption active".into());
            }
            Decision::SpeedClamped { vehicle, before, after } => {
                row.subject = Some(vehicle.to_string());
                row.before = Some(*before);
                row.after = Some(*after);
            }
            Decision::EntitySkipped { entity, reason } => {
                row.subject = Some(entity.clone());
                row.detail = Some(reason.clone());
            }
        }
        row
    }
}

/// Summary statistics for one simulation tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickSummaryRow {
    pub tick:         u64,
    pub elapsed_secs: f64,
    pub vehicles:     u64,
    pub decisions:    u64,
}
