//! The `TelemetryAdapter` trait: the only way the core touches a simulator.
//!
//! # Pluggability
//!
//! Controllers and the driver are generic over this trait, so a TraCI
//! client, a replay of recorded telemetry, or the in-memory
//! [`MemoryWorld`][crate::MemoryWorld] can sit behind it without touching
//! the decision logic.
//!
//! Every method takes `&mut self`: real adapters talk to the simulator over
//! a socket and every query is a round trip.

use tsc_core::{IntersectionId, LaneId, PhaseIndex, SegmentId, VehicleId};

use crate::{TelemetryResult, UpcomingSignal, VehicleObservation};

/// Per-tick queries over vehicles and traffic lights, plus actuation.
///
/// Errors are classified by [`TelemetryError::is_transient`][crate::TelemetryError::is_transient].
pub trait TelemetryAdapter {
    // ── Vehicles ──────────────────────────────────────────────────────────

    /// Ids of all vehicles in the current tick, in the simulator's
    /// enumeration order.
    fn list_vehicles(&mut self) -> TelemetryResult<Vec<VehicleId>>;

    fn vehicle_type(&mut self, id: &VehicleId) -> TelemetryResult<String>;

    fn vehicle_road_segment(&mut self, id: &VehicleId) -> TelemetryResult<SegmentId>;

    fn vehicle_speed(&mut self, id: &VehicleId) -> TelemetryResult<f64>;

    fn set_vehicle_speed(&mut self, id: &VehicleId, speed: f64) -> TelemetryResult<()>;

    /// The next traffic light along the vehicle's route, if any.
    fn next_signal_for_vehicle(&mut self, id: &VehicleId) -> TelemetryResult<Option<UpcomingSignal>>;

    /// Convenience: gather one vehicle's full observation.
    fn observe_vehicle(&mut self, id: &VehicleId) -> TelemetryResult<VehicleObservation> {
        Ok(VehicleObservation {
            id:       id.clone(),
            type_tag: self.vehicle_type(id)?,
            segment:  self.vehicle_road_segment(id)?,
            speed:    self.vehicle_speed(id)?,
        })
    }

    // ── Traffic lights ────────────────────────────────────────────────────

    fn current_phase(&mut self, intersection: &IntersectionId) -> TelemetryResult<PhaseIndex>;

    /// Duration in seconds of the intersection's current phase.
    fn current_phase_duration(&mut self, intersection: &IntersectionId) -> TelemetryResult<f64>;

    /// Override the duration of the current phase, restarting its timer.
    fn set_phase_duration(&mut self, intersection: &IntersectionId, secs: f64) -> TelemetryResult<()>;

    // ── Detectors ─────────────────────────────────────────────────────────

    /// Number of vehicles on the lane in the last step.
    fn lane_vehicle_count(&mut self, lane: &LaneId) -> TelemetryResult<u32>;

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Advance the simulation by one step.  Blocks until the step is done.
    fn advance_step(&mut self) -> TelemetryResult<()>;

    /// Vehicles still running plus vehicles still due to depart.
    fn remaining_expected_entities(&mut self) -> TelemetryResult<u32>;

    /// Release the simulation connection.
    fn close(&mut self) -> TelemetryResult<()>;
}
