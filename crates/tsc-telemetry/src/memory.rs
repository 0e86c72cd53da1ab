//! `MemoryWorld`: an in-process, scripted stand-in for the simulator.
//!
//! This is not a traffic model.  Vehicles do not move on their own; every
//! change to the world is scripted ahead of time as a [`WorldChange`] keyed by
//! the step at which it happens (a `BTreeMap<step, Vec<WorldChange>>`, drained
//! one step at a time).  What the world *does* simulate is the part the
//! control core interacts with:
//!
//! - fixed-time signal programs that roll over to the next phase when the
//!   current phase's remaining time runs out, honouring duration overrides;
//! - lane counts (vehicles whose segment id equals the lane id, plus a
//!   scripted background queue);
//! - the "expected entities" counter (live vehicles + scripted spawns not yet
//!   applied);
//! - a log of every actuation command, so tests can assert on exact writes;
//! - scripted refusals of actuation commands, to exercise the transient
//!   error path.
//!
//! Vehicles are enumerated in insertion order, which makes multi-vehicle
//! tie-breaks deterministic.

use std::collections::BTreeMap;

use tracing::debug;

use tsc_core::{IntersectionId, LaneId, PhaseIndex, SegmentId, VehicleId};

use crate::{
    Command, TelemetryAdapter, TelemetryError, TelemetryResult, UpcomingSignal, VehicleObservation,
};

/// Remaining phase time at or below this is treated as expired.
const PHASE_EPSILON: f64 = 1e-9;

// ── Scripted changes ──────────────────────────────────────────────────────────

/// A fixed-time signal program: one duration (seconds) per phase.
#[derive(Clone, Debug, PartialEq)]
pub struct LightProgram {
    pub phase_durations: Vec<f64>,
}

impl LightProgram {
    pub fn new(phase_durations: Vec<f64>) -> Self {
        Self { phase_durations }
    }
}

/// One scripted change to the world, applied at the start of a step.
#[derive(Clone, Debug, PartialEq)]
pub enum WorldChange {
    /// A vehicle departs and joins the end of the enumeration order.
    Spawn {
        vehicle:     VehicleObservation,
        next_signal: Option<UpcomingSignal>,
    },
    /// A vehicle leaves the network.
    Despawn(VehicleId),
    /// A vehicle moves onto `segment`, now approaching `next_signal`.
    Move {
        vehicle:     VehicleId,
        segment:     SegmentId,
        next_signal: Option<UpcomingSignal>,
    },
    /// The simulator changes a vehicle's speed (car-following, braking, …).
    SetSpeed { vehicle: VehicleId, speed: f64 },
    /// Background queue on a lane, on top of vehicles tracked individually.
    SetQueue { lane: LaneId, count: u32 },
    /// The next actuation command (phase duration or speed) is rejected.
    RefuseActuation,
    /// The connection drops; every later call fails.
    Disconnect,
}

// ── Internal state ────────────────────────────────────────────────────────────

struct VehicleEntry {
    observation: VehicleObservation,
    next_signal: Option<UpcomingSignal>,
}

struct LightState {
    program:        Vec<f64>,
    phase:          usize,
    phase_duration: f64,
    remaining:      f64,
}

impl LightState {
    fn new(program: Vec<f64>) -> Self {
        let first = program[0];
        Self { program, phase: 0, phase_duration: first, remaining: first }
    }

    fn elapse(&mut self, dt: f64) {
        self.remaining -= dt;
        while self.remaining <= PHASE_EPSILON {
            self.phase = (self.phase + 1) % self.program.len();
            self.phase_duration = self.program[self.phase];
            self.remaining += self.phase_duration;
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Connection {
    Open,
    Lost,
    Closed,
}

// ── MemoryWorld ───────────────────────────────────────────────────────────────

/// A scripted [`TelemetryAdapter`].  Build with [`MemoryWorldBuilder`].
pub struct MemoryWorld {
    step:             u64,
    step_length_secs: f64,
    vehicles:         Vec<VehicleEntry>,
    lights:           BTreeMap<IntersectionId, LightState>,
    queues:           BTreeMap<LaneId, u32>,
    script:           BTreeMap<u64, Vec<WorldChange>>,
    pending_spawns:   usize,
    commands:         Vec<Command>,
    refusals:         u32,
    connection:       Connection,
}

impl MemoryWorld {
    /// Steps taken so far.
    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    /// Every actuation command issued so far, in order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Drain the command log.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// Seconds left in the intersection's current phase.
    pub fn phase_remaining(&self, intersection: &IntersectionId) -> Option<f64> {
        self.lights.get(intersection).map(|l| l.remaining)
    }

    pub fn is_closed(&self) -> bool {
        self.connection == Connection::Closed
    }

    /// Schedule a change after the world has been built.
    ///
    /// `step` must be in the future; changes for past steps are dropped.
    pub fn schedule(&mut self, step: u64, change: WorldChange) {
        if step <= self.step {
            debug!(step, now = self.step, "dropping change scheduled in the past");
            return;
        }
        if matches!(change, WorldChange::Spawn { .. }) {
            self.pending_spawns += 1;
        }
        self.script.entry(step).or_default().push(change);
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    fn ensure_open(&self) -> TelemetryResult<()> {
        match self.connection {
            Connection::Open   => Ok(()),
            Connection::Lost   => Err(TelemetryError::Connection(format!(
                "peer went away at step {}",
                self.step
            ))),
            Connection::Closed => Err(TelemetryError::Closed),
        }
    }

    fn vehicle(&self, id: &VehicleId) -> TelemetryResult<&VehicleEntry> {
        self.vehicles
            .iter()
            .find(|v| &v.observation.id == id)
            .ok_or_else(|| TelemetryError::UnknownVehicle(id.clone()))
    }

    fn vehicle_mut(&mut self, id: &VehicleId) -> TelemetryResult<&mut VehicleEntry> {
        self.vehicles
            .iter_mut()
            .find(|v| &v.observation.id == id)
            .ok_or_else(|| TelemetryError::UnknownVehicle(id.clone()))
    }

    /// Consume one scripted refusal, if any is pending.
    fn refuse(&mut self, command: impl FnOnce() -> String) -> TelemetryResult<()> {
        if self.refusals == 0 {
            return Ok(());
        }
        self.refusals -= 1;
        Err(TelemetryError::Rejected(command()))
    }

    fn light(&self, id: &IntersectionId) -> TelemetryResult<&LightState> {
        self.lights
            .get(id)
            .ok_or_else(|| TelemetryError::UnknownIntersection(id.clone()))
    }

    fn apply(&mut self, change: WorldChange) {
        match change {
            WorldChange::Spawn { vehicle, next_signal } => {
                self.pending_spawns = self.pending_spawns.saturating_sub(1);
                if self.vehicle(&vehicle.id).is_ok() {
                    debug!(vehicle = %vehicle.id, "duplicate spawn ignored");
                    return;
                }
                self.vehicles.push(VehicleEntry { observation: vehicle, next_signal });
            }
            WorldChange::Despawn(id) => {
                self.vehicles.retain(|v| v.observation.id != id);
            }
            WorldChange::Move { vehicle, segment, next_signal } => {
                match self.vehicle_mut(&vehicle) {
                    Ok(entry) => {
                        entry.observation.segment = segment;
                        entry.next_signal = next_signal;
                    }
                    Err(_) => debug!(%vehicle, "move for absent vehicle ignored"),
                }
            }
            WorldChange::SetSpeed { vehicle, speed } => {
                match self.vehicle_mut(&vehicle) {
                    Ok(entry) => entry.observation.speed = speed,
                    Err(_) => debug!(%vehicle, "speed change for absent vehicle ignored"),
                }
            }
            WorldChange::SetQueue { lane, count } => {
                self.queues.insert(lane, count);
            }
            WorldChange::RefuseActuation => {
                self.refusals = self.refusals.saturating_add(1);
            }
            WorldChange::Disconnect => {
                self.connection = Connection::Lost;
            }
        }
    }
}

impl TelemetryAdapter for MemoryWorld {
    fn list_vehicles(&mut self) -> TelemetryResult<Vec<VehicleId>> {
        self.ensure_open()?;
        Ok(self.vehicles.iter().map(|v| v.observation.id.clone()).collect())
    }

    fn vehicle_type(&mut self, id: &VehicleId) -> TelemetryResult<String> {
        self.ensure_open()?;
        Ok(self.vehicle(id)?.observation.type_tag.clone())
    }

    fn vehicle_road_segment(&mut self, id: &VehicleId) -> TelemetryResult<SegmentId> {
        self.ensure_open()?;
        Ok(self.vehicle(id)?.observation.segment.clone())
    }

    fn vehicle_speed(&mut self, id: &VehicleId) -> TelemetryResult<f64> {
        self.ensure_open()?;
        Ok(self.vehicle(id)?.observation.speed)
    }

    fn set_vehicle_speed(&mut self, id: &VehicleId, speed: f64) -> TelemetryResult<()> {
        self.ensure_open()?;
        if !(speed.is_finite() && speed >= 0.0) {
            return Err(TelemetryError::Rejected(format!("speed {speed} for {id}")));
        }
        self.vehicle(id)?;
        self.refuse(|| format!("speed {speed} for {id} refused"))?;
        self.vehicle_mut(id)?.observation.speed = speed;
        self.commands.push(Command::SetVehicleSpeed { vehicle: id.clone(), speed });
        Ok(())
    }

    fn next_signal_for_vehicle(&mut self, id: &VehicleId) -> TelemetryResult<Option<UpcomingSignal>> {
        self.ensure_open()?;
        Ok(self.vehicle(id)?.next_signal.clone())
    }

    fn current_phase(&mut self, intersection: &IntersectionId) -> TelemetryResult<PhaseIndex> {
        self.ensure_open()?;
        let phase = self.light(intersection)?.phase;
        Ok(PhaseIndex(u32::try_from(phase).unwrap_or(u32::MAX)))
    }

    fn current_phase_duration(&mut self, intersection: &IntersectionId) -> TelemetryResult<f64> {
        self.ensure_open()?;
        Ok(self.light(intersection)?.phase_duration)
    }

    fn set_phase_duration(&mut self, intersection: &IntersectionId, secs: f64) -> TelemetryResult<()> {
        self.ensure_open()?;
        if !(secs.is_finite() && secs >= 0.0) {
            return Err(TelemetryError::Rejected(format!(
                "phase duration {secs} for {intersection}"
            )));
        }
        self.light(intersection)?;
        self.refuse(|| format!("phase duration {secs} for {intersection} refused"))?;
        let light = self
            .lights
            .get_mut(intersection)
            .ok_or_else(|| TelemetryError::UnknownIntersection(intersection.clone()))?;
        light.phase_duration = secs;
        light.remaining = secs;
        self.commands.push(Command::SetPhaseDuration {
            intersection: intersection.clone(),
            secs,
        });
        Ok(())
    }

    fn lane_vehicle_count(&mut self, lane: &LaneId) -> TelemetryResult<u32> {
        self.ensure_open()?;
        let background = *self
            .queues
            .get(lane)
            .ok_or_else(|| TelemetryError::UnknownLane(lane.clone()))?;
        let tracked = self
            .vehicles
            .iter()
            .filter(|v| v.observation.segment.as_str() == lane.as_str())
            .count();
        Ok(background.saturating_add(u32::try_from(tracked).unwrap_or(u32::MAX)))
    }

    fn advance_step(&mut self) -> TelemetryResult<()> {
        self.ensure_open()?;
        self.step += 1;

        if let Some(changes) = self.script.remove(&self.step) {
            for change in changes {
                self.apply(change);
            }
        }
        // A scripted disconnect fails the step that hit it.
        self.ensure_open()?;

        let dt = self.step_length_secs;
        for light in self.lights.values_mut() {
            light.elapse(dt);
        }
        Ok(())
    }

    fn remaining_expected_entities(&mut self) -> TelemetryResult<u32> {
        self.ensure_open()?;
        let expected = self.vehicles.len().saturating_add(self.pending_spawns);
        Ok(u32::try_from(expected).unwrap_or(u32::MAX))
    }

    fn close(&mut self) -> TelemetryResult<()> {
        self.connection = Connection::Closed;
        Ok(())
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Fluent builder for [`MemoryWorld`].
///
/// # Example
///
/// ```rust,ignore
/// let world = MemoryWorldBuilder::new(0.1)
///     .intersection("J1", LightProgram::new(vec![30.0, 3.0, 30.0, 3.0]))
///     .lane("-E3")
///     .vehicle(VehicleObservation::new("amb0", "emergency", "-E3", 12.0), Some(signal))
///     .at(40, WorldChange::Despawn("amb0".into()))
///     .build()?;
/// ```
pub struct MemoryWorldBuilder {
    step_length_secs: f64,
    lights:           Vec<(IntersectionId, LightProgram)>,
    lanes:            Vec<(LaneId, u32)>,
    vehicles:         Vec<(VehicleObservation, Option<UpcomingSignal>)>,
    script:           BTreeMap<u64, Vec<WorldChange>>,
}

impl MemoryWorldBuilder {
    pub fn new(step_length_secs: f64) -> Self {
        Self {
            step_length_secs,
            lights:   Vec::new(),
            lanes:    Vec::new(),
            vehicles: Vec::new(),
            script:   BTreeMap::new(),
        }
    }

    /// Add a signalised intersection running `program` from phase 0.
    pub fn intersection(mut self, id: impl Into<IntersectionId>, program: LightProgram) -> Self {
        self.lights.push((id.into(), program));
        self
    }

    /// Register a monitored lane with an empty background queue.
    pub fn lane(self, id: impl Into<LaneId>) -> Self {
        self.lane_with_queue(id, 0)
    }

    /// Register a monitored lane with an initial background queue.
    pub fn lane_with_queue(mut self, id: impl Into<LaneId>, count: u32) -> Self {
        self.lanes.push((id.into(), count));
        self
    }

    /// A vehicle already on the network before the first step.
    pub fn vehicle(mut self, vehicle: VehicleObservation, next_signal: Option<UpcomingSignal>) -> Self {
        self.vehicles.push((vehicle, next_signal));
        self
    }

    /// Script `change` to happen at the start of step `step` (1-based).
    pub fn at(mut self, step: u64, change: WorldChange) -> Self {
        self.script.entry(step).or_default().push(change);
        self
    }

    /// Validate inputs and return a ready world at step 0.
    pub fn build(self) -> TelemetryResult<MemoryWorld> {
        if !(self.step_length_secs.is_finite() && self.step_length_secs > 0.0) {
            return Err(TelemetryError::InvalidWorld(format!(
                "step length must be positive, got {}",
                self.step_length_secs
            )));
        }
        if self.script.contains_key(&0) {
            return Err(TelemetryError::InvalidWorld(
                "scripted changes start at step 1; use .vehicle() for the initial state".into(),
            ));
        }

        let mut lights = BTreeMap::new();
        for (id, program) in self.lights {
            if program.phase_durations.is_empty() {
                return Err(TelemetryError::InvalidWorld(format!("{id}: empty signal program")));
            }
            if program.phase_durations.iter().any(|d| !(d.is_finite() && *d > PHASE_EPSILON)) {
                return Err(TelemetryError::InvalidWorld(format!(
                    "{id}: phase durations must be above {PHASE_EPSILON} s"
                )));
            }
            if lights.insert(id.clone(), LightState::new(program.phase_durations)).is_some() {
                return Err(TelemetryError::InvalidWorld(format!("{id}: duplicate intersection")));
            }
        }

        let pending_spawns = self
            .script
            .values()
            .flatten()
            .filter(|c| matches!(c, WorldChange::Spawn { .. }))
            .count();

        Ok(MemoryWorld {
            step: 0,
            step_length_secs: self.step_length_secs,
            vehicles: self
                .vehicles
                .into_iter()
                .map(|(observation, next_signal)| VehicleEntry { observation, next_signal })
                .collect(),
            lights,
            queues: self.lanes.into_iter().collect(),
            script: self.script,
            pending_spawns,
            commands: Vec::new(),
            refusals: 0,
            connection: Connection::Open,
        })
    }
}
