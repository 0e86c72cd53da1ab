//! Scripted traffic around Simpang Lima Keputih (junction `J1`).
//!
//! Five approach edges feed J1.  Vehicles are spawned on an approach with a
//! seeded `SmallRng`, wait at the light for a random dwell, cross onto an
//! internal exit segment, and leave.  Background queues on the approaches
//! surge and ebb so every density tier is visited.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use tsc_core::{IntersectionId, LaneId, SegmentId, VehicleId};
use tsc_telemetry::{
    LightProgram, MemoryWorld, MemoryWorldBuilder, SignalState, TelemetryResult, UpcomingSignal,
    VehicleObservation, WorldChange,
};

/// Approach edges into J1, in density evaluation order.
pub const APPROACHES: [&str; 5] = ["-E3", "-E1", "-E4", "-E2", "E0"];

/// J1's fixed-time program: EW green, yellow, NS green, yellow.
const J1_PROGRAM: [f64; 4] = [30.0, 3.0, 30.0, 3.0];

/// Demand for one scripted run.
#[derive(Clone, Debug)]
pub struct TrafficPlan {
    pub seed:            u64,
    /// Steps during which new vehicles may depart.
    pub horizon_steps:   u64,
    /// Per-step, per-approach spawn probability for ordinary vehicles.
    pub car_rate:        f64,
    /// Steps at which an emergency vehicle departs (approach chosen at random).
    pub emergency_steps: Vec<u64>,
    /// Background queue surge interval; `None` leaves queues empty.
    pub surge_every:     Option<u64>,
}

fn j1_signal(distance_m: f64) -> Option<UpcomingSignal> {
    Some(UpcomingSignal {
        intersection: IntersectionId::from("J1"),
        link_index:   0,
        distance_m,
        state:        SignalState::Red,
    })
}

/// Build the scripted world for `plan` at the given step length.
pub fn build_world(step_length_secs: f64, plan: &TrafficPlan) -> TelemetryResult<MemoryWorld> {
    let mut rng = SmallRng::seed_from_u64(plan.seed);
    let mut builder = MemoryWorldBuilder::new(step_length_secs)
        .intersection("J1", LightProgram::new(J1_PROGRAM.to_vec()));
    for lane in APPROACHES {
        builder = builder.lane(lane);
    }

    let mut next_id = 0u64;
    for step in 1..=plan.horizon_steps {
        for approach in APPROACHES {
            if rng.gen_bool(plan.car_rate) {
                let id = format!("car{next_id}");
                next_id += 1;
                let speed = rng.gen_range(0.5..22.0);
                builder = script_trip(builder, &mut rng, step, &id, "passenger", approach, speed);
            }
        }
        if plan.emergency_steps.contains(&step) {
            let approach = APPROACHES[rng.gen_range(0..APPROACHES.len())];
            let id = format!("ambulance{step}");
            builder = script_trip(builder, &mut rng, step, &id, "emergency", approach, 13.9);
        }
        if plan.surge_every.is_some_and(|every| step.is_multiple_of(every)) {
            for lane in APPROACHES {
                let count = rng.gen_range(0..28);
                builder = builder.at(step, WorldChange::SetQueue { lane: LaneId::from(lane), count });
            }
        }
    }
    builder.build()
}

/// Depart on `approach` at `step`, wait at J1, cross, and leave.
fn script_trip(
    builder:  MemoryWorldBuilder,
    rng:      &mut SmallRng,
    step:     u64,
    id:       &str,
    type_tag: &str,
    approach: &str,
    speed:    f64,
) -> MemoryWorldBuilder {
    let dwell = rng.gen_range(40..400);
    let crossing = rng.gen_range(20..80);
    let vehicle = VehicleId::from(id);

    builder
        .at(step, WorldChange::Spawn {
            vehicle:     VehicleObservation::new(id, type_tag, approach, speed),
            next_signal: j1_signal(rng.gen_range(20.0..200.0)),
        })
        .at(step + dwell, WorldChange::Move {
            vehicle:     vehicle.clone(),
            segment:     SegmentId::from(":J1_exit"),
            next_signal: None,
        })
        .at(step + dwell + crossing, WorldChange::Despawn(vehicle.clone()))
        // Car-following noise while queued.
        .at(step + rng.gen_range(1..dwell), WorldChange::SetSpeed {
            vehicle,
            speed: rng.gen_range(0.0..25.0),
        })
}
