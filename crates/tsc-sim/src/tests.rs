//! Integration tests for tsc-sim.

use tsc_control::{
    ControlConfig, ControlEvent, DensityConfig, DensityController, DirectionClassifier,
    DurationTiers, MonitoredIntersection, PhaseTarget, PhaseTargetTable, PreemptionController,
    PreemptionTiming, SpeedBand, SpeedRegulator,
};
use tsc_core::{Direction, IntersectionId, LaneId, PhaseIndex, RunConfig, Tick, VehicleId};
use tsc_telemetry::{
    Command, LightProgram, MemoryWorld, MemoryWorldBuilder, SignalState, UpcomingSignal,
    VehicleObservation, WorldChange,
};

use crate::{
    Arbitration, NoopObserver, RunSummary, SimBuilder, SimError, SimObserver, StopReason,
    TickSummary,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn run_config(max_ticks: Option<u64>) -> RunConfig {
    RunConfig { step_length_secs: 0.5, max_ticks }
}

fn j1() -> IntersectionId {
    IntersectionId::from("J1")
}

fn to_j1() -> Option<UpcomingSignal> {
    Some(UpcomingSignal {
        intersection: j1(),
        link_index:   0,
        distance_m:   80.0,
        state:        SignalState::Red,
    })
}

fn world() -> MemoryWorldBuilder {
    MemoryWorldBuilder::new(0.5)
        .intersection("J1", LightProgram::new(vec![30.0, 3.0, 30.0, 3.0]))
        .lane("-E3")
        .lane("-E1")
        .lane("-E4")
        .lane("-E2")
        .lane("E0")
}

fn preemption() -> PreemptionController {
    let targets = [
        PhaseTarget { intersection: j1(), direction: Direction::Ew, phase: PhaseIndex(0) },
        PhaseTarget { intersection: j1(), direction: Direction::Ns, phase: PhaseIndex(2) },
    ];
    PreemptionController::new(
        "emergency",
        DirectionClassifier::default(),
        PhaseTargetTable::from_targets(&targets).unwrap(),
        PreemptionTiming::default(),
    )
    .unwrap()
}

fn density(interval_ticks: u64) -> DensityController {
    DensityController::from_config(&DensityConfig {
        interval_ticks,
        intersections: vec![MonitoredIntersection {
            id:    j1(),
            lanes: ["-E3", "-E1", "-E4", "-E2", "E0"].into_iter().map(LaneId::from).collect(),
        }],
        tiers: DurationTiers::default(),
    })
    .unwrap()
}

fn speed() -> SpeedRegulator {
    SpeedRegulator::new(SpeedBand::default()).unwrap()
}

fn phase_writes(world: &MemoryWorld) -> Vec<f64> {
    world
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::SetPhaseDuration { secs, .. } => Some(*secs),
            _ => None,
        })
        .collect()
}

/// Records every callback.
#[derive(Default)]
struct Recorder {
    starts:   Vec<Tick>,
    events:   Vec<ControlEvent>,
    ends:     Vec<TickSummary>,
    finished: Vec<RunSummary>,
}

impl Recorder {
    fn kinds(&self) -> Vec<(u64, &'static str)> {
        self.events.iter().map(|e| (e.tick.0, e.decision.kind())).collect()
    }
}

impl SimObserver for Recorder {
    fn on_tick_start(&mut self, tick: Tick) {
        self.starts.push(tick);
    }

    fn on_decision(&mut self, event: &ControlEvent) {
        self.events.push(event.clone());
    }

    fn on_tick_end(&mut self, summary: &TickSummary) {
        self.ends.push(*summary);
    }

    fn on_sim_end(&mut self, summary: &RunSummary) {
        self.finished.push(*summary);
    }
}

// ── SimBuilder validation ─────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;

    #[test]
    fn requires_a_controller() {
        let result = SimBuilder::new(run_config(None), world().build().unwrap()).build();
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn rejects_bad_run_config() {
        let bad = RunConfig { step_length_secs: 0.0, max_ticks: None };
        let result = SimBuilder::new(bad, world().build().unwrap()).speed(speed()).build();
        assert!(matches!(result, Err(SimError::Core(_))));

        let zero_budget = RunConfig { step_length_secs: 0.1, max_ticks: Some(0) };
        assert!(SimBuilder::new(zero_budget, world().build().unwrap()).speed(speed()).build().is_err());
    }

    #[test]
    fn controllers_from_control_config() {
        let controls = ControlConfig::from_json_str(
            r#"{
                "preemption": { "targets": [ { "intersection": "J1", "direction": "EW", "phase": 0 } ] },
                "density": { "intersections": [ { "id": "J1", "lanes": ["E0"] } ] },
                "speed": {}
            }"#,
        )
        .unwrap();
        let sim = SimBuilder::new(run_config(Some(10)), world().build().unwrap())
            .controls(&controls)
            .unwrap()
            .build()
            .unwrap();
        assert!(sim.preemption.is_some());
        assert_eq!(sim.density.as_ref().unwrap().interval_ticks(), 10);
        assert!(sim.speed.is_some());
        assert_eq!(sim.arbitration, Arbitration::Unsynchronized);
        assert_eq!(sim.clock.current_tick, Tick::ZERO);
    }

    #[test]
    fn partial_control_config_keeps_explicit_controllers() {
        let controls = ControlConfig::from_json_str(r#"{ "speed": {} }"#).unwrap();
        let sim = SimBuilder::new(run_config(None), world().build().unwrap())
            .preemption(preemption())
            .controls(&controls)
            .unwrap()
            .build()
            .unwrap();
        assert!(sim.preemption.is_some());
        assert!(sim.density.is_none());
    }
}

// ── Termination and lifecycle ─────────────────────────────────────────────────

#[cfg(test)]
mod lifecycle_tests {
    use super::*;

    #[test]
    fn stops_when_exhausted() {
        let w = world()
            .vehicle(VehicleObservation::new("car", "passenger", "E0", 10.0), None)
            .at(3, WorldChange::Despawn(VehicleId::from("car")))
            .build()
            .unwrap();
        let mut sim = SimBuilder::new(run_config(None), w).speed(speed()).build().unwrap();
        let summary = sim.run(&mut NoopObserver).unwrap();
        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.stop_reason, StopReason::Exhausted);
        assert_eq!(summary.elapsed_secs, 1.5);
        assert!(sim.adapter.is_closed());
    }

    #[test]
    fn stops_at_budget() {
        let w = world()
            .vehicle(VehicleObservation::new("car", "passenger", "E0", 10.0), None)
            .build()
            .unwrap();
        let mut sim = SimBuilder::new(run_config(Some(5)), w).speed(speed()).build().unwrap();
        let summary = sim.run(&mut NoopObserver).unwrap();
        assert_eq!(summary.ticks, 5);
        assert_eq!(summary.stop_reason, StopReason::BudgetReached);
        assert!(sim.adapter.is_closed());
    }

    #[test]
    fn empty_world_runs_zero_ticks() {
        let mut sim = SimBuilder::new(run_config(None), world().build().unwrap())
            .speed(speed())
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        let summary = sim.run(&mut rec).unwrap();
        assert_eq!(summary.ticks, 0);
        assert!(rec.starts.is_empty());
        assert_eq!(rec.finished, [summary]);
        assert!(sim.adapter.is_closed());
    }

    #[test]
    fn pending_spawns_keep_the_loop_alive() {
        let w = world()
            .at(4, WorldChange::Spawn {
                vehicle:     VehicleObservation::new("late", "passenger", "E0", 10.0),
                next_signal: None,
            })
            .at(6, WorldChange::Despawn(VehicleId::from("late")))
            .build()
            .unwrap();
        let mut sim = SimBuilder::new(run_config(None), w).speed(speed()).build().unwrap();
        let mut rec = Recorder::default();
        let summary = sim.run(&mut rec).unwrap();
        assert_eq!(summary.ticks, 6);
        let vehicles: Vec<usize> = rec.ends.iter().map(|s| s.vehicles).collect();
        assert_eq!(vehicles, [0, 0, 0, 1, 1, 0]);
    }

    #[test]
    fn fatal_error_aborts_and_closes() {
        let w = world()
            .vehicle(VehicleObservation::new("car", "passenger", "E0", 10.0), None)
            .at(3, WorldChange::Disconnect)
            .build()
            .unwrap();
        let mut sim = SimBuilder::new(run_config(Some(100)), w).speed(speed()).build().unwrap();
        let mut rec = Recorder::default();
        let err = sim.run(&mut rec).unwrap_err();
        assert!(err.telemetry().is_some_and(|e| !e.is_transient()));
        assert!(sim.adapter.is_closed());
        assert_eq!(rec.ends.len(), 2);
        assert!(rec.finished.is_empty());
    }

    #[test]
    fn run_ticks_leaves_adapter_open() {
        let w = world()
            .vehicle(VehicleObservation::new("car", "passenger", "E0", 10.0), None)
            .build()
            .unwrap();
        let mut sim = SimBuilder::new(run_config(None), w).speed(speed()).build().unwrap();
        sim.run_ticks(4, &mut NoopObserver).unwrap();
        assert_eq!(sim.clock.current_tick, Tick(4));
        assert_eq!(sim.adapter.step(), 4);
        assert!(!sim.adapter.is_closed());
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod observer_tests {
    use super::*;

    #[test]
    fn callbacks_follow_the_tick_loop() {
        let w = world()
            .vehicle(VehicleObservation::new("slow", "passenger", "E0", 3.0), None)
            .build()
            .unwrap();
        let mut sim = SimBuilder::new(run_config(Some(3)), w).speed(speed()).build().unwrap();
        let mut rec = Recorder::default();
        let summary = sim.run(&mut rec).unwrap();

        assert_eq!(rec.starts, [Tick(1), Tick(2), Tick(3)]);
        assert_eq!(rec.kinds(), [(1, "speed_clamped")]);
        let decisions: Vec<usize> = rec.ends.iter().map(|s| s.decisions).collect();
        assert_eq!(decisions, [1, 0, 0]);
        assert_eq!(rec.ends[2].elapsed_secs, 1.5);
        assert_eq!(rec.ends[2].vehicles, 1);
        assert_eq!(summary.decisions, 1);
        assert_eq!(rec.finished.len(), 1);
    }
}

// ── Controller composition ────────────────────────────────────────────────────

#[cfg(test)]
mod composition_tests {
    use super::*;

    fn busy_world() -> MemoryWorld {
        world()
            .vehicle(VehicleObservation::new("amb", "emergency", "-E3", 12.0), to_j1())
            .vehicle(VehicleObservation::new("slow", "passenger", "E0", 3.0), None)
            .build()
            .unwrap()
    }

    #[test]
    fn density_runs_on_its_cadence() {
        let w = world()
            .vehicle(VehicleObservation::new("car", "passenger", "E0", 10.0), None)
            .build()
            .unwrap();
        let mut sim = SimBuilder::new(run_config(Some(25)), w).density(density(10)).build().unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();
        assert_eq!(rec.kinds(), [(10, "density_adjusted"), (20, "density_adjusted")]);
        assert_eq!(phase_writes(&sim.adapter), [15.0, 15.0]);
    }

    #[test]
    fn controllers_run_in_fixed_order() {
        let mut sim = SimBuilder::new(run_config(Some(1)), busy_world())
            .speed(speed())
            .density(density(1))
            .preemption(preemption())
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();
        assert_eq!(
            rec.kinds(),
            [(1, "preemption_extended"), (1, "density_adjusted"), (1, "speed_clamped")]
        );
        // Unsynchronized: the density write lands after the override.
        assert_eq!(phase_writes(&sim.adapter), [40.0, 15.0]);
    }

    #[test]
    fn preemption_precedence_suppresses_density() {
        let mut sim = SimBuilder::new(run_config(Some(1)), busy_world())
            .preemption(preemption())
            .density(density(1))
            .speed(speed())
            .arbitration(Arbitration::PreemptionPrecedence)
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();
        assert_eq!(
            rec.kinds(),
            [(1, "preemption_extended"), (1, "density_suppressed"), (1, "speed_clamped")]
        );
        assert_eq!(phase_writes(&sim.adapter), [40.0]);
    }

    #[test]
    fn density_resumes_after_lapse() {
        let w = world()
            .vehicle(VehicleObservation::new("amb", "emergency", "-E3", 12.0), to_j1())
            .vehicle(VehicleObservation::new("car", "passenger", "E0", 10.0), None)
            .at(2, WorldChange::Despawn(VehicleId::from("amb")))
            .build()
            .unwrap();
        let mut sim = SimBuilder::new(run_config(Some(2)), w)
            .preemption(preemption())
            .density(density(1))
            .arbitration(Arbitration::PreemptionPrecedence)
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();
        assert_eq!(
            rec.kinds(),
            [
                (1, "preemption_extended"),
                (1, "density_suppressed"),
                (2, "preemption_lapsed"),
                (2, "density_adjusted"),
            ]
        );
        assert!(sim.preemption.as_ref().unwrap().adjusted().is_empty());
    }
}
