//! Unit tests for tsc-telemetry.

use tsc_core::{IntersectionId, LaneId, PhaseIndex, VehicleId};

use crate::{
    Command, LightProgram, MemoryWorld, MemoryWorldBuilder, SignalState, TelemetryAdapter,
    TelemetryError, UpcomingSignal, VehicleObservation, WorldChange,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn signal(tls: &str) -> UpcomingSignal {
    UpcomingSignal {
        intersection: IntersectionId::from(tls),
        link_index:   0,
        distance_m:   80.0,
        state:        SignalState::Red,
    }
}

/// One intersection with a 4-phase program at 1 s per step.
fn world() -> MemoryWorldBuilder {
    MemoryWorldBuilder::new(1.0)
        .intersection("J1", LightProgram::new(vec![3.0, 1.0, 3.0, 1.0]))
        .lane("-E3")
        .lane_with_queue("E0", 4)
}

fn j1() -> IntersectionId {
    IntersectionId::from("J1")
}

// ── Builder ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;

    #[test]
    fn rejects_bad_step_length() {
        assert!(MemoryWorldBuilder::new(0.0).build().is_err());
    }

    #[test]
    fn rejects_empty_program() {
        let r = MemoryWorldBuilder::new(1.0)
            .intersection("J1", LightProgram::new(vec![]))
            .build();
        assert!(matches!(r, Err(TelemetryError::InvalidWorld(_))));
    }

    #[test]
    fn rejects_non_positive_phase() {
        let r = MemoryWorldBuilder::new(1.0)
            .intersection("J1", LightProgram::new(vec![10.0, 0.0]))
            .build();
        assert!(r.is_err());
    }

    #[test]
    fn rejects_vanishing_phase() {
        let r = MemoryWorldBuilder::new(1.0)
            .intersection("J1", LightProgram::new(vec![30.0, 1e-12]))
            .build();
        assert!(matches!(r, Err(TelemetryError::InvalidWorld(_))));
    }

    #[test]
    fn rejects_duplicate_intersection() {
        let r = MemoryWorldBuilder::new(1.0)
            .intersection("J1", LightProgram::new(vec![10.0]))
            .intersection("J1", LightProgram::new(vec![10.0]))
            .build();
        assert!(r.is_err());
    }

    #[test]
    fn rejects_step_zero_script() {
        let r = world().at(0, WorldChange::Disconnect).build();
        assert!(r.is_err());
    }
}

// ── Vehicles ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod vehicle_tests {
    use super::*;

    #[test]
    fn enumeration_follows_insertion_order() {
        let mut w = world()
            .vehicle(VehicleObservation::new("b", "passenger", "E0", 10.0), None)
            .vehicle(VehicleObservation::new("a", "passenger", "E0", 10.0), None)
            .at(1, WorldChange::Spawn {
                vehicle:     VehicleObservation::new("c", "emergency", "-E3", 12.0),
                next_signal: Some(signal("J1")),
            })
            .build()
            .unwrap();
        w.advance_step().unwrap();
        let ids: Vec<_> = w.list_vehicles().unwrap().into_iter().map(|v| v.0).collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }

    #[test]
    fn unknown_vehicle_is_transient() {
        let mut w = world().build().unwrap();
        let err = w.vehicle_speed(&VehicleId::from("ghost")).unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn observe_vehicle_gathers_fields() {
        let mut w = world()
            .vehicle(VehicleObservation::new("v", "passenger", "-E3", 7.5), None)
            .build()
            .unwrap();
        let obs = w.observe_vehicle(&VehicleId::from("v")).unwrap();
        assert_eq!(obs, VehicleObservation::new("v", "passenger", "-E3", 7.5));
    }

    #[test]
    fn move_updates_segment_and_signal() {
        let mut w = world()
            .vehicle(VehicleObservation::new("v", "emergency", "ramp7", 7.5), None)
            .at(2, WorldChange::Move {
                vehicle:     VehicleId::from("v"),
                segment:     "-E3".into(),
                next_signal: Some(signal("J1")),
            })
            .build()
            .unwrap();
        let v = VehicleId::from("v");
        w.advance_step().unwrap();
        assert_eq!(w.next_signal_for_vehicle(&v).unwrap(), None);
        w.advance_step().unwrap();
        assert_eq!(w.vehicle_road_segment(&v).unwrap().as_str(), "-E3");
        assert_eq!(w.next_signal_for_vehicle(&v).unwrap(), Some(signal("J1")));
    }

    #[test]
    fn set_speed_is_logged() {
        let mut w = world()
            .vehicle(VehicleObservation::new("v", "passenger", "E0", 20.0), None)
            .build()
            .unwrap();
        let v = VehicleId::from("v");
        w.set_vehicle_speed(&v, 15.0).unwrap();
        assert_eq!(w.vehicle_speed(&v).unwrap(), 15.0);
        assert_eq!(w.commands(), [Command::SetVehicleSpeed { vehicle: v, speed: 15.0 }]);
    }

    #[test]
    fn negative_speed_rejected() {
        let mut w = world()
            .vehicle(VehicleObservation::new("v", "passenger", "E0", 20.0), None)
            .build()
            .unwrap();
        let err = w.set_vehicle_speed(&VehicleId::from("v"), -1.0).unwrap_err();
        assert!(matches!(err, TelemetryError::Rejected(_)));
        assert!(w.commands().is_empty());
    }

    #[test]
    fn scripted_refusal_rejects_one_command() {
        let mut w = world()
            .vehicle(VehicleObservation::new("v", "passenger", "E0", 20.0), None)
            .at(1, WorldChange::RefuseActuation)
            .at(1, WorldChange::RefuseActuation)
            .build()
            .unwrap();
        let v = VehicleId::from("v");
        w.advance_step().unwrap();

        let err = w.set_vehicle_speed(&v, 15.0).unwrap_err();
        assert!(err.is_transient());
        assert_eq!(w.vehicle_speed(&v).unwrap(), 20.0);
        let err = w.set_phase_duration(&j1(), 10.0).unwrap_err();
        assert!(matches!(err, TelemetryError::Rejected(_)));
        assert!(w.commands().is_empty());

        w.set_vehicle_speed(&v, 15.0).unwrap();
        w.set_phase_duration(&j1(), 10.0).unwrap();
        assert_eq!(w.commands().len(), 2);
    }

    #[test]
    fn refusal_is_not_spent_on_unknown_entities() {
        let mut w = world().at(1, WorldChange::RefuseActuation).build().unwrap();
        w.advance_step().unwrap();
        let err = w.set_phase_duration(&IntersectionId::from("J9"), 10.0).unwrap_err();
        assert!(matches!(err, TelemetryError::UnknownIntersection(_)));
        assert!(w.set_phase_duration(&j1(), 10.0).is_err());
        assert!(w.set_phase_duration(&j1(), 10.0).is_ok());
    }
}

// ── Traffic lights ────────────────────────────────────────────────────────────

#[cfg(test)]
mod light_tests {
    use super::*;

    fn step_n(w: &mut MemoryWorld, n: usize) {
        for _ in 0..n {
            w.advance_step().unwrap();
        }
    }

    #[test]
    fn program_cycles_phases() {
        let mut w = world().build().unwrap();
        assert_eq!(w.current_phase(&j1()).unwrap(), PhaseIndex(0));
        step_n(&mut w, 3);
        assert_eq!(w.current_phase(&j1()).unwrap(), PhaseIndex(1));
        step_n(&mut w, 1);
        assert_eq!(w.current_phase(&j1()).unwrap(), PhaseIndex(2));
        step_n(&mut w, 4);
        assert_eq!(w.current_phase(&j1()).unwrap(), PhaseIndex(0));
    }

    #[test]
    fn set_phase_duration_restarts_timer() {
        let mut w = world().build().unwrap();
        step_n(&mut w, 2);
        w.set_phase_duration(&j1(), 10.0).unwrap();
        assert_eq!(w.current_phase_duration(&j1()).unwrap(), 10.0);
        step_n(&mut w, 9);
        assert_eq!(w.current_phase(&j1()).unwrap(), PhaseIndex(0));
        step_n(&mut w, 1);
        assert_eq!(w.current_phase(&j1()).unwrap(), PhaseIndex(1));
    }

    #[test]
    fn truncation_forces_next_phase() {
        let mut w = world().build().unwrap();
        w.set_phase_duration(&j1(), 0.1).unwrap();
        step_n(&mut w, 1);
        assert_eq!(w.current_phase(&j1()).unwrap(), PhaseIndex(1));
    }

    #[test]
    fn unknown_intersection_is_transient() {
        let mut w = world().build().unwrap();
        let err = w.current_phase(&IntersectionId::from("J9")).unwrap_err();
        assert!(matches!(err, TelemetryError::UnknownIntersection(_)));
        assert!(err.is_transient());
    }
}

// ── Lanes, lifecycle ──────────────────────────────────────────────────────────

#[cfg(test)]
mod lifecycle_tests {
    use super::*;

    #[test]
    fn lane_count_adds_background_and_tracked() {
        let mut w = world()
            .vehicle(VehicleObservation::new("a", "passenger", "E0", 10.0), None)
            .vehicle(VehicleObservation::new("b", "passenger", "E0", 10.0), None)
            .vehicle(VehicleObservation::new("c", "passenger", "-E3", 10.0), None)
            .at(1, WorldChange::SetQueue { lane: LaneId::from("-E3"), count: 7 })
            .build()
            .unwrap();
        assert_eq!(w.lane_vehicle_count(&LaneId::from("E0")).unwrap(), 6);
        assert_eq!(w.lane_vehicle_count(&LaneId::from("-E3")).unwrap(), 1);
        w.advance_step().unwrap();
        assert_eq!(w.lane_vehicle_count(&LaneId::from("-E3")).unwrap(), 8);
    }

    #[test]
    fn lane_count_saturates() {
        let mut w = world()
            .vehicle(VehicleObservation::new("a", "passenger", "-E3", 10.0), None)
            .at(1, WorldChange::SetQueue { lane: LaneId::from("-E3"), count: u32::MAX })
            .build()
            .unwrap();
        w.advance_step().unwrap();
        assert_eq!(w.lane_vehicle_count(&LaneId::from("-E3")).unwrap(), u32::MAX);
    }

    #[test]
    fn unregistered_lane_errors() {
        let mut w = world().build().unwrap();
        let err = w.lane_vehicle_count(&LaneId::from("-E9")).unwrap_err();
        assert!(matches!(err, TelemetryError::UnknownLane(_)));
    }

    #[test]
    fn expected_entities_counts_pending_spawns() {
        let mut w = world()
            .vehicle(VehicleObservation::new("a", "passenger", "E0", 10.0), None)
            .at(2, WorldChange::Spawn {
                vehicle:     VehicleObservation::new("b", "passenger", "E0", 10.0),
                next_signal: None,
            })
            .at(3, WorldChange::Despawn(VehicleId::from("a")))
            .at(4, WorldChange::Despawn(VehicleId::from("b")))
            .build()
            .unwrap();
        assert_eq!(w.remaining_expected_entities().unwrap(), 2);
        w.advance_step().unwrap();
        w.advance_step().unwrap();
        assert_eq!(w.remaining_expected_entities().unwrap(), 2);
        w.advance_step().unwrap();
        assert_eq!(w.remaining_expected_entities().unwrap(), 1);
        w.advance_step().unwrap();
        assert_eq!(w.remaining_expected_entities().unwrap(), 0);
    }

    #[test]
    fn schedule_after_build() {
        let mut w = world().build().unwrap();
        w.schedule(1, WorldChange::Spawn {
            vehicle:     VehicleObservation::new("late", "passenger", "E0", 10.0),
            next_signal: None,
        });
        assert_eq!(w.remaining_expected_entities().unwrap(), 1);
        w.advance_step().unwrap();
        assert_eq!(w.vehicle_count(), 1);
        // Past steps are dropped.
        w.schedule(1, WorldChange::Disconnect);
        assert!(w.advance_step().is_ok());
    }

    #[test]
    fn disconnect_is_fatal() {
        let mut w = world().at(2, WorldChange::Disconnect).build().unwrap();
        w.advance_step().unwrap();
        let err = w.advance_step().unwrap_err();
        assert!(matches!(err, TelemetryError::Connection(_)));
        assert!(!err.is_transient());
        assert!(w.list_vehicles().is_err());
    }

    #[test]
    fn calls_after_close_fail() {
        let mut w = world().build().unwrap();
        w.close().unwrap();
        assert!(w.is_closed());
        assert!(matches!(w.advance_step(), Err(TelemetryError::Closed)));
        // Closing twice is harmless.
        assert!(w.close().is_ok());
    }
}
