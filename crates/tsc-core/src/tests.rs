//! Unit tests for tsc-core primitives.

#[cfg(test)]
mod ids {
    use std::collections::HashMap;

    use crate::{IntersectionId, LaneId, PhaseIndex};

    #[test]
    fn display_is_raw_string() {
        assert_eq!(IntersectionId::from("J1").to_string(), "J1");
        assert_eq!(LaneId::new("-E3").as_str(), "-E3");
    }

    #[test]
    fn map_lookup_by_str() {
        let mut m = HashMap::new();
        m.insert(IntersectionId::from("J1"), 3);
        assert_eq!(m.get("J1"), Some(&3));
        assert_eq!(m.get("J2"), None);
    }

    #[test]
    fn ordering_is_lexicographic() {
        assert!(IntersectionId::from("J1") < IntersectionId::from("J2"));
        assert!(PhaseIndex(0) < PhaseIndex(2));
    }

    #[test]
    fn phase_display() {
        assert_eq!(PhaseIndex(2).to_string(), "phase 2");
        assert_eq!(PhaseIndex(2).index(), 2);
    }
}

#[cfg(test)]
mod direction {
    use crate::Direction;

    #[test]
    fn parse_case_insensitive() {
        assert_eq!("ns".parse::<Direction>().unwrap(), Direction::Ns);
        assert_eq!(" EW ".parse::<Direction>().unwrap(), Direction::Ew);
    }

    #[test]
    fn unknown_is_not_parseable() {
        assert!("unknown".parse::<Direction>().is_err());
        assert!("north".parse::<Direction>().is_err());
    }

    #[test]
    fn is_known() {
        assert!(Direction::Ns.is_known());
        assert!(Direction::Ew.is_known());
        assert!(!Direction::Unknown.is_known());
    }
}

#[cfg(test)]
mod time {
    use crate::{RunConfig, SimClock, Tick};

    #[test]
    fn tick_arithmetic() {
        assert_eq!(Tick(5) + 3, Tick(8));
        assert_eq!(Tick(8) - Tick(5), 3);
        assert_eq!(Tick(5).offset(1), Tick(6));
    }

    #[test]
    fn cadence_is_one_based() {
        assert!(!Tick(0).on_cadence(10));
        assert!(!Tick(9).on_cadence(10));
        assert!(Tick(10).on_cadence(10));
        assert!(Tick(20).on_cadence(10));
        assert!(!Tick(10).on_cadence(0));
    }

    #[test]
    fn clock_elapsed_secs() {
        let mut clock = SimClock::new(0.1);
        for _ in 0..25 {
            clock.advance();
        }
        assert_eq!(clock.current_tick, Tick(25));
        assert!((clock.elapsed_secs() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn run_config_validation() {
        assert!(RunConfig::default().validate().is_ok());
        let bad_step = RunConfig { step_length_secs: 0.0, max_ticks: None };
        assert!(bad_step.validate().is_err());
        let zero_budget = RunConfig { step_length_secs: 0.1, max_ticks: Some(0) };
        assert!(zero_budget.validate().is_err());
    }

    #[test]
    fn budget() {
        let cfg = RunConfig { step_length_secs: 0.1, max_ticks: Some(600) };
        assert!(!cfg.budget_exhausted(Tick(599)));
        assert!(cfg.budget_exhausted(Tick(600)));
        assert!(!RunConfig::default().budget_exhausted(Tick(u64::MAX)));
    }
}
