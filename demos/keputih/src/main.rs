//! keputih: signal control at Simpang Lima Keputih (junction `J1`).
//!
//! Runs the control core against a scripted in-memory world in three
//! configurations:
//!
//! | Variant     | Controllers                  | Step    | Budget     |
//! |-------------|------------------------------|---------|------------|
//! | `emergency` | preemption                   | 0.05 s  | exhaustion |
//! | `adaptive`  | density + speed              | 0.1 s   | 600 ticks  |
//! | `combined`  | all three, preemption first  | 0.1 s   | 600 ticks  |
//!
//! Usage: `keputih [emergency|adaptive|combined|all]` (default `all`).
//! Decision logs land in `output/keputih/<variant>/`.  Set `RUST_LOG=debug`
//! to see every decision as it is taken.

mod world;

use std::path::Path;
use std::time::Instant;

use anyhow::{Result, bail};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tsc_control::{ControlConfig, ControlEvent};
use tsc_core::RunConfig;
use tsc_output::{CsvWriter, DecisionLogObserver, OutputWriter};
use tsc_sim::{Arbitration, RunSummary, SimBuilder, SimObserver, TickSummary};

use world::{TrafficPlan, build_world};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:            u64 = 7;
const PROGRESS_EVERY:  u64 = 100;

const CONTROL_JSON: &str = r#"{
    "classifier": { "ns_tokens": ["e0", "e1"], "ew_tokens": ["e2", "e3", "e4"] },
    "preemption": {
        "emergency_type": "emergency",
        "targets": [
            { "intersection": "J1", "direction": "EW", "phase": 0 },
            { "intersection": "J1", "direction": "NS", "phase": 2 }
        ]
    },
    "density": {
        "interval_ticks": 10,
        "intersections": [ { "id": "J1", "lanes": ["-E3", "-E1", "-E4", "-E2", "E0"] } ]
    },
    "speed": { "lower": 5.0, "recovery": 10.0, "upper": 15.0 }
}"#;

// ── Variants ──────────────────────────────────────────────────────────────────

struct Variant {
    name:        &'static str,
    run:         RunConfig,
    plan:        TrafficPlan,
    controls:    ControlConfig,
    arbitration: Arbitration,
}

fn variants(base: &ControlConfig) -> Vec<Variant> {
    let emergency = ControlConfig {
        density: None,
        speed: None,
        ..base.clone()
    };
    let adaptive = ControlConfig {
        preemption: None,
        ..base.clone()
    };
    vec![
        Variant {
            name:        "emergency",
            run:         RunConfig { step_length_secs: 0.05, max_ticks: None },
            plan:        TrafficPlan {
                seed:            SEED,
                horizon_steps:   1_200,
                car_rate:        0.004,
                emergency_steps: vec![50, 400, 420, 900],
                surge_every:     None,
            },
            controls:    emergency,
            arbitration: Arbitration::Unsynchronized,
        },
        Variant {
            name:        "adaptive",
            run:         RunConfig { step_length_secs: 0.1, max_ticks: Some(600) },
            plan:        TrafficPlan {
                seed:            SEED + 1,
                horizon_steps:   600,
                car_rate:        0.02,
                emergency_steps: vec![],
                surge_every:     Some(60),
            },
            controls:    adaptive,
            arbitration: Arbitration::Unsynchronized,
        },
        Variant {
            name:        "combined",
            run:         RunConfig { step_length_secs: 0.1, max_ticks: Some(600) },
            plan:        TrafficPlan {
                seed:            SEED + 2,
                horizon_steps:   600,
                car_rate:        0.02,
                emergency_steps: vec![100, 350],
                surge_every:     Some(60),
            },
            controls:    base.clone(),
            arbitration: Arbitration::PreemptionPrecedence,
        },
    ]
}

// ── Observer wrapper: progress and per-kind counts ────────────────────────────

struct ProgressObserver<W: OutputWriter> {
    inner:  DecisionLogObserver<W>,
    counts: std::collections::BTreeMap<&'static str, usize>,
}

impl<W: OutputWriter> ProgressObserver<W> {
    fn new(inner: DecisionLogObserver<W>) -> Self {
        Self { inner, counts: Default::default() }
    }
}

impl<W: OutputWriter> SimObserver for ProgressObserver<W> {
    fn on_decision(&mut self, event: &ControlEvent) {
        *self.counts.entry(event.decision.kind()).or_default() += 1;
        self.inner.on_decision(event);
    }

    fn on_tick_end(&mut self, summary: &TickSummary) {
        if summary.tick.0.is_multiple_of(PROGRESS_EVERY) {
            info!(
                sim_time_secs = summary.elapsed_secs,
                active_vehicles = summary.vehicles,
                "progress"
            );
        }
        self.inner.on_tick_end(summary);
    }

    fn on_sim_end(&mut self, summary: &RunSummary) {
        self.inner.on_sim_end(summary);
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn run_variant(variant: Variant) -> Result<()> {
    println!("--- {} ---", variant.name);

    let world = build_world(variant.run.step_length_secs, &variant.plan)?;
    let mut sim = SimBuilder::new(variant.run.clone(), world)
        .controls(&variant.controls)?
        .arbitration(variant.arbitration)
        .build()?;

    let dir = Path::new("output/keputih").join(variant.name);
    std::fs::create_dir_all(&dir)?;
    let writer = CsvWriter::new(&dir)?;
    let mut obs = ProgressObserver::new(DecisionLogObserver::new(writer, &variant.run));

    let t0 = Instant::now();
    let result = sim.run(&mut obs);
    if result.is_err() {
        // on_sim_end is skipped on error; keep what was logged.
        obs.inner.finish()?;
    }
    let summary = result?;

    if let Some(e) = obs.inner.take_error() {
        eprintln!("output error: {e}");
    }

    println!(
        "{} ticks ({:.1} s simulated) in {:.3} s wall, {}",
        summary.ticks,
        summary.elapsed_secs,
        t0.elapsed().as_secs_f64(),
        summary.stop_reason
    );
    println!("{:<22} {:>8}", "decision", "count");
    println!("{}", "-".repeat(31));
    for (kind, count) in &obs.counts {
        println!("{kind:<22} {count:>8}");
    }
    println!("logs: {}", dir.display());
    println!();
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let selected = std::env::args().nth(1).unwrap_or_else(|| "all".into());
    let base = ControlConfig::from_json_str(CONTROL_JSON)?;

    println!("=== keputih: rust_tsc signal control ===");
    println!();

    let mut ran = 0;
    for variant in variants(&base) {
        if selected == "all" || selected == variant.name {
            run_variant(variant)?;
            ran += 1;
        }
    }
    if ran == 0 {
        bail!("unknown variant {selected:?}; expected emergency, adaptive, combined, or all");
    }
    Ok(())
}
