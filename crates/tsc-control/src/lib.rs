//! `tsc-control`: the per-tick decision policy.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                      |
//! |----------------|---------------------------------------------------------------|
//! | [`classifier`] | `DirectionClassifier`: road segment → `Direction`            |
//! | [`targets`]    | `PhaseTarget`, `PhaseTargetTable`, CSV loader                 |
//! | [`preemption`] | `PreemptionController`, `AdjustedLights`, `PreemptionTiming`  |
//! | [`density`]    | `DensityController`, `DurationTiers`, `DensityTier`           |
//! | [`speed`]      | `SpeedRegulator`, `SpeedBand`                                 |
//! | [`event`]      | `ControlEvent`, `Decision`, `EventSink`, `NoopSink`, `VecSink`|
//! | [`config`]     | `ControlConfig` and its sections (JSON via serde)             |
//! | [`error`]      | `ControlError`, `ControlResult<T>`                            |
//!
//! # Design notes
//!
//! Controllers never talk to each other.  Each takes the adapter and an
//! [`EventSink`] by `&mut` for the duration of one call, reads telemetry,
//! issues actuation commands, and reports every decision as a
//! [`ControlEvent`].  The only state kept across ticks is the
//! [`AdjustedLights`] record, owned by a [`PreemptionController`] instance.
//!
//! Adapter failures are split by
//! [`TelemetryError::is_transient`][tsc_telemetry::TelemetryError::is_transient]:
//! transient failures skip one entity for one tick (and emit
//! [`Decision::EntitySkipped`]); anything else aborts the call with
//! [`ControlError::Telemetry`].

pub mod classifier;
pub mod config;
pub mod density;
pub mod error;
pub mod event;
pub mod preemption;
pub mod speed;
pub mod targets;

mod fault;


pub use classifier::{ClassifierConfig, DirectionClassifier};
pub use config::{ControlConfig, DensityConfig, MonitoredIntersection, PreemptionConfig};
pub use density::{DensityController, DensitySnapshot, DensityTier, DurationTiers};
pub use error::{ControlError, ControlResult};
pub use event::{ControlEvent, Decision, EventSink, NoopSink, VecSink};
pub use preemption::{AdjustedLights, Override, PreemptionController, PreemptionReport, PreemptionTiming};
pub use speed::{SpeedBand, SpeedRegulator};
pub use targets::{PhaseTarget, PhaseTargetTable, load_targets_csv, load_targets_reader};
