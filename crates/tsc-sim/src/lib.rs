//! `tsc-sim`: tick loop driver for the rust_tsc framework.
//!
//! # Tick loop
//!
//! ```text
//! loop:
//!   ① Terminate  : remaining_expected_entities == 0   → Exhausted
//!                   tick budget used up                → BudgetReached
//!   ② Step       : adapter.advance_step(); clock.advance()
//!   ③ Preemption : every tick
//!   ④ Density    : when tick % interval_ticks == 0, per Arbitration
//!   ⑤ Speed      : every tick
//!   ⑥ Report     : observer.on_tick_end(TickSummary)
//! close the adapter (on every exit path)
//! ```
//!
//! Every controller event is forwarded to
//! [`SimObserver::on_decision`] as it is emitted.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use tsc_control::ControlConfig;
//! use tsc_core::RunConfig;
//! use tsc_sim::{NoopObserver, SimBuilder};
//!
//! let controls = ControlConfig::from_json_str(json)?;
//! let mut sim = SimBuilder::new(RunConfig::default(), world)
//!     .controls(&controls)?
//!     .build()?;
//! let summary = sim.run(&mut NoopObserver)?;
//! ```

pub mod arbitration;
pub mod builder;
pub mod error;
pub mod observer;
pub mod sim;
pub mod summary;

#[cfg(test)]
mod tests;

pub use arbitration::Arbitration;
pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use sim::SignalSim;
pub use summary::{RunSummary, StopReason, TickSummary};
