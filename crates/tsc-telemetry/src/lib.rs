//! `tsc-telemetry`: the boundary between the control core and a simulator.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`adapter`]     | `TelemetryAdapter` trait                                   |
//! | [`observation`] | `UpcomingSignal`, `VehicleObservation`, `Command`          |
//! | [`memory`]      | `MemoryWorld`, `MemoryWorldBuilder`, `WorldChange`         |
//! | [`error`]       | `TelemetryError`, `TelemetryResult<T>`                     |

pub mod adapter;
pub mod error;
pub mod memory;
pub mod observation;

#[cfg(test)]
mod tests;

pub use adapter::TelemetryAdapter;
pub use error::{TelemetryError, TelemetryResult};
pub use memory::{LightProgram, MemoryWorld, MemoryWorldBuilder, WorldChange};
pub use observation::{Command, SignalState, UpcomingSignal, VehicleObservation};
