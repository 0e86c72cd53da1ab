//! `tsc-core`: foundational types for the `rust_tsc` signal control framework.
//!
//! This crate is a dependency of every other `tsc-*` crate.  It has no
//! `tsc-*` dependencies and only `thiserror` (plus optional `serde`) from the
//! outside world.
//!
//! # What lives here
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`ids`]         | `VehicleId`, `IntersectionId`, `LaneId`, `SegmentId`, `PhaseIndex` |
//! | [`direction`]   | `Direction` (`Ns`, `Ew`, `Unknown`)                        |
//! | [`time`]        | `Tick`, `SimClock`, `RunConfig`                            |
//! | [`error`]       | `CoreError`, `CoreResult`                                  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod direction;
pub mod error;
pub mod ids;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use direction::Direction;
pub use error::{CoreError, CoreResult};
pub use ids::{IntersectionId, LaneId, PhaseIndex, SegmentId, VehicleId};
pub use time::{RunConfig, SimClock, Tick};
