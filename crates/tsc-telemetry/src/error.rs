//! Telemetry error type.

use thiserror::Error;

use tsc_core::{IntersectionId, LaneId, VehicleId};

/// Errors produced by a [`TelemetryAdapter`][crate::TelemetryAdapter].
///
/// Errors split into two classes:
///
/// - **transient**: a single entity could not be queried or commanded this
///   tick (typically a vehicle that left the network mid-tick).  Controllers
///   skip the entity and carry on.
/// - **fatal**: the connection to the simulator is gone.  The run ends.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("vehicle {0} not found")]
    UnknownVehicle(VehicleId),

    #[error("intersection {0} not found")]
    UnknownIntersection(IntersectionId),

    #[error("lane {0} not found")]
    UnknownLane(LaneId),

    #[error("command rejected: {0}")]
    Rejected(String),

    #[error("invalid world: {0}")]
    InvalidWorld(String),

    #[error("simulation connection lost: {0}")]
    Connection(String),

    #[error("simulation connection already closed")]
    Closed,
}

impl TelemetryError {
    /// `true` if the failure only concerns one entity for the current tick.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TelemetryError::UnknownVehicle(_)
                | TelemetryError::UnknownIntersection(_)
                | TelemetryError::UnknownLane(_)
                | TelemetryError::Rejected(_)
        )
    }
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;
