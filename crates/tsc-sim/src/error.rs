use thiserror::Error;
use tsc_control::ControlError;
use tsc_core::CoreError;
use tsc_telemetry::TelemetryError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("control error: {0}")]
    Control(#[from] ControlError),

    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
}

impl SimError {
    /// The adapter failure underneath this error, if there is one.
    pub fn telemetry(&self) -> Option<&TelemetryError> {
        match self {
            SimError::Telemetry(e)                        => Some(e),
            SimError::Control(ControlError::Telemetry(e)) => Some(e),
            _                                             => None,
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
