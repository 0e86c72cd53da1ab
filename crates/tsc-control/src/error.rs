use thiserror::Error;
use tsc_telemetry::TelemetryError;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("control configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("telemetry failure: {0}")]
    Telemetry(#[from] TelemetryError),
}

pub type ControlResult<T> = Result<T, ControlError>;
