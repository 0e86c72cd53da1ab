//! Transient-vs-fatal triage for adapter calls.

use std::fmt::Display;

use tracing::warn;

use tsc_core::Tick;
use tsc_telemetry::TelemetryResult;

use crate::{ControlError, ControlEvent, ControlResult, Decision, EventSink};

/// Unwrap an adapter result, downgrading transient failures to a skip.
///
/// `Ok(Some(v))`: the call succeeded.
/// `Ok(None)`: transient failure; an `EntitySkipped` event was emitted and
/// the caller should move on to the next entity.
/// `Err(_)`: fatal; propagate.
pub(crate) fn tolerate<T, S: EventSink>(
    result: TelemetryResult<T>,
    now:    Tick,
    entity: &dyn Display,
    sink:   &mut S,
) -> ControlResult<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_transient() => {
            warn!(tick = now.0, entity = %entity, error = %e, "skipping entity for this tick");
            sink.emit(ControlEvent {
                tick:     now,
                decision: Decision::EntitySkipped {
                    entity: entity.to_string(),
                    reason: e.to_string(),
                },
            });
            Ok(None)
        }
        Err(e) => Err(ControlError::Telemetry(e)),
    }
}
