//! Per-tick speed band enforcement.

use serde::{Deserialize, Serialize};
use tracing::debug;

use tsc_core::Tick;
use tsc_telemetry::TelemetryAdapter;

use crate::fault::tolerate;
use crate::{ControlError, ControlEvent, ControlResult, Decision, EventSink};

/// Admissible speed band.  Below `lower` a vehicle is bumped to `recovery`;
/// above `upper` it is capped at `upper`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpeedBand {
    pub lower:    f64,
    pub recovery: f64,
    pub upper:    f64,
}

impl Default for SpeedBand {
    fn default() -> Self {
        Self { lower: 5.0, recovery: 10.0, upper: 15.0 }
    }
}

impl SpeedBand {
    /// The speed to command, or `None` if `speed` is already admissible.
    pub fn target(&self, speed: f64) -> Option<f64> {
        if speed < self.lower {
            Some(self.recovery)
        } else if speed > self.upper {
            Some(self.upper)
        } else {
            None
        }
    }

    /// `0 ≤ lower ≤ recovery ≤ upper`, all finite.  Keeping `recovery` inside
    /// the band makes a second pass a no-op.
    pub fn validate(&self) -> ControlResult<()> {
        let finite = [self.lower, self.recovery, self.upper].iter().all(|v| v.is_finite());
        if !finite || self.lower < 0.0 || self.lower > self.recovery || self.recovery > self.upper {
            return Err(ControlError::Config(format!(
                "speed band must satisfy 0 <= lower <= recovery <= upper, got {} / {} / {}",
                self.lower, self.recovery, self.upper
            )));
        }
        Ok(())
    }
}

/// Clamps every vehicle's speed into a [`SpeedBand`].  Stateless.
pub struct SpeedRegulator {
    band: SpeedBand,
}

impl SpeedRegulator {
    pub fn new(band: SpeedBand) -> ControlResult<Self> {
        band.validate()?;
        Ok(Self { band })
    }

    pub fn band(&self) -> &SpeedBand {
        &self.band
    }

    /// Sweep all vehicles once; returns the number of speed writes.
    pub fn regulate<A, S>(&self, now: Tick, adapter: &mut A, sink: &mut S) -> ControlResult<usize>
    where
        A: TelemetryAdapter + ?Sized,
        S: EventSink,
    {
        let mut writes = 0;
        for vehicle in adapter.list_vehicles()? {
            let Some(before) = tolerate(adapter.vehicle_speed(&vehicle), now, &vehicle, sink)? else {
                continue;
            };
            let Some(after) = self.band.target(before) else {
                continue;
            };
            if tolerate(adapter.set_vehicle_speed(&vehicle, after), now, &vehicle, sink)?.is_none() {
                continue;
            }
            writes += 1;
            debug!(tick = now.0, %vehicle, before, after, "speed clamped");
            sink.emit(ControlEvent {
                tick:     now,
                decision: Decision::SpeedClamped { vehicle, before, after },
            });
        }
        Ok(writes)
    }
}
