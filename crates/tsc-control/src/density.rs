//! Density-tiered green durations.
//!
//! Every `interval_ticks` ticks, each monitored intersection is sampled: the
//! vehicle count on each approach lane is read, the busiest lane picked (the
//! first one wins a tie), and the count mapped to one of four tiers whose
//! duration is written unconditionally.
//!
//! | count n       | tier       | default duration |
//! |---------------|------------|------------------|
//! | n > 20        | `Heavy`    | 50 s             |
//! | 10 < n ≤ 20   | `Moderate` | 40 s             |
//! | 5 < n ≤ 10    | `Normal`   | 30 s             |
//! | n ≤ 5         | `Light`    | 15 s             |

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use tsc_core::{IntersectionId, LaneId, Tick};
use tsc_telemetry::TelemetryAdapter;

use crate::config::{DensityConfig, MonitoredIntersection};
use crate::fault::tolerate;
use crate::{ControlError, ControlEvent, ControlResult, Decision, EventSink};

// ── Tiers ─────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DensityTier {
    Light,
    Normal,
    Moderate,
    Heavy,
}

impl DensityTier {
    /// Human-readable traffic status for this tier.
    pub fn status(self) -> &'static str {
        match self {
            DensityTier::Light    => "light flow",
            DensityTier::Normal   => "normal flow",
            DensityTier::Moderate => "moderate congestion",
            DensityTier::Heavy    => "heavy congestion",
        }
    }
}

impl fmt::Display for DensityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status())
    }
}

/// Tier thresholds (upper bounds, inclusive) and their green durations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DurationTiers {
    pub light_max:     u32,
    pub normal_max:    u32,
    pub moderate_max:  u32,
    pub light_secs:    f64,
    pub normal_secs:   f64,
    pub moderate_secs: f64,
    pub heavy_secs:    f64,
}

impl Default for DurationTiers {
    fn default() -> Self {
        Self {
            light_max:     5,
            normal_max:    10,
            moderate_max:  20,
            light_secs:    15.0,
            normal_secs:   30.0,
            moderate_secs: 40.0,
            heavy_secs:    50.0,
        }
    }
}

impl DurationTiers {
    pub fn tier_for(&self, vehicles: u32) -> DensityTier {
        if vehicles > self.moderate_max {
            DensityTier::Heavy
        } else if vehicles > self.normal_max {
            DensityTier::Moderate
        } else if vehicles > self.light_max {
            DensityTier::Normal
        } else {
            DensityTier::Light
        }
    }

    pub fn duration_of(&self, tier: DensityTier) -> f64 {
        match tier {
            DensityTier::Light    => self.light_secs,
            DensityTier::Normal   => self.normal_secs,
            DensityTier::Moderate => self.moderate_secs,
            DensityTier::Heavy    => self.heavy_secs,
        }
    }

    /// Green duration for a lane holding `vehicles`.
    pub fn duration(&self, vehicles: u32) -> f64 {
        self.duration_of(self.tier_for(vehicles))
    }

    /// Thresholds must strictly increase and durations must be positive and
    /// non-decreasing, so the mapping is a monotone step function.
    pub fn validate(&self) -> ControlResult<()> {
        if !(self.light_max < self.normal_max && self.normal_max < self.moderate_max) {
            return Err(ControlError::Config(format!(
                "tier thresholds must strictly increase: {} < {} < {}",
                self.light_max, self.normal_max, self.moderate_max
            )));
        }
        let durations = [self.light_secs, self.normal_secs, self.moderate_secs, self.heavy_secs];
        if durations.iter().any(|d| !(d.is_finite() && *d > 0.0)) {
            return Err(ControlError::Config("tier durations must be positive".into()));
        }
        if durations.windows(2).any(|w| w[0] > w[1]) {
            return Err(ControlError::Config(format!(
                "tier durations must not decrease: {durations:?}"
            )));
        }
        Ok(())
    }
}

// ── Snapshot ──────────────────────────────────────────────────────────────────

/// Lane counts for one intersection at one instant, in lane order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DensitySnapshot {
    pub intersection: IntersectionId,
    pub lanes:        Vec<(LaneId, u32)>,
}

impl DensitySnapshot {
    /// The lane with the most vehicles; the first such lane on a tie.
    pub fn busiest(&self) -> Option<(&LaneId, u32)> {
        let mut best: Option<(&LaneId, u32)> = None;
        for (lane, count) in &self.lanes {
            if best.is_none_or(|(_, c)| *count > c) {
                best = Some((lane, *count));
            }
        }
        best
    }
}

// ── Controller ────────────────────────────────────────────────────────────────

/// Sets green durations from queue lengths on a fixed tick cadence.
pub struct DensityController {
    interval_ticks: u64,
    intersections:  Vec<MonitoredIntersection>,
    tiers:          DurationTiers,
}

impl DensityController {
    pub fn from_config(config: &DensityConfig) -> ControlResult<Self> {
        config.validate()?;
        Ok(Self {
            interval_ticks: config.interval_ticks,
            intersections:  config.intersections.clone(),
            tiers:          config.tiers.clone(),
        })
    }

    /// `true` on ticks where the controller should run.
    pub fn is_due(&self, now: Tick) -> bool {
        now.on_cadence(self.interval_ticks)
    }

    pub fn interval_ticks(&self) -> u64 {
        self.interval_ticks
    }

    pub fn intersections(&self) -> &[MonitoredIntersection] {
        &self.intersections
    }

    pub fn tiers(&self) -> &DurationTiers {
        &self.tiers
    }

    /// Read every lane of `site`.  Lanes that fail transiently are left out.
    pub fn snapshot<A, S>(
        &self,
        now:     Tick,
        site:    &MonitoredIntersection,
        adapter: &mut A,
        sink:    &mut S,
    ) -> ControlResult<DensitySnapshot>
    where
        A: TelemetryAdapter + ?Sized,
        S: EventSink,
    {
        let mut lanes = Vec::with_capacity(site.lanes.len());
        for lane in &site.lanes {
            if let Some(count) = tolerate(adapter.lane_vehicle_count(lane), now, lane, sink)? {
                lanes.push((lane.clone(), count));
            }
        }
        Ok(DensitySnapshot { intersection: site.id.clone(), lanes })
    }

    /// Sample `site` and write its tiered duration.
    ///
    /// Returns `false` if nothing was written (no lane readable, or an adapter
    /// call failed transiently).
    pub fn evaluate_intersection<A, S>(
        &self,
        now:     Tick,
        site:    &MonitoredIntersection,
        adapter: &mut A,
        sink:    &mut S,
    ) -> ControlResult<bool>
    where
        A: TelemetryAdapter + ?Sized,
        S: EventSink,
    {
        let snapshot = self.snapshot(now, site, adapter, sink)?;
        let Some((lane, vehicles)) = snapshot.busiest() else {
            return Ok(false);
        };
        let tier = self.tiers.tier_for(vehicles);
        let after = self.tiers.duration_of(tier);

        let Some(before) = tolerate(adapter.current_phase_duration(&site.id), now, &site.id, sink)? else {
            return Ok(false);
        };
        if tolerate(adapter.set_phase_duration(&site.id, after), now, &site.id, sink)?.is_none() {
            return Ok(false);
        }

        debug!(
            tick = now.0,
            intersection = %site.id,
            %lane,
            vehicles,
            status = tier.status(),
            before,
            duration = after,
            "density decision"
        );
        sink.emit(ControlEvent {
            tick:     now,
            decision: Decision::DensityAdjusted {
                intersection: site.id.clone(),
                lane:         lane.clone(),
                vehicles,
                tier,
                before_secs:  before,
                after_secs:   after,
            },
        });
        Ok(true)
    }

    /// Evaluate every monitored intersection; returns how many were written.
    pub fn evaluate<A, S>(&self, now: Tick, adapter: &mut A, sink: &mut S) -> ControlResult<usize>
    where
        A: TelemetryAdapter + ?Sized,
        S: EventSink,
    {
        let mut written = 0;
        for site in &self.intersections {
            if self.evaluate_intersection(now, site, adapter, sink)? {
                written += 1;
            }
        }
        Ok(written)
    }
}
