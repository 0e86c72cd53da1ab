//! Plain data types crossing the adapter boundary.

use std::fmt;

use tsc_core::{IntersectionId, SegmentId, VehicleId};

/// Signal aspect shown to a vehicle's link, as reported with the next signal.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SignalState {
    Green,
    Yellow,
    Red,
    Off,
}

impl SignalState {
    /// Map a SUMO-style link state character (`G`, `g`, `y`, `r`, `o`, …).
    pub fn from_char(c: char) -> Self {
        match c {
            'G' | 'g' | 's' => SignalState::Green,
            'y' | 'Y'       => SignalState::Yellow,
            'r' | 'u'       => SignalState::Red,
            _               => SignalState::Off,
        }
    }
}

impl fmt::Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SignalState::Green  => "green",
            SignalState::Yellow => "yellow",
            SignalState::Red    => "red",
            SignalState::Off    => "off",
        };
        f.write_str(s)
    }
}

/// The next traffic light along a vehicle's route.
#[derive(Clone, Debug, PartialEq)]
pub struct UpcomingSignal {
    pub intersection: IntersectionId,
    /// Index of the controlled link the vehicle will use.
    pub link_index:   u32,
    /// Distance to the stop line in metres.
    pub distance_m:   f64,
    pub state:        SignalState,
}

/// Everything the core may know about one vehicle in one tick.
///
/// Never kept across ticks: the next tick re-queries.
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleObservation {
    pub id:       VehicleId,
    /// Vehicle type tag (e.g. `"emergency"`, `"passenger"`).
    pub type_tag: String,
    pub segment:  SegmentId,
    pub speed:    f64,
}

impl VehicleObservation {
    pub fn new(
        id:       impl Into<VehicleId>,
        type_tag: impl Into<String>,
        segment:  impl Into<SegmentId>,
        speed:    f64,
    ) -> Self {
        Self {
            id:       id.into(),
            type_tag: type_tag.into(),
            segment:  segment.into(),
            speed,
        }
    }
}

/// An actuation issued through the adapter, as recorded by
/// [`MemoryWorld`][crate::MemoryWorld].
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    SetPhaseDuration { intersection: IntersectionId, secs: f64 },
    SetVehicleSpeed  { vehicle: VehicleId, speed: f64 },
}
