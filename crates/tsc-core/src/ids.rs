//! Strongly typed identifier wrappers.
//!
//! Simulator-side identifiers are strings (`"J1"`, `"-E3"`, `"ambulance.0"`),
//! so every id wraps a `String`.  Wrapping them keeps a lane id from being
//! passed where an intersection id is expected.  All ids are `Ord + Hash` so
//! they can key both `HashMap`s and `BTreeMap`s, and `Borrow<str>` so maps
//! can be queried with a plain `&str`.

use std::borrow::Borrow;
use std::fmt;

/// Generate a typed string id wrapper.
macro_rules! string_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(transparent))]
        $vis struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// A vehicle, unique within a tick and stable while the vehicle exists.
    pub struct VehicleId;
}

string_id! {
    /// A signalised intersection (the simulator's traffic-light id).
    pub struct IntersectionId;
}

string_id! {
    /// A monitored approach lane (or edge) whose queue length is sampled.
    pub struct LaneId;
}

string_id! {
    /// The road segment a vehicle is currently on.
    pub struct SegmentId;
}

/// Index of a phase in an intersection's signal program.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(transparent))]
pub struct PhaseIndex(pub u32);

impl PhaseIndex {
    /// Cast to `usize` for indexing into a phase program.
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PhaseIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "phase {}", self.0)
    }
}
