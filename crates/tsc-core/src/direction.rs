//! Logical approach directions.

use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// The traffic stream a vehicle belongs to, derived from its road segment.
///
/// `Unknown` is a normal outcome (vehicles away from the monitored
/// intersection), not an error.
///
/// With the `serde` feature, deserialization goes through [`FromStr`], so
/// every configuration format accepts the same spellings.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "String", try_from = "String")
)]
pub enum Direction {
    Ns,
    Ew,
    Unknown,
}

impl Direction {
    /// `true` for `Ns` and `Ew`.
    #[inline]
    pub fn is_known(self) -> bool {
        !matches!(self, Direction::Unknown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ns      => "NS",
            Direction::Ew      => "EW",
            Direction::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = CoreError;

    /// Parses `NS` / `EW` case-insensitively.  `Unknown` never appears in
    /// configuration and is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NS" => Ok(Direction::Ns),
            "EW" => Ok(Direction::Ew),
            other => Err(CoreError::Parse(format!(
                "invalid direction {other:?}: expected \"NS\" or \"EW\""
            ))),
        }
    }
}

impl TryFrom<String> for Direction {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Direction> for String {
    fn from(d: Direction) -> Self {
        d.as_str().to_owned()
    }
}
