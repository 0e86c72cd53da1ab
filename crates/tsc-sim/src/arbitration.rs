//! How the density controller yields to an active emergency override.

use std::fmt;

/// Policy applied when both preemption and density control the same
/// intersection.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Arbitration {
    /// Both controllers write whenever they decide to; the later write in the
    /// tick wins.
    #[default]
    Unsynchronized,
    /// Density writes are skipped for intersections the preemption controller
    /// is currently overriding, and a `DensitySuppressed` event is emitted in
    /// their place.
    PreemptionPrecedence,
}

impl fmt::Display for Arbitration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Arbitration::Unsynchronized       => "unsynchronized",
            Arbitration::PreemptionPrecedence => "preemption-precedence",
        })
    }
}
