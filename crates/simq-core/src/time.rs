//! Simulated time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in simulated time, counted in opaque integer units.
///
/// Ordering and equality are by value. [`SimTime::ZERO`] is the initial
/// clock of every queue and [`SimTime::MAX`] is both the default end
/// boundary and the clock value of an ended queue.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SimTime(u64);

impl SimTime {
    /// The earliest representable instant.
    pub const ZERO: SimTime = SimTime(0);

    /// The latest representable instant.
    pub const MAX: SimTime = SimTime(u64::MAX);

    /// Create a time from a raw unit count.
    pub const fn from_units(units: u64) -> Self {
        SimTime(units)
    }

    /// Raw unit count.
    pub const fn as_units(self) -> u64 {
        self.0
    }

    /// One unit later, saturating at [`SimTime::MAX`].
    pub const fn saturating_next(self) -> Self {
        SimTime(self.0.saturating_add(1))
    }

    /// `units` later, saturating at [`SimTime::MAX`].
    pub const fn saturating_add(self, units: u64) -> Self {
        SimTime(self.0.saturating_add(units))
    }

    /// Whether this is the latest sentinel.
    pub const fn is_max(self) -> bool {
        self.0 == u64::MAX
    }
}

impl From<u64> for SimTime {
    fn from(units: u64) -> Self {
        SimTime(units)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_max() {
            write!(f, "t=MAX")
        } else {
            write!(f, "t={}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_bound_everything() {
        let t = SimTime::from_units(42);
        assert!(SimTime::ZERO <= t);
        assert!(t < SimTime::MAX);
        assert_eq!(SimTime::default(), SimTime::ZERO);
    }

    #[test]
    fn test_saturating_next() {
        assert_eq!(SimTime::from_units(5).saturating_next(), SimTime::from_units(6));
        assert_eq!(SimTime::MAX.saturating_next(), SimTime::MAX);
        assert_eq!(SimTime::MAX.saturating_add(10), SimTime::MAX);
    }

    #[test]
    fn test_display() {
        assert_eq!(SimTime::from_units(7).to_string(), "t=7");
        assert_eq!(SimTime::MAX.to_string(), "t=MAX");
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&SimTime::from_units(12)).unwrap();
        assert_eq!(json, "12");
        let back: SimTime = serde_json::from_str("99").unwrap();
        assert_eq!(back, SimTime::from(99));
    }
}
