//! OSC time-tags: 64-bit NTP timestamps used to schedule bundle delivery.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Seconds between the NTP epoch (1900-01-01) and the Unix epoch (1970-01-01).
const UNIX_OFFSET: u64 = 2_208_988_800;

/// A 64-bit NTP timestamp: whole seconds since 1900-01-01 UTC in the high
/// word, a 2³²-scaled fraction of a second in the low word.
///
/// The special value `(0, 1)` means "deliver immediately".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeTag {
    /// Whole seconds since the NTP epoch.
    pub seconds: u32,
    /// Fraction of a second, scaled by 2³².
    pub fraction: u32,
}

impl TimeTag {
    /// The reserved "deliver immediately" tag.
    pub const IMMEDIATE: TimeTag = TimeTag {
        seconds: 0,
        fraction: 1,
    };

    /// The current wall-clock time as a time-tag.
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Converts a wall-clock time to a time-tag.
    ///
    /// Times before the Unix epoch saturate to the epoch.
    pub fn from_system_time(t: SystemTime) -> Self {
        let since_unix = t.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        let seconds = (since_unix.as_secs() + UNIX_OFFSET) as u32;
        let fraction = ((u64::from(since_unix.subsec_nanos()) << 32) / 1_000_000_000) as u32;
        Self { seconds, fraction }
    }

    /// A time-tag `d` in the future of the current wall clock.
    pub fn from_duration_from_now(d: Duration) -> Self {
        Self::from_system_time(SystemTime::now() + d)
    }

    /// Converts back to wall-clock time. Tags before the Unix epoch
    /// saturate to the epoch.
    pub fn to_system_time(self) -> SystemTime {
        let seconds = u64::from(self.seconds).saturating_sub(UNIX_OFFSET);
        let nanos = ((u64::from(self.fraction) * 1_000_000_000) >> 32) as u32;
        UNIX_EPOCH + Duration::new(seconds, nanos)
    }

    /// Whether this is the reserved "immediately" value.
    pub fn is_immediate(self) -> bool {
        self == Self::IMMEDIATE
    }

    /// How long until this tag is due, or `None` when it is immediate or
    /// already in the past.
    pub fn delay_from_now(self) -> Option<Duration> {
        if self.is_immediate() {
            return None;
        }
        self.to_system_time()
            .duration_since(SystemTime::now())
            .ok()
            .filter(|d| !d.is_zero())
    }
}

impl Default for TimeTag {
    fn default() -> Self {
        Self::IMMEDIATE
    }
}

impl fmt::Display for TimeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_immediate() {
            write!(f, "immediate")
        } else {
            write!(f, "{}+{}/2^32", self.seconds, self.fraction)
        }
    }
}
