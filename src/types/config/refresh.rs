//! Dashboard refresh cadence

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// How often the dashboard re-reads statistics
///
/// Always within `MIN..=MAX`; out-of-range inputs are clamped rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefreshRate(Duration);

impl RefreshRate {
    pub const MIN: Duration = Duration::from_millis(100);
    pub const MAX: Duration = Duration::from_secs(10);
    /// Upper bound reachable with the slow-down key
    pub const INTERACTIVE_MAX: Duration = Duration::from_secs(5);
    /// Step applied by the speed keys
    pub const STEP: Duration = Duration::from_millis(100);
    pub const DEFAULT: Self = Self(Duration::from_secs(1));

    /// Create a refresh rate, clamping into the supported range
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self(interval.clamp(Self::MIN, Self::MAX))
    }

    #[must_use]
    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    #[must_use]
    #[inline]
    pub const fn get(&self) -> Duration {
        self.0
    }

    /// Refresh more often by one step
    #[must_use]
    pub fn faster(self) -> Self {
        if self.0 > Self::MIN {
            Self::new(self.0.saturating_sub(Self::STEP))
        } else {
            self
        }
    }

    /// Refresh less often by one step, up to [`Self::INTERACTIVE_MAX`]
    #[must_use]
    pub fn slower(self) -> Self {
        if self.0 < Self::INTERACTIVE_MAX {
            Self::new(self.0 + Self::STEP)
        } else {
            self
        }
    }
}

impl Default for RefreshRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for RefreshRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0.as_millis())
    }
}

impl Serialize for RefreshRate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(self.0.as_millis()).unwrap_or(u64::MAX))
    }
}

impl<'de> Deserialize<'de> for RefreshRate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Self::from_millis(millis))
    }
}
