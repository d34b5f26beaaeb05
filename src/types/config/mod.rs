//! Typed configuration values
//!
//! Window, backfill and channel sizes are counts that must never be zero;
//! durations and the refresh rate carry their own validation.

/// Declare a positive `usize` count with a built-in default
///
/// The generated type wraps `NonZeroUsize`, so a zero count cannot be
/// constructed in code or read from a config file. It serializes as a plain
/// integer and exposes the default as `DEFAULT` for const contexts.
macro_rules! count_limit {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident = $default:literal;
    ) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis struct $name(std::num::NonZeroUsize);

        impl $name {
            #[doc = concat!("Default count: ", stringify!($default))]
            pub const DEFAULT: Self = match std::num::NonZeroUsize::new($default) {
                Some(count) => Self(count),
                None => panic!(concat!(stringify!($name), " default must be positive")),
            };

            /// `None` for a zero count
            #[must_use]
            pub const fn new(count: usize) -> Option<Self> {
                match std::num::NonZeroUsize::new(count) {
                    Some(count) => Some(Self(count)),
                    None => None,
                }
            }

            #[must_use]
            #[inline]
            pub const fn get(&self) -> usize {
                self.0.get()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::DEFAULT
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<$name> for usize {
            fn from(count: $name) -> Self {
                count.get()
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_u64(self.get() as u64)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let count = usize::deserialize(deserializer)?;
                Self::new(count).ok_or_else(|| {
                    serde::de::Error::custom(concat!(stringify!($name), " must be at least 1"))
                })
            }
        }
    };
}

pub mod duration;
mod limits;
mod refresh;

pub use duration::{duration_millis_serde, duration_secs_serde};
pub use limits::{BacklogLines, ChannelCapacity, WindowSize};
pub use refresh::RefreshRate;
