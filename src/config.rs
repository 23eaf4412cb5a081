use std::time::Duration;

use crate::limits::{DEFAULT_MAX_RECLAIM_SLEEP, DEFAULT_SIGNAL_CAPACITY};

pub const ENV_BOOKING_MODE: &str = "BOOKTREE_BOOKING_MODE";
pub const ENV_MAX_RECLAIM_SLEEP_MS: &str = "BOOKTREE_MAX_RECLAIM_SLEEP_MS";
pub const ENV_SIGNAL_CAPACITY: &str = "BOOKTREE_SIGNAL_CAPACITY";

/// How a booking request combines its conflict check with the insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookingMode {
    /// Check and insert under one exclusive tree guard. At most one of several
    /// concurrent requests can win a given resource for overlapping slots.
    #[default]
    Serialized,
    /// Check under a shared guard, insert under a later exclusive one.
    /// Concurrent requests may both see a resource free and both book it.
    Relaxed,
}

impl BookingMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "serialized" | "strict" => Some(Self::Serialized),
            "relaxed" => Some(Self::Relaxed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Serialized => "serialized",
            Self::Relaxed => "relaxed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub booking_mode: BookingMode,
    /// Longest the reclaim task sleeps before re-checking, even with nothing due.
    pub max_reclaim_sleep: Duration,
    /// Bound of the reclaim wake-up channel.
    pub signal_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            booking_mode: BookingMode::default(),
            max_reclaim_sleep: DEFAULT_MAX_RECLAIM_SLEEP,
            signal_capacity: DEFAULT_SIGNAL_CAPACITY,
        }
    }
}

impl SchedulerConfig {
    /// Read overrides from `BOOKTREE_*` variables; anything missing or
    /// unparsable keeps its default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let booking_mode = get(ENV_BOOKING_MODE)
            .and_then(|s| BookingMode::parse(&s))
            .unwrap_or(defaults.booking_mode);
        let max_reclaim_sleep = get(ENV_MAX_RECLAIM_SLEEP_MS)
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.max_reclaim_sleep);
        let signal_capacity = get(ENV_SIGNAL_CAPACITY)
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.signal_capacity);
        Self {
            booking_mode,
            max_reclaim_sleep,
            signal_capacity,
        }
    }

    pub fn with_booking_mode(mut self, mode: BookingMode) -> Self {
        self.booking_mode = mode;
        self
    }

    pub fn with_max_reclaim_sleep(mut self, sleep: Duration) -> Self {
        self.max_reclaim_sleep = sleep;
        self
    }

    pub fn with_signal_capacity(mut self, capacity: usize) -> Self {
        self.signal_capacity = capacity.max(1);
        self
    }
}
