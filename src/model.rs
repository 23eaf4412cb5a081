use std::fmt;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::limits::*;
use crate::scheduler::SchedulerError;

/// Unix milliseconds — the only time type.
pub type Ms = i64;

/// Opaque, stable resource key. Also the payload stored in the interval tree.
pub type ResourceId = String;

/// A requested time range, `[start, start + duration)`.
///
/// Construction is the only place a slot is validated; everything downstream
/// (the interval tree in particular) relies on `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeSlot {
    start: Ms,
    duration: Ms,
}

impl TimeSlot {
    pub fn new(start: Ms, duration: Ms) -> Result<Self, SchedulerError> {
        if duration <= 0 {
            return Err(SchedulerError::InvalidSlot { start, duration });
        }
        if duration > MAX_SLOT_DURATION_MS {
            return Err(SchedulerError::LimitExceeded("slot too long"));
        }
        let end = start
            .checked_add(duration)
            .ok_or(SchedulerError::LimitExceeded("timestamp out of range"))?;
        if start < MIN_VALID_TIMESTAMP_MS || end > MAX_VALID_TIMESTAMP_MS {
            return Err(SchedulerError::LimitExceeded("timestamp out of range"));
        }
        Ok(Self { start, duration })
    }

    /// Slot starting at `instant`.
    pub fn starting_at(instant: DateTime<Utc>, duration: Duration) -> Result<Self, SchedulerError> {
        Self::new(instant.timestamp_millis(), duration_ms(duration)?)
    }

    /// Slot on a calendar day (UTC) at `hour:minute`.
    pub fn from_calendar(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        duration: Duration,
    ) -> Result<Self, SchedulerError> {
        let start = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .ok_or(SchedulerError::InvalidCalendarDate)?
            .and_utc();
        Self::starting_at(start, duration)
    }

    pub fn start(&self) -> Ms {
        self.start
    }

    pub fn end(&self) -> Ms {
        self.start + self.duration
    }

    pub fn duration_ms(&self) -> Ms {
        self.duration
    }

    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

fn duration_ms(duration: Duration) -> Result<Ms, SchedulerError> {
    Ms::try_from(duration.as_millis()).map_err(|_| SchedulerError::LimitExceeded("slot too long"))
}

fn fmt_instant(f: &mut fmt::Formatter<'_>, ms: Ms) -> fmt::Result {
    match DateTime::<Utc>::from_timestamp_millis(ms) {
        Some(t) => write!(f, "{}", t.to_rfc3339()),
        None => write!(f, "{ms}ms"),
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        fmt_instant(f, self.start)?;
        f.write_str(", ")?;
        fmt_instant(f, self.end())?;
        f.write_str(")")
    }
}

/// A bookable resource. Immutable once registered; re-registering the same
/// id replaces the metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Resource {
    pub id: ResourceId,
    pub name: Option<String>,
    /// Descriptive only; not enforced.
    pub capacity: u32,
}

impl Resource {
    pub fn new(id: impl Into<ResourceId>, capacity: u32) -> Self {
        Self {
            id: id.into(),
            name: None,
            capacity,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Handle returned for a successful booking. The scheduler does not keep it;
/// hold on to it if you want to cancel later.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Booking {
    pub id: Ulid,
    pub resource: Resource,
    pub slot: TimeSlot,
}

impl Booking {
    pub fn new(resource: Resource, slot: TimeSlot) -> Self {
        Self {
            id: Ulid::new(),
            resource,
            slot,
        }
    }

    pub fn resource_id(&self) -> &str {
        &self.resource.id
    }
}
