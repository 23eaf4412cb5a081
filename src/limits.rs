use std::time::Duration;

use crate::model::Ms;

pub const MAX_RESOURCES: usize = 10_000;
pub const MAX_RESOURCE_ID_LEN: usize = 256;
pub const MAX_NAME_LEN: usize = 1024;

/// 1970-01-01T00:00:00Z
pub const MIN_VALID_TIMESTAMP_MS: Ms = 0;
/// 10000-01-01T00:00:00Z
pub const MAX_VALID_TIMESTAMP_MS: Ms = 253_402_300_800_000;
/// One leap year.
pub const MAX_SLOT_DURATION_MS: Ms = 366 * 24 * 3_600_000;

/// Upper bound on how long the reclaim task sleeps with nothing due.
pub const DEFAULT_MAX_RECLAIM_SLEEP: Duration = Duration::from_secs(3600);
pub const DEFAULT_SIGNAL_CAPACITY: usize = 64;
