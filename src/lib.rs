//! In-memory resource booking: an augmented interval tree of booked time
//! ranges, a scheduler that hands out the first free resource for a slot, and a
//! background task that drops bookings once they have ended.

pub mod clock;
pub mod config;
pub mod interval_tree;
pub mod limits;
pub mod model;
pub mod observability;
mod reclaim;
pub mod scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{BookingMode, SchedulerConfig};
pub use interval_tree::{Entry, IntervalTree};
pub use model::{Booking, Ms, Resource, ResourceId, TimeSlot};
pub use scheduler::{Scheduler, SchedulerError};
