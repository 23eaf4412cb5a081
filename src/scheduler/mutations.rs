use std::time::Instant;

use tracing::debug;

use crate::config::BookingMode;
use crate::model::*;
use crate::observability::{self, *};
use crate::reclaim::ReclaimSignal;

use super::conflict::{conflicting_resources, first_free};
use super::{Outcome, Scheduler, SchedulerError};

impl Scheduler {
    /// Add a resource, or replace the metadata of an already registered id.
    /// Safe to call while bookings are in flight.
    pub async fn register_resource(&self, resource: Resource) -> Result<(), SchedulerError> {
        let id = resource.id.clone();
        let count = {
            let mut registry = self.shared.registry.write().await;
            registry.register(resource)?;
            registry.len()
        };
        metrics::gauge!(RESOURCES_REGISTERED).set(count as f64);
        debug!("registered resource {id}");
        Ok(())
    }

    /// Book `slot` on the first resource, in registration order, that has no
    /// overlapping booking. `None` if every resource is busy or none exist.
    pub async fn request_booking(&self, slot: TimeSlot) -> Option<Booking> {
        let started = Instant::now();
        let candidates = self.shared.registry.read().await.all();
        let result = if candidates.is_empty() {
            Err(Outcome::NoResources)
        } else {
            self.book_first_free(candidates, slot)
                .await
                .ok_or(Outcome::Conflict)
        };
        self.finish_request(result, slot, started)
    }

    /// Book `slot` on one named resource. `None` if the resource is unknown or
    /// already booked for an overlapping slot.
    pub async fn request_booking_on(&self, resource_id: &str, slot: TimeSlot) -> Option<Booking> {
        let started = Instant::now();
        let resource = self.shared.registry.read().await.get(resource_id).cloned();
        let result = match resource {
            None => Err(Outcome::UnknownResource),
            Some(resource) => self
                .book_first_free(vec![resource], slot)
                .await
                .ok_or(Outcome::Conflict),
        };
        self.finish_request(result, slot, started)
    }

    /// Remove the booking's interval. Returns whether it was still present;
    /// cancelling twice is harmless.
    ///
    /// The expiry heap keeps its entry for the cancelled slot. The reclaim task
    /// pops it later and finds nothing to delete.
    pub async fn cancel_booking(&self, booking: &Booking) -> bool {
        let removed = self.shared.tree.write().await.remove(
            booking.slot.start(),
            booking.slot.end(),
            Some(&booking.resource.id),
        );
        if removed {
            metrics::counter!(CANCELLATIONS_TOTAL).increment(1);
            debug!("cancelled booking {} on {} {}", booking.id, booking.resource.id, booking.slot);
        } else {
            debug!("booking {} already gone", booking.id);
        }
        removed
    }

    /// Conflict check plus insert. Returns the resource that got the slot.
    async fn book_first_free(&self, candidates: Vec<Resource>, slot: TimeSlot) -> Option<Resource> {
        let picked = match self.config().booking_mode {
            BookingMode::Serialized => {
                let mut tree = self.shared.tree.write().await;
                let busy = conflicting_resources(&tree, &slot);
                let free = first_free(candidates, &busy);
                if let Some(ref resource) = free {
                    tree.insert(slot.start(), slot.end(), resource.id.clone());
                }
                free
            }
            BookingMode::Relaxed => {
                let free = {
                    let tree = self.shared.tree.read().await;
                    first_free(candidates, &conflicting_resources(&tree, &slot))
                };
                // Another request can claim the same resource between the two guards.
                if let Some(ref resource) = free {
                    self.shared
                        .tree
                        .write()
                        .await
                        .insert(slot.start(), slot.end(), resource.id.clone());
                }
                free
            }
        };
        if picked.is_some() {
            self.track_expiry(slot.end()).await;
        }
        picked
    }

    /// Push the end time and wake the reclaim task if it now has an earlier
    /// deadline than the one it is sleeping towards.
    async fn track_expiry(&self, end: Ms) {
        let (earliest, pending) = {
            let mut expiries = self.shared.expiries.lock().await;
            (expiries.push(end), expiries.len())
        };
        metrics::gauge!(PENDING_EXPIRIES).set(pending as f64);
        if earliest {
            self.signal(ReclaimSignal::Shortened(end));
        }
    }

    fn finish_request(
        &self,
        result: Result<Resource, Outcome>,
        slot: TimeSlot,
        started: Instant,
    ) -> Option<Booking> {
        let outcome = match result {
            Ok(_) => Outcome::Booked,
            Err(outcome) => outcome,
        };
        let label = observability::outcome_label(outcome);
        metrics::counter!(BOOKING_REQUESTS_TOTAL, "outcome" => label).increment(1);
        metrics::histogram!(BOOKING_DURATION_SECONDS, "outcome" => label)
            .record(started.elapsed().as_secs_f64());

        match result {
            Ok(resource) => {
                let booking = Booking::new(resource, slot);
                debug!("booked {} on {} {}", booking.id, booking.resource.id, slot);
                Some(booking)
            }
            Err(_) => {
                debug!("no booking for {slot}: {label}");
                None
            }
        }
    }
}
