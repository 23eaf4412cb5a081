use crate::interval_tree::Entry;
use crate::model::*;

use super::Scheduler;

impl Scheduler {
    /// Every booked `(start, end, resource)` overlapping `[start, end)`.
    pub async fn overlapping(&self, start: Ms, end: Ms) -> Vec<Entry<Ms, ResourceId>> {
        self.shared.tree.read().await.overlapping(start, end)
    }

    /// Bookings held by one resource within `[start, end)`, sorted by start.
    pub async fn resource_schedule(&self, resource_id: &str, start: Ms, end: Ms) -> Vec<TimeSlot> {
        let mut slots: Vec<TimeSlot> = self
            .overlapping(start, end)
            .await
            .into_iter()
            .filter(|entry| entry.payload == resource_id)
            .filter_map(|entry| TimeSlot::new(entry.low, entry.high - entry.low).ok())
            .collect();
        slots.sort_by_key(|s| s.start());
        slots
    }

    /// Registered resources in registration order.
    pub async fn resources(&self) -> Vec<Resource> {
        self.shared.registry.read().await.all()
    }

    pub async fn resource(&self, id: &str) -> Option<Resource> {
        self.shared.registry.read().await.get(id).cloned()
    }

    /// Number of live bookings.
    pub async fn booking_count(&self) -> usize {
        self.shared.tree.read().await.payload_count()
    }

    /// Expiry heap length. Includes entries left behind by cancellations.
    pub async fn pending_expiries(&self) -> usize {
        self.shared.expiries.lock().await.len()
    }

    /// True when nothing is booked.
    pub async fn is_idle(&self) -> bool {
        self.shared.tree.read().await.is_empty()
    }
}
