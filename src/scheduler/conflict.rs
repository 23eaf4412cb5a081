use std::collections::HashSet;

use crate::interval_tree::IntervalTree;
use crate::model::*;

/// Booked intervals, payload = resource id.
pub(crate) type BookingTree = IntervalTree<Ms, ResourceId>;

/// Ids of every resource holding a booking that overlaps `slot`.
///
/// Cost follows the number of overlapping bookings across all resources,
/// which is bounded by the resource count at any single instant.
pub(crate) fn conflicting_resources(tree: &BookingTree, slot: &TimeSlot) -> HashSet<ResourceId> {
    tree.overlapping(slot.start(), slot.end())
        .into_iter()
        .map(|entry| entry.payload)
        .collect()
}

/// First candidate, in the order given, that is not busy.
pub(crate) fn first_free(candidates: Vec<Resource>, busy: &HashSet<ResourceId>) -> Option<Resource> {
    candidates.into_iter().find(|r| !busy.contains(&r.id))
}
