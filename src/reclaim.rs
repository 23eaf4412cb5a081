use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::model::Ms;
use crate::observability::*;
use crate::scheduler::Shared;

/// Min-heap of booking end times, one entry per booking.
///
/// Cancellations do not purge their entry, so the heap may hold end times
/// whose intervals are already gone. Reclaiming one of those is a no-op.
#[derive(Debug, Default)]
pub(crate) struct ExpiryHeap {
    ends: BinaryHeap<Reverse<Ms>>,
}

impl ExpiryHeap {
    /// Returns true if `end` is now the earliest tracked deadline.
    pub(crate) fn push(&mut self, end: Ms) -> bool {
        let earliest = self.peek().is_none_or(|top| end < top);
        self.ends.push(Reverse(end));
        earliest
    }

    pub(crate) fn peek(&self) -> Option<Ms> {
        self.ends.peek().map(|r| r.0)
    }

    pub(crate) fn len(&self) -> usize {
        self.ends.len()
    }

    /// Pop every entry `<= now`. Returns the latest end time popped.
    pub(crate) fn pop_expired(&mut self, now: Ms) -> Option<Ms> {
        let mut horizon = None;
        while let Some(&Reverse(end)) = self.ends.peek() {
            if end > now {
                break;
            }
            self.ends.pop();
            horizon = Some(end);
        }
        horizon
    }
}

/// Wake-ups for the reclaim task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReclaimSignal {
    /// A booking ending at this time became the earliest deadline.
    Shortened(Ms),
    /// Re-evaluate against the clock now.
    Wake,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReclaimState {
    Waiting,
    Draining,
    Stopped,
}

/// Background task that removes bookings once their end time has passed.
///
/// Sleeps until the earliest tracked end time (capped at `max_sleep`), or until
/// a signal arrives. A closed channel counts as `Stop`.
pub(crate) async fn run_reclaimer(
    shared: Arc<Shared>,
    mut signals: mpsc::Receiver<ReclaimSignal>,
    max_sleep: Duration,
) {
    info!("reclaim task started");
    let mut state = ReclaimState::Draining;
    loop {
        state = match state {
            ReclaimState::Draining => {
                reclaim_expired(&shared, shared.clock.now_ms()).await;
                ReclaimState::Waiting
            }
            ReclaimState::Waiting => {
                let timeout = next_wait(&shared, max_sleep).await;
                tokio::select! {
                    biased;
                    signal = signals.recv() => match signal {
                        Some(ReclaimSignal::Shortened(deadline)) => {
                            trace!("reclaim woken early for deadline {deadline}");
                            ReclaimState::Draining
                        }
                        Some(ReclaimSignal::Wake) => ReclaimState::Draining,
                        Some(ReclaimSignal::Stop) | None => ReclaimState::Stopped,
                    },
                    _ = tokio::time::sleep(timeout) => ReclaimState::Draining,
                }
            }
            ReclaimState::Stopped => break,
        };
    }
    info!("reclaim task stopped");
}

/// One drain pass: pop expired heap entries, then delete every interval that
/// ended at or before the latest of them.
///
/// Holds the heap lock across the tree deletions (heap before tree).
pub(crate) async fn reclaim_expired(shared: &Shared, now: Ms) -> usize {
    let started = Instant::now();
    let mut expiries = shared.expiries.lock().await;
    let Some(horizon) = expiries.pop_expired(now) else {
        return 0;
    };

    let removed = {
        let mut tree = shared.tree.write().await;
        let expired = tree.ending_before(horizon);
        for entry in &expired {
            tree.remove(entry.low, entry.high, Some(&entry.payload));
        }
        expired.len()
    };
    metrics::gauge!(PENDING_EXPIRIES).set(expiries.len() as f64);
    drop(expiries);

    metrics::counter!(RECLAIMED_TOTAL).increment(removed as u64);
    metrics::histogram!(RECLAIM_PASS_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
    if removed > 0 {
        debug!("reclaimed {removed} bookings ending at or before {horizon}");
    }
    removed
}

/// Time until the earliest tracked end, bounded by `max_sleep`.
async fn next_wait(shared: &Shared, max_sleep: Duration) -> Duration {
    let now = shared.clock.now_ms();
    match shared.expiries.lock().await.peek() {
        Some(end) => Duration::from_millis(end.saturating_sub(now).max(0) as u64).min(max_sleep),
        None => max_sleep,
    }
}
