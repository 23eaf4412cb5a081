mod conflict;
mod error;
mod mutations;
mod queries;
mod registry;

pub use error::SchedulerError;
pub use registry::ResourceRegistry;

pub(crate) use conflict::BookingTree;

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::SchedulerConfig;
use crate::reclaim::{self, ExpiryHeap, ReclaimSignal};

/// How a booking request ended. Only `Booked` yields a booking; the rest are
/// all `None` to the caller and only differ in metrics and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Booked,
    Conflict,
    UnknownResource,
    NoResources,
}

/// State shared between the scheduler facade and its reclaim task.
///
/// Lock order: `registry` before `tree`; `expiries` before `tree`. The booking
/// path releases `tree` before it touches `expiries`, so the reclaim task
/// (which holds `expiries` across its tree deletions) cannot deadlock with it.
pub(crate) struct Shared {
    pub(crate) tree: RwLock<BookingTree>,
    pub(crate) registry: RwLock<ResourceRegistry>,
    pub(crate) expiries: Mutex<ExpiryHeap>,
    pub(crate) clock: Arc<dyn Clock>,
}

/// In-memory resource booking scheduler.
///
/// Owns the booked-interval tree, the resource registry and the expiry heap,
/// plus a background task that drops bookings once they have ended. Must be
/// created inside a tokio runtime.
pub struct Scheduler {
    shared: Arc<Shared>,
    config: SchedulerConfig,
    signal_tx: mpsc::Sender<ReclaimSignal>,
    reclaimer: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: SchedulerConfig, clock: Arc<dyn Clock>) -> Self {
        let shared = Arc::new(Shared {
            tree: RwLock::new(BookingTree::new()),
            registry: RwLock::new(ResourceRegistry::new()),
            expiries: Mutex::new(ExpiryHeap::default()),
            clock,
        });
        let (signal_tx, signal_rx) = mpsc::channel(config.signal_capacity.max(1));
        let reclaimer = tokio::spawn(reclaim::run_reclaimer(
            shared.clone(),
            signal_rx,
            config.max_reclaim_sleep,
        ));
        info!(
            "scheduler started (mode: {}, max reclaim sleep: {:?})",
            config.booking_mode.as_str(),
            config.max_reclaim_sleep
        );
        Self {
            shared,
            config,
            signal_tx,
            reclaimer: Some(reclaimer),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Stop the reclaim task and wait for it to exit.
    pub async fn shutdown(mut self) {
        let Some(handle) = self.reclaimer.take() else { return };
        // A closed channel means the task already stopped.
        let _ = self.signal_tx.send(ReclaimSignal::Stop).await;
        if let Err(e) = handle.await {
            warn!("reclaim task ended abnormally: {e}");
        }
        info!("scheduler stopped");
    }

    /// Ask the reclaim task to re-evaluate against the current clock, e.g.
    /// after the clock was adjusted.
    pub fn wake_reclaimer(&self) {
        self.signal(ReclaimSignal::Wake);
    }

    /// Run one reclaim pass inline and return how many bookings it removed.
    pub async fn reclaim_expired(&self) -> usize {
        reclaim::reclaim_expired(&self.shared, self.shared.clock.now_ms()).await
    }

    fn signal(&self, signal: ReclaimSignal) {
        match self.signal_tx.try_send(signal) {
            Ok(()) => {}
            // Any queued signal already forces a re-evaluation.
            Err(TrySendError::Full(_)) => trace!("reclaim signal already pending"),
            Err(TrySendError::Closed(_)) => debug!("reclaim task gone, signal dropped"),
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        // Dropping `signal_tx` closes the channel; the task sees that and exits.
        if self.reclaimer.is_some() {
            debug!("scheduler dropped without shutdown, detaching reclaim task");
        }
    }
}
