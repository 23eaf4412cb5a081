use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::{info, warn};

use booktree::{Clock, Resource, Scheduler, SchedulerConfig, SystemClock, TimeSlot};

const USAGE: &str = "usage: booktree [-t threads] [-i intervals] [-r rooms]";

/// Length of every benchmark booking. Shorter than the step, so a single
/// worker never conflicts with itself.
const SLOT_MS: i64 = 1;
/// Spacing between consecutive slot starts.
const STEP_MS: i64 = 1_000;

#[derive(Debug, PartialEq, Eq)]
struct Args {
    threads: usize,
    intervals: u64,
    rooms: usize,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            threads: 1,
            intervals: 5_000_000,
            rooms: 3,
        }
    }
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut parsed = Args::default();
    let mut it = args.iter().skip(1);
    while let Some(flag) = it.next() {
        let value = it
            .next()
            .ok_or_else(|| format!("missing value for {flag}\n{USAGE}"))?;
        let number = value
            .parse::<u64>()
            .map_err(|_| format!("invalid value for {flag}: {value}\n{USAGE}"))?;
        match flag.as_str() {
            "-t" => parsed.threads = number.max(1) as usize,
            "-i" => parsed.intervals = number,
            "-r" => parsed.rooms = number as usize,
            other => return Err(format!("unknown flag {other}\n{USAGE}")),
        }
    }
    Ok(parsed)
}

/// Midpoint-first ordering of `low..=high`. Inserting keys in this order
/// keeps the unbalanced interval tree shallow.
fn balanced_order(low: u64, high: u64, out: &mut Vec<u64>) {
    if low > high {
        return;
    }
    let mid = low + (high - low) / 2;
    out.push(mid);
    if mid > low {
        balanced_order(low, mid - 1, out);
    }
    balanced_order(mid + 1, high, out);
}

#[derive(Debug, Default)]
struct Counters {
    booked: AtomicU64,
    rejected: AtomicU64,
    stop: AtomicBool,
}

/// One task per thread, each requesting a slot for every index in order.
fn spawn_workers(
    scheduler: &Arc<Scheduler>,
    threads: usize,
    indices: Arc<Vec<u64>>,
    base: i64,
    counters: Arc<Counters>,
) -> Vec<JoinHandle<()>> {
    (0..threads)
        .map(|_| {
            let scheduler = scheduler.clone();
            let indices = indices.clone();
            let counters = counters.clone();
            tokio::spawn(async move {
                for &idx in indices.iter() {
                    if counters.stop.load(Ordering::Relaxed) {
                        break;
                    }
                    let Ok(slot) = TimeSlot::new(base + idx as i64 * STEP_MS, SLOT_MS) else {
                        continue;
                    };
                    match scheduler.request_booking(slot).await {
                        Some(_) => counters.booked.fetch_add(1, Ordering::Relaxed),
                        None => counters.rejected.fetch_add(1, Ordering::Relaxed),
                    };
                }
            })
        })
        .collect()
}

/// Wait for every worker. If `interrupt` fires first, raise the stop flag and
/// still wait, so no worker outlives this call.
async fn join_workers(
    workers: Vec<JoinHandle<()>>,
    counters: &Counters,
    interrupt: impl Future<Output = ()>,
) {
    let all = futures::future::join_all(workers);
    tokio::pin!(all);
    let results = tokio::select! {
        results = &mut all => results,
        _ = interrupt => {
            info!("interrupted, stopping workers");
            counters.stop.store(true, Ordering::Relaxed);
            all.await
        }
    };
    for r in results {
        if let Err(e) = r {
            warn!("worker failed: {e}");
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let metrics_port: Option<u16> = std::env::var("BOOKTREE_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    booktree::observability::init(metrics_port)?;

    let argv: Vec<String> = std::env::args().collect();
    let args = parse_args(&argv)?;
    let config = SchedulerConfig::from_env();

    info!(
        "config: {} threads | {} rooms | {} intervals | mode {}",
        args.threads,
        args.rooms,
        args.intervals,
        config.booking_mode.as_str()
    );

    let scheduler = Arc::new(Scheduler::new(config));
    for i in 0..args.rooms {
        scheduler
            .register_resource(Resource::new(format!("#M{i}"), i as u32))
            .await?;
    }

    let mut indices = Vec::with_capacity(args.intervals as usize);
    balanced_order(1, args.intervals, &mut indices);
    let indices = Arc::new(indices);
    let counters = Arc::new(Counters::default());

    let reporter = {
        let counters = counters.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_secs(1));
            tick.tick().await;
            let mut last = 0;
            loop {
                tick.tick().await;
                let now = counters.booked.load(Ordering::Relaxed);
                info!("{} bookings/sec", now - last);
                last = now;
            }
        })
    };

    let started = Instant::now();
    let workers = spawn_workers(
        &scheduler,
        args.threads,
        indices,
        SystemClock.now_ms(),
        counters.clone(),
    );
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    join_workers(workers, &counters, ctrl_c).await;
    reporter.abort();

    let elapsed = started.elapsed();
    let total_booked = counters.booked.load(Ordering::Relaxed);
    let total_rejected = counters.rejected.load(Ordering::Relaxed);
    info!(
        "done in {:.2}s: {total_booked} booked, {total_rejected} rejected, {:.0} requests/sec",
        elapsed.as_secs_f64(),
        (total_booked + total_rejected) as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );
    info!("live bookings: {}", scheduler.booking_count().await);

    match Arc::try_unwrap(scheduler) {
        Ok(scheduler) => scheduler.shutdown().await,
        Err(_) => warn!("scheduler still shared at exit, skipping clean shutdown"),
    }
    Ok(())
}
