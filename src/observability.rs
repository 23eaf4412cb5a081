use std::net::SocketAddr;

use crate::scheduler::Outcome;

// ── Request-driven ──────────────────────────────────────────────

/// Counter: booking requests. Labels: outcome.
pub const BOOKING_REQUESTS_TOTAL: &str = "booktree_booking_requests_total";

/// Histogram: booking request latency in seconds. Labels: outcome.
pub const BOOKING_DURATION_SECONDS: &str = "booktree_booking_duration_seconds";

/// Counter: cancellations that removed a booking.
pub const CANCELLATIONS_TOTAL: &str = "booktree_cancellations_total";

// ── Background reclaim ──────────────────────────────────────────

/// Counter: expired bookings removed by the reclaim task.
pub const RECLAIMED_TOTAL: &str = "booktree_reclaimed_total";

/// Histogram: duration of one reclaim pass in seconds.
pub const RECLAIM_PASS_DURATION_SECONDS: &str = "booktree_reclaim_pass_duration_seconds";

/// Gauge: expiry heap length, stale entries included.
pub const PENDING_EXPIRIES: &str = "booktree_pending_expiries";

// ── State ───────────────────────────────────────────────────────

/// Gauge: registered resources.
pub const RESOURCES_REGISTERED: &str = "booktree_resources_registered";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), metrics_exporter_prometheus::BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Map a booking outcome to a short label for metrics.
pub fn outcome_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Booked => "booked",
        Outcome::Conflict => "conflict",
        Outcome::UnknownResource => "unknown_resource",
        Outcome::NoResources => "no_resources",
    }
}
