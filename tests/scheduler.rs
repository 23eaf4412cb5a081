use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use booktree::{
    BookingMode, Clock, ManualClock, Resource, Scheduler, SchedulerConfig, SystemClock, TimeSlot,
};

// ── Test infrastructure ──────────────────────────────────────

const MIN: Duration = Duration::from_secs(60);

fn at(hour: u32, minute: u32, minutes: u64) -> TimeSlot {
    TimeSlot::from_calendar(2023, 11, 28, hour, minute, MIN * minutes as u32).unwrap()
}

/// Scheduler whose clock sits at midnight of the test day.
async fn start(mode: BookingMode, rooms: &[&str]) -> (Arc<Scheduler>, Arc<ManualClock>) {
    let midnight = at(0, 0, 1).start();
    let clock = Arc::new(ManualClock::new(midnight));
    let config = SchedulerConfig::default().with_booking_mode(mode);
    let scheduler = Scheduler::with_clock(config, clock.clone());
    for room in rooms {
        scheduler
            .register_resource(Resource::new(*room, 6).with_name(format!("Room {room}")))
            .await
            .unwrap();
    }
    (Arc::new(scheduler), clock)
}

async fn wait_until_idle(scheduler: &Scheduler) -> bool {
    for _ in 0..300 {
        if scheduler.is_idle().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

async fn stop(scheduler: Arc<Scheduler>) {
    if let Ok(s) = Arc::try_unwrap(scheduler) {
        s.shutdown().await;
    }
}

// ── Scenarios ────────────────────────────────────────────────

#[tokio::test]
async fn two_rooms_morning() {
    let (s, _) = start(BookingMode::Serialized, &["A", "B"]).await;

    let standup = s.request_booking(at(10, 0, 60)).await.expect("A is free");
    assert_eq!(standup.resource_id(), "A");
    assert_eq!(standup.resource.name.as_deref(), Some("Room A"));

    let sync = s.request_booking(at(10, 30, 15)).await.expect("B is free");
    assert_eq!(sync.resource_id(), "B");

    // Overlaps both the standup and the sync.
    assert!(s.request_booking(at(10, 35, 5)).await.is_none());

    assert!(s.cancel_booking(&standup).await);
    let retry = s.request_booking(at(10, 35, 5)).await.expect("A freed up");
    assert_eq!(retry.resource_id(), "A");

    assert_eq!(s.booking_count().await, 2);
    stop(s).await;
}

#[tokio::test]
async fn finished_meetings_free_their_rooms() {
    let (s, clock) = start(BookingMode::Serialized, &["A"]).await;
    let meeting = at(9, 0, 30);
    s.request_booking(meeting).await.unwrap();
    assert!(s.request_booking(at(9, 15, 30)).await.is_none());

    clock.set(meeting.end());
    s.wake_reclaimer();
    assert!(wait_until_idle(&s).await, "ended booking was not reclaimed");

    assert!(s.request_booking(at(9, 15, 30)).await.is_some());
    stop(s).await;
}

#[tokio::test]
async fn short_real_time_booking_expires() {
    let s = Scheduler::new(SchedulerConfig::default());
    s.register_resource(Resource::new("A", 1)).await.unwrap();
    let now = SystemClock.now_ms();
    let slot = TimeSlot::new(now, 150).unwrap();
    s.request_booking(slot).await.unwrap();
    assert!(s.request_booking(slot).await.is_none());

    assert!(wait_until_idle(&s).await);
    assert!(s.request_booking(TimeSlot::new(now + 150, 60_000).unwrap()).await.is_some());
    s.shutdown().await;
}

#[test]
fn invalid_slots_never_reach_the_scheduler() {
    assert!(TimeSlot::new(1_000, 0).is_err());
    assert!(TimeSlot::new(1_000, -5).is_err());
    assert!(TimeSlot::from_calendar(2023, 2, 30, 9, 0, MIN).is_err());
}

// ── Concurrency ──────────────────────────────────────────────

async fn storm(mode: BookingMode, rooms: usize, requests: usize) -> usize {
    let ids: Vec<String> = (0..rooms).map(|i| format!("R{i}")).collect();
    let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    let (s, _) = start(mode, &refs).await;

    let slot = at(14, 0, 60);
    let results = join_all((0..requests).map(|_| {
        let s = s.clone();
        tokio::spawn(async move { s.request_booking(slot).await })
    }))
    .await;

    let booked = results
        .into_iter()
        .filter(|r| matches!(r, Ok(Some(_))))
        .count();
    stop(s).await;
    booked
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn serialized_storm_fills_every_room_once() {
    assert_eq!(storm(BookingMode::Serialized, 5, 100).await, 5);
    assert_eq!(storm(BookingMode::Serialized, 20, 10).await, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn relaxed_storm_books_at_least_every_room() {
    assert!(storm(BookingMode::Relaxed, 5, 100).await >= 5);
    assert_eq!(storm(BookingMode::Relaxed, 20, 10).await, 10);
}
