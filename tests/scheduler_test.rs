//! Refresh scheduler behaviour against a scripted analytics source

mod common;

use common::{snapshot, FakeSource};
use pims_dashboard::api::ApiError;
use pims_dashboard::live::{AnalyticsFeed, AnalyticsState, RefreshIntervals, FETCH_ERROR_FALLBACK};
use pims_dashboard::timestamp_parser::TimestampParser;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, timeout};

const WAIT: Duration = Duration::from_secs(5);

fn long_intervals() -> RefreshIntervals {
    RefreshIntervals {
        analytics: Duration::from_secs(3600),
        last_updated: Duration::from_secs(3600),
    }
}

async fn wait_for_state(rx: &mut watch::Receiver<AnalyticsState>, predicate: impl FnMut(&AnalyticsState) -> bool) {
    timeout(WAIT, rx.wait_for(predicate))
        .await
        .expect("timed out waiting for analytics state")
        .expect("scheduler stopped");
}

fn loaded(state: &AnalyticsState) -> bool {
    state.data.is_some() && !state.loading
}

#[tokio::test]
async fn test_initial_fetch_on_start() {
    let source = FakeSource::new(vec![Ok(snapshot("Central"))], Duration::ZERO);
    let feed = AnalyticsFeed::spawn(source.clone(), long_intervals());

    assert!(feed.state().loading);
    let mut rx = feed.subscribe();
    wait_for_state(&mut rx, loaded).await;

    let state = feed.state();
    assert_eq!(state.data.unwrap().pharmacy_name.as_deref(), Some("Central"));
    assert!(state.error.is_none());
    assert_eq!(source.fetch_count(), 1);
}

#[tokio::test]
async fn test_failure_keeps_previous_data() {
    let failure = ApiError::Http {
        status: 500,
        message: Some("Analytics service unavailable".to_string()),
    };
    let source = FakeSource::new(vec![Ok(snapshot("Central")), Err(failure)], Duration::ZERO);
    let feed = AnalyticsFeed::spawn(source.clone(), long_intervals());
    let mut rx = feed.subscribe();
    wait_for_state(&mut rx, loaded).await;

    feed.refetch();
    wait_for_state(&mut rx, |s| s.error.is_some() && !s.loading).await;

    let state = feed.state();
    assert_eq!(state.data.unwrap().pharmacy_name.as_deref(), Some("Central"));
    assert_eq!(state.error.as_deref(), Some("Analytics service unavailable"));
}

#[tokio::test]
async fn test_failure_without_message_uses_fallback() {
    let source = FakeSource::new(vec![Err(ApiError::Timeout)], Duration::ZERO);
    let feed = AnalyticsFeed::spawn(source, long_intervals());
    let mut rx = feed.subscribe();

    wait_for_state(&mut rx, |s| !s.loading).await;

    let state = feed.state();
    assert!(state.data.is_none());
    assert_eq!(state.error.as_deref(), Some(FETCH_ERROR_FALLBACK));
}

#[tokio::test]
async fn test_next_fetch_clears_error() {
    let source = FakeSource::new(
        vec![Err(ApiError::Timeout), Ok(snapshot("Central"))],
        Duration::ZERO,
    );
    let feed = AnalyticsFeed::spawn(source, long_intervals());
    let mut rx = feed.subscribe();
    wait_for_state(&mut rx, |s| s.error.is_some()).await;

    feed.refetch();
    wait_for_state(&mut rx, loaded).await;

    assert!(feed.state().error.is_none());
}

#[tokio::test]
async fn test_refetch_requests_coalesce_while_in_flight() {
    let outcomes = (0..5).map(|_| Ok(snapshot("Central"))).collect();
    let source = FakeSource::new(outcomes, Duration::from_millis(200));
    let feed = AnalyticsFeed::spawn(source.clone(), long_intervals());
    let mut rx = feed.subscribe();
    wait_for_state(&mut rx, loaded).await;
    assert_eq!(source.fetch_count(), 1);

    feed.refetch();
    sleep(Duration::from_millis(50)).await;
    assert!(feed.state().loading);

    // Both arrive while the second fetch is running
    feed.refetch();
    feed.refetch();

    wait_for_state(&mut rx, |s| !s.loading).await;
    sleep(Duration::from_millis(400)).await;

    assert_eq!(source.fetch_count(), 2);
    assert!(!feed.state().loading);
}

#[tokio::test]
async fn test_last_updated_is_polled() {
    let source = FakeSource::new(vec![Ok(snapshot("Central"))], Duration::ZERO);
    let feed = AnalyticsFeed::spawn(source, long_intervals());
    let mut rx = feed.subscribe_last_updated();

    timeout(WAIT, rx.wait_for(|stamp| stamp.is_some()))
        .await
        .expect("timed out waiting for last-updated poll")
        .expect("scheduler stopped");

    let expected = TimestampParser::parse("2025-03-10T11:58:00Z").unwrap();
    assert_eq!(feed.last_updated(), Some(expected));
}

#[tokio::test]
async fn test_slow_fetch_holds_back_last_updated_poll() {
    use std::sync::atomic::Ordering;

    let source = FakeSource::new(vec![Ok(snapshot("Central"))], Duration::from_millis(400));
    let intervals = RefreshIntervals {
        analytics: Duration::from_secs(3600),
        last_updated: Duration::from_millis(50),
    };
    let feed = AnalyticsFeed::spawn(source.clone(), intervals);
    let mut rx = feed.subscribe();

    // Both timers fire at start; at most one poll can land before the fetch blocks the loop
    sleep(Duration::from_millis(200)).await;
    assert!(source.polls.load(Ordering::SeqCst) <= 1);

    wait_for_state(&mut rx, loaded).await;
    sleep(Duration::from_millis(200)).await;
    assert!(source.polls.load(Ordering::SeqCst) >= 2);
    drop(feed);
}

#[tokio::test]
async fn test_analytics_timer_refetches() {
    let outcomes = (0..10).map(|_| Ok(snapshot("Central"))).collect();
    let source = FakeSource::new(outcomes, Duration::ZERO);
    let intervals = RefreshIntervals {
        analytics: Duration::from_millis(100),
        last_updated: Duration::from_secs(3600),
    };
    let feed = AnalyticsFeed::spawn(source.clone(), intervals);

    sleep(Duration::from_millis(350)).await;

    assert!(source.fetch_count() >= 3);
    drop(feed);
}

#[tokio::test]
async fn test_drop_stops_scheduler() {
    let source = FakeSource::new(vec![Ok(snapshot("Central"))], Duration::ZERO);
    let feed = AnalyticsFeed::spawn(source.clone(), long_intervals());
    let mut rx = feed.subscribe();
    wait_for_state(&mut rx, loaded).await;
    assert!(feed.is_running());

    feed.shutdown();

    let closed = timeout(WAIT, async {
        while rx.changed().await.is_ok() {}
    })
    .await;
    assert!(closed.is_ok(), "state channel should close once the scheduler is gone");

    let fetches = source.fetch_count();
    sleep(Duration::from_millis(100)).await;
    assert_eq!(source.fetch_count(), fetches);
}
