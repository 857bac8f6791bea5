//! Integration tests for the round countdown timer.
//!
//! Uses `start_paused` so tokio's clock auto-advances while the test is
//! parked on the channel — every sleep resolves instantly and the tick
//! sequence is fully deterministic.

use std::time::Duration;

use pairquiz_timer::{RoundTimer, TimerEvent};
use tokio::sync::mpsc;

async fn next_event(rx: &mut mpsc::Receiver<TimerEvent>) -> TimerEvent {
    tokio::time::timeout(Duration::from_secs(30), rx.recv())
        .await
        .expect("timed out waiting for timer event")
        .expect("timer channel closed")
}

#[tokio::test(start_paused = true)]
async fn test_countdown_ticks_then_expires() {
    let (tx, mut rx) = mpsc::channel(16);
    let _timer = RoundTimer::start(1, Duration::from_secs(3), tx, |e| e);

    assert_eq!(
        next_event(&mut rx).await,
        TimerEvent::Tick {
            generation: 1,
            remain_ms: 3000
        }
    );
    assert_eq!(
        next_event(&mut rx).await,
        TimerEvent::Tick {
            generation: 1,
            remain_ms: 2000
        }
    );
    assert_eq!(
        next_event(&mut rx).await,
        TimerEvent::Tick {
            generation: 1,
            remain_ms: 1000
        }
    );
    assert_eq!(
        next_event(&mut rx).await,
        TimerEvent::Expired { generation: 1 }
    );
}

#[tokio::test(start_paused = true)]
async fn test_remaining_is_monotonically_decreasing() {
    let (tx, mut rx) = mpsc::channel(16);
    let _timer = RoundTimer::start(7, Duration::from_secs(5), tx, |e| e);

    let mut last = u64::MAX;
    loop {
        match next_event(&mut rx).await {
            TimerEvent::Tick { remain_ms, .. } => {
                assert!(remain_ms < last, "{remain_ms} not below {last}");
                last = remain_ms;
            }
            TimerEvent::Expired { generation } => {
                assert_eq!(generation, 7);
                break;
            }
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_expires_exactly_once() {
    let (tx, mut rx) = mpsc::channel(16);
    let _timer = RoundTimer::start(1, Duration::from_secs(1), tx, |e| e);

    let mut expirations = 0;
    // Drain until the task ends and drops its sender.
    while let Some(ev) = rx.recv().await {
        if matches!(ev, TimerEvent::Expired { .. }) {
            expirations += 1;
        }
    }
    assert_eq!(expirations, 1);
}

#[tokio::test(start_paused = true)]
async fn test_sub_second_countdown_still_expires() {
    let (tx, mut rx) = mpsc::channel(16);
    let _timer = RoundTimer::start(2, Duration::from_millis(400), tx, |e| e);

    assert_eq!(
        next_event(&mut rx).await,
        TimerEvent::Tick {
            generation: 2,
            remain_ms: 400
        }
    );
    assert_eq!(
        next_event(&mut rx).await,
        TimerEvent::Expired { generation: 2 }
    );
}

#[tokio::test(start_paused = true)]
async fn test_stop_is_idempotent() {
    let (tx, mut rx) = mpsc::channel(16);
    let timer = RoundTimer::start(1, Duration::from_secs(60), tx, |e| e);

    // First tick proves the task started.
    assert!(matches!(
        next_event(&mut rx).await,
        TimerEvent::Tick { .. }
    ));

    timer.stop();
    timer.stop();

    // The channel closes without an expiration event.
    while let Some(ev) = rx.recv().await {
        assert!(
            !matches!(ev, TimerEvent::Expired { .. }),
            "stopped timer must not expire"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_events_carry_their_generation() {
    let (tx, mut rx) = mpsc::channel(16);

    let first = RoundTimer::start(1, Duration::from_secs(60), tx.clone(), |e| e);
    assert_eq!(next_event(&mut rx).await.generation(), 1);
    first.stop();

    // A replacement timer's events are distinguishable from anything the
    // first one may have left queued.
    let second = RoundTimer::start(2, Duration::from_secs(1), tx, |e| e);
    assert_eq!(second.generation(), 2);
    loop {
        let ev = next_event(&mut rx).await;
        if ev.generation() == 1 {
            continue; // stale leftover, exactly what owners discard
        }
        assert_eq!(ev.generation(), 2);
        if matches!(ev, TimerEvent::Expired { .. }) {
            break;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_deadline_matches_total() {
    let (tx, _rx) = mpsc::channel::<TimerEvent>(16);
    let start = tokio::time::Instant::now();
    let timer = RoundTimer::start(1, Duration::from_secs(45), tx, |e| e);
    assert_eq!(timer.deadline() - start, Duration::from_secs(45));
}
