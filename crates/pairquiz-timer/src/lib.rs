//! Round countdown timer for pairquiz.
//!
//! Each room owns at most one [`RoundTimer`] at a time. The timer runs as a
//! detached task that emits a [`TimerEvent::Tick`] every second carrying the
//! remaining milliseconds (the first tick fires immediately on start), then
//! exactly one [`TimerEvent::Expired`] when the deadline is reached, after
//! which the task ends on its own.
//!
//! # Integration
//!
//! Events are funneled into the owning room actor's command channel via the
//! `wrap` closure, so all room-state mutation stays inside the actor:
//!
//! ```ignore
//! let timer = RoundTimer::start(
//!     generation,
//!     Duration::from_secs(limit),
//!     cmd_tx.clone(),
//!     RoomCommand::Timer,
//! );
//! ```
//!
//! # Staleness
//!
//! Stopping aborts the task, but events already queued in the channel can
//! still be delivered afterwards. Every event carries the generation the
//! timer was started with; the room actor compares it against its live
//! timer's generation and discards mismatches. That comparison is the
//! re-validation step every delayed callback must perform.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::trace;

/// Tick cadence of the countdown.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// An event emitted by a running [`RoundTimer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Periodic countdown notification.
    Tick { generation: u64, remain_ms: u64 },
    /// The deadline was reached. Emitted exactly once per timer.
    Expired { generation: u64 },
}

impl TimerEvent {
    /// The generation of the timer that produced this event.
    pub fn generation(&self) -> u64 {
        match *self {
            TimerEvent::Tick { generation, .. } => generation,
            TimerEvent::Expired { generation } => generation,
        }
    }
}

/// Handle to a running countdown task.
///
/// Dropping the handle aborts the task, so a replaced timer can never
/// outlive its owner. Stopping an already-finished timer is a no-op.
#[derive(Debug)]
pub struct RoundTimer {
    generation: u64,
    deadline: Instant,
    handle: JoinHandle<()>,
}

impl RoundTimer {
    /// Starts a countdown of `total` duration.
    ///
    /// Each emitted [`TimerEvent`] is passed through `wrap` and sent on
    /// `sender`; if the receiving side is gone the task simply ends.
    pub fn start<T, F>(
        generation: u64,
        total: Duration,
        sender: mpsc::Sender<T>,
        wrap: F,
    ) -> Self
    where
        T: Send + 'static,
        F: Fn(TimerEvent) -> T + Send + 'static,
    {
        let deadline = Instant::now() + total;
        let handle = tokio::spawn(async move {
            loop {
                let now = Instant::now();
                if now >= deadline {
                    trace!(generation, "round timer expired");
                    let _ = sender.send(wrap(TimerEvent::Expired { generation })).await;
                    break;
                }
                let remain = deadline - now;
                let tick = TimerEvent::Tick {
                    generation,
                    remain_ms: remain.as_millis() as u64,
                };
                if sender.send(wrap(tick)).await.is_err() {
                    break;
                }
                // Final partial tick sleeps straight to the deadline.
                tokio::time::sleep_until((now + TICK_INTERVAL).min(deadline)).await;
            }
        });

        Self {
            generation,
            deadline,
            handle,
        }
    }

    /// The generation this timer was started with.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The absolute deadline of this countdown.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Stops the countdown. Safe to call any number of times, including
    /// after natural expiration.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for RoundTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
