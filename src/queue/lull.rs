//! Cancellable delayed lull task for the cooperative queue.
//!
//! Every `put` aborts the running sleeper and spawns a fresh one under a new
//! generation number. The sleeper publishes `expired` on a watch channel only if
//! its generation is still current, so a late wake-up from a replaced sleeper
//! can never announce a lull.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LullSignal {
    pub(crate) generation: u64,
    pub(crate) expired: bool,
}

/// How a suspension on the lull signal ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LullOutcome {
    /// The awaited sleeper ran to completion: a full lull has passed
    Expired,
    /// A `put` replaced the sleeper while we were suspended
    Reset,
    /// The caller's deadline passed first
    TimedOut,
}

pub(crate) struct LullTimer {
    lull_time: Duration,
    signal: Arc<watch::Sender<LullSignal>>,
    sleeper: Option<JoinHandle<()>>,
}

impl LullTimer {
    /// A fresh timer counts as already expired; nothing is queued yet.
    pub(crate) fn new(lull_time: Duration) -> Self {
        let (signal, _) = watch::channel(LullSignal {
            generation: 0,
            expired: true,
        });
        Self {
            lull_time,
            signal: Arc::new(signal),
            sleeper: None,
        }
    }

    /// Cancel the current sleeper and start a new one for a full `lull_time`.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn reschedule(&mut self) {
        if let Some(sleeper) = self.sleeper.take() {
            sleeper.abort();
        }

        self.signal.send_modify(|signal| {
            signal.generation += 1;
            signal.expired = false;
        });
        let generation = self.signal.borrow().generation;

        let signal = Arc::clone(&self.signal);
        let lull_time = self.lull_time;
        self.sleeper = Some(tokio::spawn(async move {
            time::sleep(lull_time).await;
            signal.send_if_modified(|current| {
                if current.generation == generation && !current.expired {
                    current.expired = true;
                    true
                } else {
                    false
                }
            });
        }));
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<LullSignal> {
        self.signal.subscribe()
    }

    pub(crate) fn is_expired(&self) -> bool {
        self.signal.borrow().expired
    }

    pub(crate) fn generation(&self) -> u64 {
        self.signal.borrow().generation
    }
}

impl Drop for LullTimer {
    fn drop(&mut self) {
        if let Some(sleeper) = self.sleeper.take() {
            sleeper.abort();
        }
    }
}

/// Suspend until the signal moves on from `seen`, or until `deadline`.
pub(crate) async fn wait_for_change(
    rx: &mut watch::Receiver<LullSignal>,
    seen: LullSignal,
    deadline: Option<Instant>,
) -> LullOutcome {
    let changed = match deadline {
        Some(deadline) => match time::timeout_at(deadline, rx.changed()).await {
            Ok(changed) => changed,
            Err(_) => return LullOutcome::TimedOut,
        },
        None => rx.changed().await,
    };

    // Sender dropped: the caller re-subscribes and finds out for itself.
    if changed.is_err() {
        return LullOutcome::Reset;
    }

    let current = *rx.borrow_and_update();
    if current.generation == seen.generation && current.expired {
        LullOutcome::Expired
    } else {
        LullOutcome::Reset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sleeper_expires_after_lull() {
        let mut timer = LullTimer::new(Duration::from_millis(100));
        timer.reschedule();

        let mut rx = timer.subscribe();
        let seen = *rx.borrow_and_update();
        assert!(!seen.expired);

        let start = Instant::now();
        assert_eq!(
            wait_for_change(&mut rx, seen, None).await,
            LullOutcome::Expired
        );
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(100) && elapsed < Duration::from_millis(105));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_reports_reset() {
        let mut timer = LullTimer::new(Duration::from_millis(100));
        timer.reschedule();

        let mut rx = timer.subscribe();
        let seen = *rx.borrow_and_update();
        timer.reschedule();

        assert_eq!(
            wait_for_change(&mut rx, seen, None).await,
            LullOutcome::Reset
        );
        assert_eq!(timer.generation(), seen.generation + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replaced_sleeper_never_expires_new_generation() {
        let mut timer = LullTimer::new(Duration::from_millis(100));
        timer.reschedule();
        time::sleep(Duration::from_millis(60)).await;
        timer.reschedule();

        let mut rx = timer.subscribe();
        let seen = *rx.borrow_and_update();

        // The first sleeper would have fired at 100ms; the second fires at 160ms.
        let start = Instant::now();
        assert_eq!(
            wait_for_change(&mut rx, seen, None).await,
            LullOutcome::Expired
        );
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(100) && elapsed < Duration::from_millis(105));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_reports_timed_out() {
        let mut timer = LullTimer::new(Duration::from_millis(500));
        timer.reschedule();

        let mut rx = timer.subscribe();
        let seen = *rx.borrow_and_update();
        let deadline = Instant::now() + Duration::from_millis(100);

        assert_eq!(
            wait_for_change(&mut rx, seen, Some(deadline)).await,
            LullOutcome::TimedOut
        );
    }
}
