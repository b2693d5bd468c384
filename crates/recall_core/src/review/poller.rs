//! Periodic due-set scanner.
//!
//! # Responsibility
//! - Evaluate the due set on a fixed tick and report the count.
//! - Survive store failures: a failed tick is logged and the loop goes on.
//!
//! # Invariants
//! - The poller only reads from the store.
//! - After `stop` is observed no new tick begins; an in-flight tick finishes
//!   and the worker thread is joined before `stop` returns.
//! - The first scan runs one interval after start; later scans keep a fixed
//!   cadence measured from start, and ticks missed by a slow scan are skipped.
//! - A panicking tick callback is logged and the loop goes on.

use crate::repo::note_store::{NoteQuery, NoteStore};
use crate::time::now_epoch_ms;
use log::{error, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Default scan period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);
const WORKER_THREAD_NAME: &str = "recall-due-poller";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl PollerConfig {
    /// Builds a config from whole seconds. Intervals below 10 ms are raised
    /// to 10 ms when the poller starts.
    pub fn from_secs(seconds: u64) -> Self {
        Self {
            interval: Duration::from_secs(seconds),
        }
    }

    fn effective_interval(&self) -> Duration {
        self.interval.max(MIN_POLL_INTERVAL)
    }
}

/// Outcome of one successful scan, handed to the tick callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub due_count: usize,
    /// Epoch milliseconds used as "now" for the scan.
    pub scanned_at: i64,
}

/// Entry point for starting the due-set scanner.
pub struct BackgroundPoller;

impl BackgroundPoller {
    /// Spawns the scanner on its own thread and returns its handle.
    ///
    /// `on_tick` runs on the worker thread after every successful scan; it is
    /// skipped for failed scans. A panic inside `on_tick` is caught and logged.
    ///
    /// # Errors
    /// - Returns the OS error when the worker thread cannot be spawned.
    pub fn start<S, F>(
        store: Arc<S>,
        config: PollerConfig,
        mut on_tick: F,
    ) -> std::io::Result<PollerHandle>
    where
        S: NoteStore + 'static,
        F: FnMut(TickReport) + Send + 'static,
    {
        let interval = config.effective_interval();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let ticks = Arc::new(AtomicU64::new(0));
        let worker_ticks = Arc::clone(&ticks);

        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                info!(
                    "event=poller_start module=review status=ok interval_ms={}",
                    interval.as_millis()
                );
                let mut deadline = Instant::now() + interval;
                loop {
                    let wait = deadline.saturating_duration_since(Instant::now());
                    match stop_rx.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => {
                            worker_ticks.fetch_add(1, Ordering::SeqCst);
                            if let Some(report) = scan_due_set(store.as_ref()) {
                                let delivered =
                                    panic::catch_unwind(AssertUnwindSafe(|| on_tick(report)));
                                if delivered.is_err() {
                                    error!(
                                        "event=poller_tick module=review status=error error_code=callback_panicked"
                                    );
                                }
                            }
                            deadline = next_deadline(deadline, interval, Instant::now());
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                info!(
                    "event=poller_stop module=review status=ok ticks={}",
                    worker_ticks.load(Ordering::SeqCst)
                );
            })?;

        Ok(PollerHandle {
            stop_tx: Some(stop_tx),
            worker: Some(worker),
            ticks,
        })
    }
}

/// Owner handle for a running poller. Dropping it stops the poller.
pub struct PollerHandle {
    stop_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
    ticks: Arc<AtomicU64>,
}

impl PollerHandle {
    /// Signals cancellation and waits for the worker to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    /// Returns whether the worker thread is still alive.
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.is_finished())
    }

    /// Number of ticks started so far, successful or not.
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    fn shutdown(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            // A closed channel means the worker already exited.
            let _ = stop_tx.send(());
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("event=poller_stop module=review status=error error_code=worker_panicked");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Next tick after `previous`, on the grid `start + k * interval`. When a
/// scan overran one or more ticks they are dropped rather than replayed.
fn next_deadline(previous: Instant, interval: Duration, now: Instant) -> Instant {
    let mut next = previous + interval;
    while next <= now {
        next += interval;
    }
    next
}

/// Runs one scan. Store errors are logged and swallowed.
fn scan_due_set<S: NoteStore + ?Sized>(store: &S) -> Option<TickReport> {
    let scanned_at = now_epoch_ms();
    match store.find_notes(&NoteQuery::due_at(scanned_at)) {
        Ok(notes) => {
            let due_count = notes.len();
            if due_count > 0 {
                info!(
                    "event=due_scan module=review status=ok due_count={}",
                    due_count
                );
            }
            Some(TickReport {
                due_count,
                scanned_at,
            })
        }
        Err(err) => {
            error!(
                "event=due_scan module=review status=error error={}",
                err
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{next_deadline, PollerConfig, DEFAULT_POLL_INTERVAL};
    use std::time::{Duration, Instant};

    #[test]
    fn default_interval_is_one_minute() {
        assert_eq!(PollerConfig::default().interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(DEFAULT_POLL_INTERVAL, Duration::from_secs(60));
    }

    #[test]
    fn next_deadline_keeps_fixed_cadence() {
        let start = Instant::now();
        let interval = Duration::from_secs(60);
        let first = start + interval;

        // A 5 s scan does not push the next tick back by 5 s.
        let after_quick_scan = next_deadline(first, interval, first + Duration::from_secs(5));
        assert_eq!(after_quick_scan, start + 2 * interval);

        // A scan that overruns two ticks lands on the next grid point.
        let after_slow_scan = next_deadline(first, interval, first + Duration::from_secs(130));
        assert_eq!(after_slow_scan, start + 4 * interval);
    }

    #[test]
    fn zero_interval_is_raised_to_floor() {
        assert_eq!(
            PollerConfig::from_secs(0).effective_interval(),
            Duration::from_millis(10)
        );
    }
}
