//! Periodic background refresh.
//!
//! The loop shares the controller behind an async mutex, so a tick never
//! interleaves with an upload or delete running on the same controller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::controller::Controller;

pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(30);
pub const MIN_SYNC_INTERVAL: Duration = Duration::from_secs(5);
pub const MAX_SYNC_INTERVAL: Duration = Duration::from_secs(300);

/// Spawns the refresh task.
pub struct SyncLoop;

impl SyncLoop {
    /// Refresh `controller` every `interval`, starting one interval from now.
    /// The interval is clamped into the supported range first.
    pub fn spawn(controller: Arc<Mutex<Controller>>, interval: Duration) -> SyncHandle {
        let interval = clamp_interval(interval);
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        let ticks = Arc::new(AtomicU64::new(0));
        let tick_counter = Arc::clone(&ticks);

        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut timer = tokio::time::interval_at(start, interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!("Sync loop started: interval={}s", interval.as_secs());

            loop {
                tokio::select! {
                    _ = cancel_rx.changed() => break,
                    _ = timer.tick() => {
                        let tick = tick_counter.fetch_add(1, Ordering::Relaxed) + 1;
                        tracing::debug!("Sync tick {}", tick);
                        let mut controller = controller.lock().await;
                        if let Err(error) = controller.refresh().await {
                            tracing::warn!("Sync tick {} failed: {}", tick, error);
                        }
                    }
                }
            }
            tracing::info!("Sync loop stopped");
        });

        SyncHandle {
            cancel: cancel_tx,
            ticks,
            task: Some(task),
        }
    }
}

/// Owner of a running sync loop. Dropping it stops the loop.
pub struct SyncHandle {
    cancel: watch::Sender<bool>,
    ticks: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    /// Ask the loop to stop once any in-flight tick finishes.
    pub fn cancel(&self) {
        // Receiver gone means the loop already exited.
        let _ = self.cancel.send(true);
    }

    /// Number of refresh ticks started so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Cancel and wait for the loop to exit.
    pub async fn shutdown(mut self) {
        self.cancel();
        if let Some(task) = self.task.take() {
            if let Err(error) = task.await {
                tracing::warn!("Sync loop ended abnormally: {}", error);
            }
        }
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Clamp a configured interval into the supported range.
#[must_use]
pub fn clamp_interval(interval: Duration) -> Duration {
    interval.clamp(MIN_SYNC_INTERVAL, MAX_SYNC_INTERVAL)
}
