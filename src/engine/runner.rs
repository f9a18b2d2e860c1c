//! # engine::runner
//!
//! The polling loop that drives the [`ReminderScheduler`].
//!
//! ```text
//! every period:
//!   1. tick(Utc::now())                 fire everything overdue
//!   2. schedule_auto_settlement(local)  keep one weekly reminder queued
//! ```
//!
//! `tick` is a level check, so after a suspended process wakes up the first
//! period fires everything that came due while it slept.  Stopping waits for
//! an in-flight tick to finish.

use std::time::Duration;

use chrono::{Local, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::engine::scheduler::ReminderScheduler;

/// Handle to the running loop.  Dropping it without `stop` leaves the loop
/// running until the runtime shuts down.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task:     JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop accepting ticks and wait for the loop to exit.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Scheduler task ended abnormally");
        }
        info!("⏹️ Reminder scheduler stopped");
    }
}

/// Spawn the polling loop on the current runtime.
pub fn spawn(scheduler: ReminderScheduler, period: Duration) -> SchedulerHandle {
    let (shutdown, mut stop_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(period = ?period, "⏰ Reminder scheduler running");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let report = scheduler.tick(Utc::now()).await;
                    if !report.fired.is_empty() {
                        info!(fired = report.fired.len(), delivered = report.delivered, "Tick fired reminders");
                    }
                    scheduler.schedule_auto_settlement(&Local::now()).await;
                }
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
            }
        }
    });

    SchedulerHandle { shutdown, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tokio::sync::{broadcast, RwLock};

    use crate::models::{Amount, ReminderStatus, SettlementTransaction};
    use crate::notify::test_support::RecordingGateway;
    use crate::notify::Permission;
    use crate::store::{MemoryStore, ReminderStore, SettingsStore};

    #[tokio::test]
    async fn loop_fires_overdue_reminders_and_stops_cleanly() {
        let backend = Arc::new(MemoryStore::new());
        let reminders = Arc::new(RwLock::new(ReminderStore::load(backend.clone())));
        let settings = Arc::new(RwLock::new(SettingsStore::load(backend)));
        let gateway = Arc::new(RecordingGateway::new(Permission::Granted));
        let (events, _) = broadcast::channel(16);
        let scheduler = ReminderScheduler::new(reminders.clone(), settings, gateway.clone(), events);

        // Already overdue, as if the process had been asleep.
        let overdue = scheduler
            .schedule_followup(
                SettlementTransaction::new("B", "A", Amount::from_minor(2_500)),
                chrono::Duration::zero(),
                Utc::now() - chrono::Duration::hours(3),
            )
            .await
            .unwrap();

        let handle = spawn(scheduler, Duration::from_millis(10));

        let mut fired = false;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let status = reminders.read().await.get(&overdue.id).map(|r| r.status);
            if status == Some(ReminderStatus::Triggered) {
                fired = true;
                break;
            }
        }
        handle.stop().await;

        assert!(fired, "overdue reminder was not fired by the loop");
        assert_eq!(gateway.shown().len(), 1);
        assert!(reminders.read().await.has_pending_settlement());
    }
}
