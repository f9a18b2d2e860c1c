//! # store::reminders
//!
//! The reminder queue.  Reminders are appended and have their status changed
//! in place; they are never deleted by any scheduling policy.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::{ReminderStatus, ScheduledReminder};
use crate::store::kv::{load_json, save_json, KeyValueStore};
use crate::store::{Durability, REMINDERS_KEY};

pub struct ReminderStore {
    reminders: Vec<ScheduledReminder>,
    backend:   Arc<dyn KeyValueStore>,
}

impl ReminderStore {
    pub fn load(backend: Arc<dyn KeyValueStore>) -> Self {
        let reminders: Vec<ScheduledReminder> = match load_json(backend.as_ref(), REMINDERS_KEY) {
            Ok(Some(reminders)) => reminders,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "⚠️ Could not load reminders, starting with empty queue");
                Vec::new()
            }
        };

        let pending = reminders.iter().filter(|r| r.status == ReminderStatus::Pending).count();
        info!(count = reminders.len(), pending, "⏰ Reminder queue loaded");

        Self { reminders, backend }
    }

    pub fn all(&self) -> &[ScheduledReminder] {
        &self.reminders
    }

    pub fn get(&self, id: &str) -> Option<&ScheduledReminder> {
        self.reminders.iter().find(|r| r.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut ScheduledReminder> {
        self.reminders.iter_mut().find(|r| r.id == id)
    }

    /// `true` if a recurring settlement reminder is still waiting to fire.
    pub fn has_pending_settlement(&self) -> bool {
        self.reminders
            .iter()
            .any(|r| r.kind.is_settlement() && r.status == ReminderStatus::Pending)
    }

    /// Ids of pending reminders whose time has come, in queue order.
    pub fn due_ids(&self, now: DateTime<Utc>) -> Vec<String> {
        self.reminders
            .iter()
            .filter(|r| r.is_due(now))
            .map(|r| r.id.clone())
            .collect()
    }

    /// Append a reminder unless one with the same id already exists.
    ///
    /// Returns `None` for a duplicate id (nothing written).
    pub fn insert(&mut self, reminder: ScheduledReminder) -> Option<Durability> {
        if self.get(&reminder.id).is_some() {
            return None;
        }

        info!(
            id             = %reminder.id,
            scheduled_time = %reminder.scheduled_time,
            "Reminder queued"
        );
        self.reminders.push(reminder);
        Some(self.flush())
    }

    /// Explicit `pending → cancelled`.
    pub fn cancel(&mut self, id: &str) -> Result<ScheduledReminder, AppError> {
        let reminder = self
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("no reminder with id '{id}'")))?;
        reminder.cancel()?;
        let cancelled = reminder.clone();

        info!(id, "Reminder cancelled");
        self.flush();
        Ok(cancelled)
    }

    /// Drop terminal reminders scheduled before `cutoff`.  Pending reminders
    /// are always kept.  Returns how many were removed.
    pub fn prune_terminal(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.reminders.len();
        self.reminders
            .retain(|r| !(r.status.is_terminal() && r.scheduled_time < cutoff));
        let removed = before - self.reminders.len();

        if removed > 0 {
            info!(removed, "Pruned old reminders");
            self.flush();
        }
        removed
    }

    /// Write the whole queue back to the backend.
    pub fn flush(&self) -> Durability {
        Durability::from_write(
            save_json(self.backend.as_ref(), REMINDERS_KEY, &self.reminders),
            REMINDERS_KEY,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Amount, SettlementTransaction};
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 12, 9, 0, 0).unwrap()
    }

    fn followup(at: DateTime<Utc>) -> ScheduledReminder {
        let tx = SettlementTransaction::new("B", "A", Amount::from_minor(100));
        ScheduledReminder::followup(tx, at)
    }

    #[test]
    fn duplicate_ids_are_ignored() {
        let backend = Arc::new(MemoryStore::new());
        let mut store = ReminderStore::load(backend.clone());

        let r = ScheduledReminder::weekly_settlement(t0());
        assert_eq!(store.insert(r.clone()), Some(Durability::Persisted));
        assert_eq!(store.insert(r), None);
        assert_eq!(store.all().len(), 1);
        assert_eq!(backend.write_count(), 1);
        assert!(store.has_pending_settlement());
    }

    #[test]
    fn due_ids_respects_time_and_status() {
        let mut store = ReminderStore::load(Arc::new(MemoryStore::new()));
        let early = followup(t0());
        let late = followup(t0() + Duration::hours(1));
        let early_id = early.id.clone();
        store.insert(early);
        store.insert(late);

        assert!(store.due_ids(t0() - Duration::seconds(1)).is_empty());
        assert_eq!(store.due_ids(t0()), vec![early_id.clone()]);

        store.cancel(&early_id).unwrap();
        assert!(store.due_ids(t0()).is_empty());
        assert_eq!(store.due_ids(t0() + Duration::hours(2)).len(), 1);
    }

    #[test]
    fn cancel_unknown_or_terminal_fails() {
        let mut store = ReminderStore::load(Arc::new(MemoryStore::new()));
        assert!(matches!(store.cancel("nope"), Err(AppError::NotFound(_))));

        let r = followup(t0());
        let id = r.id.clone();
        store.insert(r);
        store.cancel(&id).unwrap();
        assert!(matches!(store.cancel(&id), Err(AppError::InvalidTransition(_))));
    }

    #[test]
    fn prune_keeps_pending_and_recent() {
        let mut store = ReminderStore::load(Arc::new(MemoryStore::new()));
        let old_done = followup(t0());
        let old_pending = followup(t0());
        let new_done = followup(t0() + Duration::days(30));
        let (old_done_id, new_done_id) = (old_done.id.clone(), new_done.id.clone());
        store.insert(old_done);
        store.insert(old_pending);
        store.insert(new_done);
        store.cancel(&old_done_id).unwrap();
        store.cancel(&new_done_id).unwrap();

        let removed = store.prune_terminal(t0() + Duration::days(7));
        assert_eq!(removed, 1);
        assert_eq!(store.all().len(), 2);
        assert!(store.get(&old_done_id).is_none());
    }

    #[test]
    fn queue_survives_reload() {
        let backend = Arc::new(MemoryStore::new());
        let mut store = ReminderStore::load(backend.clone());
        store.insert(ScheduledReminder::weekly_settlement(t0()));
        store.insert(followup(t0()));

        let reloaded = ReminderStore::load(backend);
        assert_eq!(reloaded.all(), store.all());
    }
}
