//! # engine::scheduler
//!
//! **Reminder Scheduler**: turns wall-clock time into notifications.
//!
//! ## Operations
//!
//! ```text
//!  tick(now)                      pending ∧ scheduled_time ≤ now ──▶ triggered
//!                                 (notify first if push is on; transition always)
//!
//!  schedule_auto_settlement(now)  settlement ∧ push on, no pending settlement
//!                                 ──▶ queue "next Sunday 10:00 local"
//!
//!  schedule_followup(tx, lead)    permission granted ──▶ queue now + lead
//! ```
//!
//! The scheduler owns no state: every call reads the stores, transforms, and
//! issues a single write before returning.  `tick` holds the reminder store's
//! write guard for the whole scan → notify → transition → persist sequence,
//! so a reminder can never fire twice even with concurrent callers.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc, Weekday};
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::events::WsEvent;
use crate::models::{ScheduledReminder, SettlementTransaction, EPSILON};
use crate::notify::{NotificationGateway, Permission};
use crate::store::{Durability, ReminderStore, SettingsStore};

/// Weekly slot for the recurring settlement reminder.
pub const SETTLEMENT_WEEKDAY: Weekday = Weekday::Sun;
pub const SETTLEMENT_HOUR: u32 = 10;

// ─── Weekly Slot ──────────────────────────────────────────────────────────────

/// Next Sunday 10:00 in `now`'s timezone, strictly after `now`.
///
/// On a Sunday at or after 10:00 this rolls to the following Sunday.
/// Returns `None` only if 10:00 does not exist that day in the timezone.
pub fn next_settlement_slot<Tz: TimeZone>(now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
    let slot_time = NaiveTime::from_hms_opt(SETTLEMENT_HOUR, 0, 0)?;
    let today = now.date_naive();

    let mut days_ahead = (SETTLEMENT_WEEKDAY.num_days_from_monday() as i64
        - today.weekday().num_days_from_monday() as i64)
        .rem_euclid(7);
    if days_ahead == 0 && now.time() >= slot_time {
        days_ahead = 7;
    }

    let target = (today + Duration::days(days_ahead)).and_time(slot_time);
    now.timezone()
        .from_local_datetime(&target)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

/// The settlement reminder to create right now, if the policy calls for one.
pub fn plan_auto_settlement<Tz: TimeZone>(
    store: &ReminderStore,
    enabled: bool,
    now: &DateTime<Tz>,
) -> Option<ScheduledReminder> {
    if !enabled || store.has_pending_settlement() {
        return None;
    }
    next_settlement_slot(now).map(ScheduledReminder::weekly_settlement)
}

// ─── Tick Report ──────────────────────────────────────────────────────────────

/// Outcome of one `tick`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Ids moved from `pending` to `triggered`.
    pub fired: Vec<String>,
    /// How many of those produced a displayed notification.
    pub delivered: usize,
    /// `None` when nothing changed and nothing was written.
    pub durability: Option<Durability>,
}

impl TickReport {
    fn idle() -> Self {
        Self { fired: Vec::new(), delivered: 0, durability: None }
    }
}

// ─── Scheduler ────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ReminderScheduler {
    reminders: Arc<RwLock<ReminderStore>>,
    settings:  Arc<RwLock<SettingsStore>>,
    gateway:   Arc<dyn NotificationGateway>,
    events:    broadcast::Sender<String>,
}

impl ReminderScheduler {
    pub fn new(
        reminders: Arc<RwLock<ReminderStore>>,
        settings: Arc<RwLock<SettingsStore>>,
        gateway: Arc<dyn NotificationGateway>,
        events: broadcast::Sender<String>,
    ) -> Self {
        Self { reminders, settings, gateway, events }
    }

    fn broadcast(&self, event: &WsEvent) {
        let _ = self.events.send(event.to_json());
    }

    /// Fire every pending reminder that is due at `now`.
    ///
    /// Idempotent when nothing is due: no notification, no write.
    pub async fn tick(&self, now: DateTime<Utc>) -> TickReport {
        let push_enabled = self.settings.read().await.get().push_notifications;
        let mut store = self.reminders.write().await;

        let due = store.due_ids(now);
        if due.is_empty() {
            debug!(%now, "Tick, nothing due");
            return TickReport::idle();
        }

        let mut report = TickReport::idle();
        for id in due {
            let Some(reminder) = store.get_mut(&id) else { continue };

            if push_enabled {
                match self.gateway.show(&reminder.title, &reminder.body) {
                    Some(_) => report.delivered += 1,
                    None => warn!(id = %reminder.id, "Reminder fired but notification was not shown"),
                }
            }

            if let Err(e) = reminder.trigger() {
                warn!(id = %reminder.id, error = %e, "Skipping reminder that is no longer pending");
                continue;
            }

            info!(
                id             = %reminder.id,
                scheduled_time = %reminder.scheduled_time,
                lateness_secs  = (now - reminder.scheduled_time).num_seconds(),
                notified       = push_enabled,
                "⏰ Reminder triggered"
            );
            self.broadcast(&WsEvent::ReminderUpdated { reminder: Box::new(reminder.clone()) });
            report.fired.push(id);
        }

        if !report.fired.is_empty() {
            report.durability = Some(store.flush());
        }
        report
    }

    /// Queue the weekly settlement reminder if the policy is on and none is
    /// pending.  Returns the newly queued reminder.
    pub async fn schedule_auto_settlement<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
    ) -> Option<ScheduledReminder> {
        let enabled = self.settings.read().await.get().auto_settlement_active();
        let mut store = self.reminders.write().await;

        let reminder = plan_auto_settlement(&store, enabled, now)?;
        store.insert(reminder.clone())?;

        info!(
            id             = %reminder.id,
            scheduled_time = %reminder.scheduled_time,
            "📅 Weekly settlement reminder scheduled"
        );
        self.broadcast(&WsEvent::ReminderScheduled { reminder: Box::new(reminder.clone()) });
        Some(reminder)
    }

    /// Queue a one-off follow-up about `balance`, firing at `now + lead_time`.
    ///
    /// Every call creates a separate reminder.
    pub async fn schedule_followup(
        &self,
        balance: SettlementTransaction,
        lead_time: Duration,
        now: DateTime<Utc>,
    ) -> Result<ScheduledReminder, AppError> {
        if balance.amount <= EPSILON || balance.from == balance.to {
            return Err(AppError::BadRequest(format!(
                "not a payable balance: {} → {} {}",
                balance.from, balance.to, balance.amount
            )));
        }

        if !self.settings.read().await.get().push_notifications {
            return Err(AppError::PermissionDenied(
                "notifications are turned off; enable them in settings first".into(),
            ));
        }

        let permission = self.gateway.request_permission().await;
        if permission != Permission::Granted {
            warn!(?permission, "Follow-up refused, notification permission not granted");
            return Err(AppError::PermissionDenied(format!(
                "notification permission is {permission:?}; cannot schedule reminders"
            )));
        }

        let fire_at = now
            .checked_add_signed(lead_time)
            .filter(|_| lead_time >= Duration::zero())
            .ok_or_else(|| AppError::BadRequest(format!("lead time {lead_time} is out of range")))?;

        let reminder = ScheduledReminder::followup(balance, fire_at);
        {
            let mut store = self.reminders.write().await;
            store.insert(reminder.clone());
        }

        info!(
            id             = %reminder.id,
            scheduled_time = %reminder.scheduled_time,
            "🔔 Follow-up reminder scheduled"
        );
        self.broadcast(&WsEvent::ReminderScheduled { reminder: Box::new(reminder.clone()) });
        Ok(reminder)
    }

    /// Explicit `pending → cancelled`.
    pub async fn cancel(&self, id: &str) -> Result<ScheduledReminder, AppError> {
        let cancelled = self.reminders.write().await.cancel(id)?;
        self.broadcast(&WsEvent::ReminderUpdated { reminder: Box::new(cancelled.clone()) });
        Ok(cancelled)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
