//! # models::reminder
//!
//! [`ScheduledReminder`]: a notification queued for a future instant.
//!
//! ## Lifecycle
//!
//! ```text
//!            tick (scheduled_time ≤ now)
//!  Pending ───────────────────────────────▶ Triggered
//!     │
//!     └────── explicit cancel ────────────▶ Cancelled
//! ```
//!
//! `Triggered` and `Cancelled` are terminal; only `status` ever changes after
//! creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::settlement::SettlementTransaction;

// ─── Status ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Pending,
    Triggered,
    Cancelled,
}

impl ReminderStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ReminderStatus::Pending)
    }
}

// ─── Kind ─────────────────────────────────────────────────────────────────────

/// What created the reminder, and the payload that goes with it.
///
/// Serialised flat into the reminder as `"type"` plus an optional
/// `"metadata"` object, matching the persisted `scheduledReminders` blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReminderKind {
    /// Recurring weekly "settle up" nudge.
    Settlement,
    /// One-off nudge for a specific debt, requested by a user.
    Followup { metadata: FollowupMetadata },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowupMetadata {
    pub balance: SettlementTransaction,
}

impl ReminderKind {
    pub fn is_settlement(&self) -> bool {
        matches!(self, ReminderKind::Settlement)
    }
}

// ─── ScheduledReminder ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledReminder {
    pub id: String,
    pub title: String,
    pub body: String,
    /// Persisted as epoch milliseconds.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub scheduled_time: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: ReminderKind,
    pub status: ReminderStatus,
}

impl ScheduledReminder {
    /// The recurring settlement reminder for `at`.
    ///
    /// The id is derived from the target instant, so two attempts to schedule
    /// the same slot produce the same id.
    pub fn weekly_settlement(at: DateTime<Utc>) -> Self {
        Self {
            id:             settlement_reminder_id(at),
            title:          "SplitBhai: Settlement Time!".into(),
            body:           "Don't forget to settle up your pending balances for the week.".into(),
            scheduled_time: at,
            kind:           ReminderKind::Settlement,
            status:         ReminderStatus::Pending,
        }
    }

    /// A follow-up nudge about one specific debt.
    pub fn followup(balance: SettlementTransaction, at: DateTime<Utc>) -> Self {
        Self {
            id:             format!("followup-{}", Uuid::new_v4().simple()),
            title:          format!("Follow up: ₹{}", balance.amount),
            body:           format!(
                "Time to remind {} about the balance for {}.",
                balance.from, balance.to
            ),
            scheduled_time: at,
            kind:           ReminderKind::Followup { metadata: FollowupMetadata { balance } },
            status:         ReminderStatus::Pending,
        }
    }

    /// `true` when the reminder is pending and its time has come.
    ///
    /// Level check, not edge check: anything overdue stays due until fired.
    #[inline]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == ReminderStatus::Pending && self.scheduled_time <= now
    }

    pub fn trigger(&mut self) -> Result<(), AppError> {
        self.transition(ReminderStatus::Triggered)
    }

    pub fn cancel(&mut self) -> Result<(), AppError> {
        self.transition(ReminderStatus::Cancelled)
    }

    fn transition(&mut self, to: ReminderStatus) -> Result<(), AppError> {
        if self.status.is_terminal() {
            return Err(AppError::InvalidTransition(format!(
                "reminder {} is already {:?}, cannot move to {:?}",
                self.id, self.status, to
            )));
        }
        self.status = to;
        Ok(())
    }
}

pub fn settlement_reminder_id(at: DateTime<Utc>) -> String {
    format!("weekly-settlement-{}", at.timestamp_millis())
}
