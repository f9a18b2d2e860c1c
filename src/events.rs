//! # events
//!
//! Defines [`WsEvent`]: every event the core broadcasts to connected host
//! clients over the `/ws/notifications` WebSocket.
//!
//! Uses `tokio::sync::broadcast::Sender<String>`, serialising each event to a
//! JSON string before sending to sidestep `Clone` bounds on the payloads.

use serde::Serialize;

use crate::models::{ExpenseRecord, ScheduledReminder, Settings};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WsEvent {
    /// A notification for the host to display.
    Notification {
        id:    uuid::Uuid,
        title: String,
        body:  String,
    },

    /// A new expense was appended; balances should be re-fetched.
    ExpenseAdded {
        expense: Box<ExpenseRecord>,
    },

    /// A reminder was queued (auto-scheduled or follow-up).
    ReminderScheduled {
        reminder: Box<ScheduledReminder>,
    },

    /// A reminder left the `pending` state.
    ReminderUpdated {
        reminder: Box<ScheduledReminder>,
    },

    SettingsChanged {
        settings: Settings,
    },
}

impl WsEvent {
    /// Serialise for a WebSocket text frame.
    #[inline]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"event":"SERIALIZATION_ERROR"}"#.to_string())
    }
}
