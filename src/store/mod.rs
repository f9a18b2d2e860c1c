//! # store
//!
//! Process-wide owners of all mutable state.  Each store loads its blob at
//! startup and writes it back on every change; the balance engine and the
//! reminder scheduler keep nothing of their own.
//!
//! A failed write never loses the change: the in-memory copy stays
//! authoritative for the rest of the session and the caller is told the
//! change is [`Durability::MemoryOnly`].

pub mod expenses;
pub mod kv;
pub mod reminders;
pub mod settings;

use serde::Serialize;
use thiserror::Error;

pub use expenses::ExpenseStore;
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use reminders::ReminderStore;
pub use settings::SettingsStore;

// ─── Keys ─────────────────────────────────────────────────────────────────────

pub const EXPENSES_KEY: &str = "expenses";
pub const REMINDERS_KEY: &str = "scheduledReminders";
pub const THEME_KEY: &str = "theme";
pub const PUSH_NOTIFICATIONS_KEY: &str = "pushNotifications";
pub const SETTLEMENT_REMINDERS_KEY: &str = "settlementReminders";

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("blob '{key}' is not valid JSON: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Unavailable(String),
}

// ─── Durability ───────────────────────────────────────────────────────────────

/// Whether a mutation reached the persistent backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Durability {
    Persisted,
    MemoryOnly,
}

impl Durability {
    pub fn from_write(result: Result<(), StoreError>, key: &str) -> Self {
        match result {
            Ok(()) => Durability::Persisted,
            Err(e) => {
                tracing::warn!(key, error = %e, "⚠️ Persist failed, keeping change in memory only");
                Durability::MemoryOnly
            }
        }
    }
}
