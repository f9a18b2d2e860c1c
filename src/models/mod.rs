//! Domain models shared across the entire SplitBhai core.

pub mod expense;
pub mod money;
pub mod reminder;
pub mod settings;
pub mod settlement;

pub use expense::{ExpenseRecord, NewExpense, Split};
pub use money::{Amount, EPSILON, MAX_AMOUNT};
pub use reminder::{ReminderKind, ReminderStatus, ScheduledReminder};
pub use settings::{Settings, SettingsPatch, Theme};
pub use settlement::{NetPosition, SettlementTransaction};
