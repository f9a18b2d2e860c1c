//! # models::settings
//!
//! User-facing toggles the scheduler consults on every tick.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Anything other than `"dark"` falls back to light.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("dark") {
            Theme::Dark
        } else {
            Theme::Light
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub theme: Theme,
    /// Master switch for delivering notifications.
    pub push_notifications: bool,
    /// Weekly auto-scheduled settlement reminder.
    pub settlement_reminders: bool,
}

impl Default for Settings {
    /// Both toggles start enabled until the user turns them off.
    fn default() -> Self {
        Self {
            theme:                Theme::Light,
            push_notifications:   true,
            settlement_reminders: true,
        }
    }
}

impl Settings {
    /// The recurring settlement policy only runs when both toggles are on.
    pub fn auto_settlement_active(&self) -> bool {
        self.push_notifications && self.settlement_reminders
    }
}

/// Partial update sent by the host; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub theme: Option<Theme>,
    pub push_notifications: Option<bool>,
    pub settlement_reminders: Option<bool>,
}

impl SettingsPatch {
    /// `true` if the patch switches on a toggle that is currently off.
    pub fn enables_notifications(&self, current: &Settings) -> bool {
        let push_on = self.push_notifications == Some(true) && !current.push_notifications;
        let settle_on = self.settlement_reminders == Some(true) && !current.settlement_reminders;
        push_on || settle_on
    }
}
