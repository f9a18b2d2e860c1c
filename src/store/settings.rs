//! # store::settings
//!
//! Scalar settings, one key each, booleans string-encoded as `"true"` /
//! `"false"`.  A key that was never written means "enabled".

use std::sync::Arc;

use tracing::{info, warn};

use crate::models::{Settings, SettingsPatch, Theme};
use crate::store::kv::KeyValueStore;
use crate::store::{Durability, PUSH_NOTIFICATIONS_KEY, SETTLEMENT_REMINDERS_KEY, THEME_KEY};

pub struct SettingsStore {
    current: Settings,
    backend: Arc<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn load(backend: Arc<dyn KeyValueStore>) -> Self {
        let defaults = Settings::default();
        let read = |key: &str| match backend.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "⚠️ Could not read setting, using default");
                None
            }
        };

        let current = Settings {
            theme: read(THEME_KEY).map(|v| Theme::parse(&v)).unwrap_or(defaults.theme),
            push_notifications: read(PUSH_NOTIFICATIONS_KEY)
                .map(|v| v.trim() == "true")
                .unwrap_or(defaults.push_notifications),
            settlement_reminders: read(SETTLEMENT_REMINDERS_KEY)
                .map(|v| v.trim() == "true")
                .unwrap_or(defaults.settlement_reminders),
        };

        info!(?current, "⚙️ Settings loaded");
        Self { current, backend }
    }

    pub fn get(&self) -> Settings {
        self.current
    }

    /// Apply a partial update, writing only the keys that changed.
    pub fn apply(&mut self, patch: &SettingsPatch) -> Durability {
        let mut durability = Durability::Persisted;
        let mut write = |key: &str, value: &str| {
            let result = self.backend.set(key, value);
            if Durability::from_write(result, key) == Durability::MemoryOnly {
                durability = Durability::MemoryOnly;
            }
        };

        if let Some(theme) = patch.theme.filter(|t| *t != self.current.theme) {
            self.current.theme = theme;
            write(THEME_KEY, theme.as_str());
        }
        if let Some(on) = patch.push_notifications.filter(|v| *v != self.current.push_notifications) {
            self.current.push_notifications = on;
            write(PUSH_NOTIFICATIONS_KEY, bool_str(on));
        }
        if let Some(on) = patch.settlement_reminders.filter(|v| *v != self.current.settlement_reminders) {
            self.current.settlement_reminders = on;
            write(SETTLEMENT_REMINDERS_KEY, bool_str(on));
        }

        info!(settings = ?self.current, "Settings updated");
        durability
    }
}

fn bool_str(v: bool) -> &'static str {
    if v { "true" } else { "false" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn missing_keys_default_to_enabled() {
        let store = SettingsStore::load(Arc::new(MemoryStore::new()));
        let s = store.get();
        assert!(s.push_notifications);
        assert!(s.settlement_reminders);
        assert_eq!(s.theme, Theme::Light);
    }

    #[test]
    fn reads_string_encoded_booleans() {
        let backend = Arc::new(MemoryStore::new());
        backend.set(PUSH_NOTIFICATIONS_KEY, "false").unwrap();
        backend.set(THEME_KEY, "dark").unwrap();

        let s = SettingsStore::load(backend).get();
        assert!(!s.push_notifications);
        assert!(s.settlement_reminders);
        assert_eq!(s.theme, Theme::Dark);
    }

    #[test]
    fn apply_writes_only_changed_keys() {
        let backend = Arc::new(MemoryStore::new());
        let mut store = SettingsStore::load(backend.clone());

        let patch = SettingsPatch {
            theme: Some(Theme::Light),
            push_notifications: Some(true),
            settlement_reminders: Some(false),
        };
        assert_eq!(store.apply(&patch), Durability::Persisted);
        assert_eq!(backend.write_count(), 1);
        assert_eq!(backend.get(SETTLEMENT_REMINDERS_KEY).unwrap().as_deref(), Some("false"));

        let reloaded = SettingsStore::load(backend).get();
        assert!(!reloaded.settlement_reminders);
        assert!(!reloaded.auto_settlement_active());
    }
}
