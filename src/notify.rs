//! # notify
//!
//! The notification gateway: the scheduler's only way to reach a human.
//!
//! Delivery is best-effort.  `show` never fails from the caller's point of
//! view; a notification nobody receives is logged and forgotten, and the
//! reminder that produced it still counts as fired.

use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::events::WsEvent;

// ─── Permission ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    Unsupported,
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "granted" => Ok(Permission::Granted),
            "denied" => Ok(Permission::Denied),
            "unsupported" => Ok(Permission::Unsupported),
            other => Err(format!(
                "unknown notification permission '{other}' (use granted, denied or unsupported)"
            )),
        }
    }
}

/// Opaque handle for a displayed notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NotificationHandle(pub Uuid);

// ─── Gateway ──────────────────────────────────────────────────────────────────

#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// Ask for (or report) permission to show notifications.
    async fn request_permission(&self) -> Permission;

    /// Display a notification.  A no-op returning `None` unless permission is
    /// granted.
    fn show(&self, title: &str, body: &str) -> Option<NotificationHandle>;
}

/// Delivers notifications as [`WsEvent::Notification`] frames to every
/// connected WebSocket client.
pub struct BroadcastGateway {
    tx:         broadcast::Sender<String>,
    permission: Permission,
}

impl BroadcastGateway {
    pub fn new(tx: broadcast::Sender<String>, permission: Permission) -> Self {
        Self { tx, permission }
    }
}

#[async_trait]
impl NotificationGateway for BroadcastGateway {
    async fn request_permission(&self) -> Permission {
        self.permission
    }

    fn show(&self, title: &str, body: &str) -> Option<NotificationHandle> {
        if self.permission != Permission::Granted {
            debug!(title, permission = ?self.permission, "Notification suppressed");
            return None;
        }

        let id = Uuid::new_v4();
        let event = WsEvent::Notification {
            id,
            title: title.to_string(),
            body:  body.to_string(),
        };

        // Err only means nobody is listening right now.
        match self.tx.send(event.to_json()) {
            Ok(receivers) => debug!(%id, title, receivers, "🔔 Notification sent"),
            Err(_) => debug!(%id, title, "🔕 Notification dropped, no clients connected"),
        }

        Some(NotificationHandle(id))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use super::*;

    /// Gateway double that records every `show` call.
    pub struct RecordingGateway {
        pub permission: Permission,
        shown:          Mutex<Vec<(String, String)>>,
    }

    impl RecordingGateway {
        pub fn new(permission: Permission) -> Self {
            Self { permission, shown: Mutex::new(Vec::new()) }
        }

        pub fn shown(&self) -> Vec<(String, String)> {
            self.shown.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NotificationGateway for RecordingGateway {
        async fn request_permission(&self) -> Permission {
            self.permission
        }

        fn show(&self, title: &str, body: &str) -> Option<NotificationHandle> {
            if self.permission != Permission::Granted {
                return None;
            }
            self.shown.lock().unwrap().push((title.to_string(), body.to_string()));
            Some(NotificationHandle(Uuid::new_v4()))
        }
    }
}
