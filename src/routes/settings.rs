//! # routes::settings
//!
//! | Method | Path            | Description                                  |
//! |--------|-----------------|----------------------------------------------|
//! | GET    | `/api/settings` | Theme and notification toggles               |
//! | PUT    | `/api/settings` | Partial update; switching a toggle on needs notification permission |

use axum::{extract::State, response::IntoResponse, Json};
use chrono::Local;
use serde_json::json;
use tracing::{info, warn};

use crate::error::AppError;
use crate::events::WsEvent;
use crate::models::SettingsPatch;
use crate::notify::Permission;
use crate::state::SharedState;

/// GET /api/settings
pub async fn get_settings(State(state): State<SharedState>) -> impl IntoResponse {
    let settings = state.settings.read().await.get();
    Json(json!({ "ok": true, "settings": settings }))
}

/// PUT /api/settings
///
/// Turning a toggle off always succeeds.  After any change the weekly
/// settlement policy is re-evaluated, so enabling it queues the next Sunday
/// reminder straight away.
pub async fn update_settings(
    State(state): State<SharedState>,
    Json(patch): Json<SettingsPatch>,
) -> Result<impl IntoResponse, AppError> {
    let current = state.settings.read().await.get();

    if patch.enables_notifications(&current) {
        let permission = state.gateway.request_permission().await;
        if permission != Permission::Granted {
            warn!(?permission, "Settings change refused, notification permission not granted");
            return Err(AppError::PermissionDenied(format!(
                "notification permission is {permission:?}; cannot enable notifications"
            )));
        }
    }

    let (settings, durability) = {
        let mut store = state.settings.write().await;
        let durability = store.apply(&patch);
        (store.get(), durability)
    };

    if settings != current {
        info!(
            theme                = settings.theme.as_str(),
            push_notifications   = settings.push_notifications,
            settlement_reminders = settings.settlement_reminders,
            "⚙️ Settings updated"
        );
        state.broadcast(&WsEvent::SettingsChanged { settings });
    }

    let scheduled = state.scheduler.schedule_auto_settlement(&Local::now()).await;

    Ok(Json(json!({
        "ok":         true,
        "settings":   settings,
        "durability": durability,
        "scheduled":  scheduled,
    })))
}
