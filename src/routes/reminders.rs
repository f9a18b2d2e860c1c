//! # routes::reminders
//!
//! | Method | Path                      | Description                            |
//! |--------|---------------------------|----------------------------------------|
//! | GET    | `/api/reminders`          | All reminders, optional `?status=`     |
//! | DELETE | `/api/reminders/:id`      | Cancel a pending reminder              |
//! | POST   | `/api/reminders/tick`     | Run one scheduler tick right now       |

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::AppError;
use crate::models::{ReminderStatus, ScheduledReminder};
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct ReminderQuery {
    pub status: Option<ReminderStatus>,
}

/// GET /api/reminders
pub async fn list_reminders(
    State(state): State<SharedState>,
    Query(query): Query<ReminderQuery>,
) -> impl IntoResponse {
    let store = state.reminders.read().await;
    let mut reminders: Vec<&ScheduledReminder> = store
        .all()
        .iter()
        .filter(|r| query.status.map_or(true, |s| r.status == s))
        .collect();
    reminders.sort_by_key(|r| r.scheduled_time);

    Json(json!({
        "ok":        true,
        "count":     reminders.len(),
        "reminders": reminders,
    }))
}

/// DELETE /api/reminders/:id
pub async fn cancel_reminder(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let reminder = state.scheduler.cancel(&id).await?;
    info!(id = %reminder.id, "🛑 Reminder cancelled");
    Ok(Json(json!({ "ok": true, "reminder": reminder })))
}

/// POST /api/reminders/tick
pub async fn run_tick(State(state): State<SharedState>) -> impl IntoResponse {
    let report = state.scheduler.tick(Utc::now()).await;
    Json(json!({ "ok": true, "tick": report }))
}
