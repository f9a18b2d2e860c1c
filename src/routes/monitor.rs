//! # routes::monitor
//!
//! | Method    | Path                | Description                                |
//! |-----------|---------------------|--------------------------------------------|
//! | GET (WS)  | `/ws/notifications` | Live notifications and store events        |
//! | GET       | `/api/health`       | Liveness plus store counters               |

use std::sync::atomic::Ordering;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tracing::{debug, info};

use crate::models::ReminderStatus;
use crate::state::SharedState;

// ─── WebSocket Handler ────────────────────────────────────────────────────────

/// Upgrade to a WebSocket and relay every broadcast [`WsEvent`] as a JSON
/// text frame.
///
/// [`WsEvent`]: crate::events::WsEvent
pub async fn ws_notifications(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: SharedState) {
    let mut rx = state.broadcast_tx.subscribe();
    let (mut sender, mut receiver) = socket.split();

    info!("🔌 WebSocket client connected");

    // ── Snapshot on connect ───────────────────────────────────────────────────
    let snapshot = {
        let settings = state.settings.read().await.get();
        let pending = state
            .reminders
            .read()
            .await
            .all()
            .iter()
            .filter(|r| r.status == ReminderStatus::Pending)
            .count();
        let expenses = state.expenses.read().await.len();

        json!({
            "event":            "SNAPSHOT",
            "settings":         settings,
            "pendingReminders": pending,
            "expenseCount":     expenses,
        })
        .to_string()
    };

    if sender.send(Message::Text(snapshot)).await.is_err() {
        return;
    }

    // ── Event Loop ────────────────────────────────────────────────────────────
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(json_str) => {
                        if sender.send(Message::Text(json_str)).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        debug!("WS client lagged, skipped {n} events");
                    }
                    Err(_) => break,
                }
            }

            result = receiver.next() => {
                match result {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    _ => {}
                }
            }
        }
    }

    info!("🔌 WebSocket client disconnected");
}

// ─── Health ───────────────────────────────────────────────────────────────────

/// GET /api/health
pub async fn health_check(State(state): State<SharedState>) -> impl IntoResponse {
    let expense_count = state.expenses.read().await.len();
    let (pending, total_reminders) = {
        let store = state.reminders.read().await;
        let pending = store.all().iter().filter(|r| r.status == ReminderStatus::Pending).count();
        (pending, store.all().len())
    };

    Json(json!({
        "ok":               true,
        "status":           "running",
        "uptimeSecs":       (Utc::now() - state.started_at).num_seconds(),
        "expenseCount":     expense_count,
        "expensesAdded":    state.expenses_added.load(Ordering::Relaxed),
        "pendingReminders": pending,
        "totalReminders":   total_reminders,
        "clients":          state.broadcast_tx.receiver_count(),
    }))
}
