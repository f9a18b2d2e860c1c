pub mod balances;
pub mod expenses;
pub mod monitor;
pub mod reminders;
pub mod settings;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::state::SharedState;

/// All API and WebSocket routes, without middleware.
pub fn router(state: SharedState) -> Router {
    Router::new()
        // ── Expenses ─────────────────────────────────────────────────────────
        .route("/api/expenses",         get(expenses::list_expenses).post(expenses::add_expense))
        .route("/api/expenses/extract", post(expenses::extract_expense))
        // ── Balances ─────────────────────────────────────────────────────────
        .route("/api/balances",         get(balances::get_balances))
        .route("/api/balances/remind",  post(balances::remind_balance))
        // ── Reminders ────────────────────────────────────────────────────────
        .route("/api/reminders",        get(reminders::list_reminders))
        .route("/api/reminders/tick",   post(reminders::run_tick))
        .route("/api/reminders/:id",    delete(reminders::cancel_reminder))
        // ── Settings ─────────────────────────────────────────────────────────
        .route("/api/settings",         get(settings::get_settings).put(settings::update_settings))
        // ── Monitor ──────────────────────────────────────────────────────────
        .route("/api/health",           get(monitor::health_check))
        .route("/ws/notifications",     get(monitor::ws_notifications))
        .with_state(state)
}
