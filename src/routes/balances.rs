//! # routes::balances
//!
//! | Method | Path                   | Description                                |
//! |--------|------------------------|--------------------------------------------|
//! | GET    | `/api/balances`        | Net positions and who pays whom            |
//! | POST   | `/api/balances/remind` | Schedule a follow-up reminder for one debt |

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::engine::{balance::settle_positions, net_positions};
use crate::error::AppError;
use crate::models::{Amount, SettlementTransaction};
use crate::state::SharedState;

/// GET /api/balances
///
/// Recomputed from the full expense history on every call.
pub async fn get_balances(State(state): State<SharedState>) -> impl IntoResponse {
    let (positions, transactions) = {
        let store = state.expenses.read().await;
        let positions = net_positions(store.all());
        let transactions = settle_positions(&positions);
        (positions, transactions)
    };

    Json(json!({
        "ok":           true,
        "settled":      transactions.is_empty(),
        "positions":    positions,
        "transactions": transactions,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemindBody {
    pub from:         String,
    pub to:           String,
    pub amount:       Amount,
    /// Falls back to `FOLLOWUP_LEAD_MINS`.
    pub lead_minutes: Option<i64>,
}

/// POST /api/balances/remind
pub async fn remind_balance(
    State(state): State<SharedState>,
    Json(body): Json<RemindBody>,
) -> Result<impl IntoResponse, AppError> {
    let lead = match body.lead_minutes {
        Some(m) if m < 0 => {
            return Err(AppError::BadRequest("leadMinutes cannot be negative".into()))
        }
        Some(m) => Duration::try_minutes(m)
            .ok_or_else(|| AppError::BadRequest(format!("leadMinutes {m} is out of range")))?,
        None => state.config.followup_lead,
    };

    let balance = SettlementTransaction::new(body.from, body.to, body.amount);
    let reminder = state.scheduler.schedule_followup(balance, lead, Utc::now()).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "ok":            true,
            "scheduledTime": reminder.scheduled_time,
            "reminder":      reminder,
        })),
    ))
}
