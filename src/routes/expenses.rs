//! # routes::expenses
//!
//! | Method | Path                    | Description                                 |
//! |--------|-------------------------|---------------------------------------------|
//! | GET    | `/api/expenses`         | History plus total group spending           |
//! | POST   | `/api/expenses`         | Validate and append a new expense           |
//! | POST   | `/api/expenses/extract` | Draft an expense from text or a bill photo  |

use std::sync::atomic::Ordering;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::error::AppError;
use crate::events::WsEvent;
use crate::models::{Amount, NewExpense};
use crate::state::SharedState;

/// GET /api/expenses
pub async fn list_expenses(State(state): State<SharedState>) -> impl IntoResponse {
    let store = state.expenses.read().await;
    let total = store.total_spent();
    let average = if store.is_empty() {
        Amount::ZERO
    } else {
        Amount::new(total.decimal() / Decimal::from(store.len()))
    };

    Json(json!({
        "ok":                true,
        "count":             store.len(),
        "totalSpent":        total,
        "averagePerExpense": average,
        "expenses":          store.all(),
    }))
}

/// POST /api/expenses
///
/// The record is validated before anything is written.  Splits that miss the
/// total by more than ε are stored as given and reported in `issue`.  A storage
/// failure still accepts the expense for this session and reports `memory_only`.
pub async fn add_expense(
    State(state): State<SharedState>,
    Json(body): Json<NewExpense>,
) -> Result<impl IntoResponse, AppError> {
    let record = body.into_record(Utc::now())?;
    let issue = record.split_issue();
    if let Some(issue) = &issue {
        warn!(id = %record.id, %issue, "Accepting expense with unbalanced splits");
    }

    let durability = state.expenses.write().await.append(record.clone());
    state.expenses_added.fetch_add(1, Ordering::Relaxed);

    info!(
        id     = %record.id,
        payer  = %record.payer,
        amount = %record.total_amount,
        ?durability,
        "💸 Expense added"
    );
    state.broadcast(&WsEvent::ExpenseAdded { expense: Box::new(record.clone()) });

    if state.settings.read().await.get().push_notifications {
        let body = format!("Added ₹{} for {}", record.total_amount, record.description);
        if state.gateway.show("Expense Added!", &body).is_none() {
            warn!(id = %record.id, "Expense notification was not shown");
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "ok":         true,
            "splitGap":   record.split_gap(),
            "issue":      issue,
            "expense":    record,
            "durability": durability,
        })),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractBody {
    pub text:         Option<String>,
    /// Raw base64 or a full `data:<mime>;base64,...` URL.
    pub image_base64: Option<String>,
    pub mime_type:    Option<String>,
}

/// POST /api/expenses/extract
///
/// Returns the parsed draft and whether it would pass validation.  Nothing
/// is stored.
pub async fn extract_expense(
    State(state): State<SharedState>,
    Json(body): Json<ExtractBody>,
) -> Result<impl IntoResponse, AppError> {
    let draft = match (body.text, body.image_base64) {
        (Some(text), None) => state.extractor.extract_from_text(&text).await?,
        (None, Some(encoded)) => {
            let (data_url_mime, payload) = split_data_url(&encoded);
            let mime_type = body
                .mime_type
                .or(data_url_mime)
                .ok_or_else(|| AppError::BadRequest("mimeType is required for images".into()))?;
            let bytes = BASE64
                .decode(payload.trim())
                .map_err(|e| AppError::BadRequest(format!("imageBase64 is not valid base64: {e}")))?;
            state.extractor.extract_from_image(&bytes, &mime_type).await?
        }
        (Some(_), Some(_)) => {
            return Err(AppError::BadRequest("send either text or imageBase64, not both".into()))
        }
        (None, None) => return Err(AppError::BadRequest("text or imageBase64 is required".into())),
    };

    let preview = draft.preview();
    Ok(Json(json!({ "ok": true, "preview": preview })))
}

/// Split `data:image/png;base64,AAAA` into (`Some("image/png")`, `"AAAA"`).
fn split_data_url(encoded: &str) -> (Option<String>, &str) {
    encoded
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(mime, payload)| (Some(mime.to_string()), payload))
        .unwrap_or((None, encoded))
}
