//! # extract
//!
//! Turns a free-text description or a bill photo into a draft expense.
//!
//! The model's answer is untrusted: it is parsed into [`AIProcessedExpense`]
//! and then run through the same validation as a hand-entered expense before
//! anything is stored.  Extraction never writes; the host previews the draft
//! and submits it through `POST /api/expenses` once the user confirms.

pub mod ai;
pub mod prompt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{Amount, NewExpense, Split};

pub use ai::AiExtractor;

/// Image formats the bill parser accepts.
pub const SUPPORTED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

// ─── Extracted Draft ──────────────────────────────────────────────────────────

/// What the bill parser hands back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AIProcessedExpense {
    pub description:  String,
    pub total_amount: Amount,
    pub payer:        String,
    pub splits:       Vec<Split>,
    /// Friendly reminder text the host may show or share with the group.
    #[serde(default)]
    pub reminders:    String,
}

impl AIProcessedExpense {
    pub fn into_new_expense(self) -> NewExpense {
        NewExpense {
            description:  self.description,
            total_amount: self.total_amount,
            payer:        self.payer,
            splits:       self.splits,
            category:     None,
        }
    }

    /// Check the draft against the expense invariants without consuming it.
    ///
    /// Splits that miss the total are still `valid` (the expense would be
    /// accepted as written) but the gap is reported in `issue`.
    pub fn preview(self) -> ExtractionPreview {
        let draft = self.clone().into_new_expense();
        let (valid, issue) = match draft.validate() {
            Err(e) => (false, Some(e.to_string())),
            Ok(()) => (true, draft.split_issue()),
        };
        ExtractionPreview { valid, issue, expense: self }
    }
}

/// Draft plus validation verdict, as returned by `POST /api/expenses/extract`.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionPreview {
    pub expense: AIProcessedExpense,
    pub valid:   bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue:   Option<String>,
}

// ─── Extractor ────────────────────────────────────────────────────────────────

#[async_trait]
pub trait ExpenseExtractor: Send + Sync {
    async fn extract_from_text(&self, text: &str) -> Result<AIProcessedExpense, AppError>;

    async fn extract_from_image(
        &self,
        bytes: &[u8],
        mime_type: &str,
    ) -> Result<AIProcessedExpense, AppError>;
}

/// Stand-in used when no `AI_API_KEY` is configured.
pub struct DisabledExtractor;

#[async_trait]
impl ExpenseExtractor for DisabledExtractor {
    async fn extract_from_text(&self, _text: &str) -> Result<AIProcessedExpense, AppError> {
        Err(AppError::ExtractionFailed("bill parser is not configured (set AI_API_KEY)".into()))
    }

    async fn extract_from_image(
        &self,
        _bytes: &[u8],
        _mime_type: &str,
    ) -> Result<AIProcessedExpense, AppError> {
        Err(AppError::ExtractionFailed("bill parser is not configured (set AI_API_KEY)".into()))
    }
}

// ─── Response Parsing ─────────────────────────────────────────────────────────

/// Parse the model's raw text into a draft, tolerating a code fence around it.
pub fn parse_response(raw: &str) -> Result<AIProcessedExpense, AppError> {
    let cleaned = strip_markdown(raw);
    serde_json::from_str(&cleaned)
        .map_err(|e| AppError::ExtractionFailed(format!("model returned invalid JSON ({e}): {cleaned}")))
}

fn strip_markdown(text: &str) -> String {
    let text = text.trim();
    if let Some(inner) = text.strip_prefix("```json") {
        inner.trim_end_matches("```").trim().to_string()
    } else if let Some(inner) = text.strip_prefix("```") {
        inner.trim_end_matches("```").trim().to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Extractor double that answers every call with a canned model reply.
    pub struct CannedExtractor(pub String);

    #[async_trait]
    impl ExpenseExtractor for CannedExtractor {
        async fn extract_from_text(&self, _text: &str) -> Result<AIProcessedExpense, AppError> {
            parse_response(&self.0)
        }

        async fn extract_from_image(
            &self,
            _bytes: &[u8],
            _mime_type: &str,
        ) -> Result<AIProcessedExpense, AppError> {
            parse_response(&self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DINNER: &str = r#"{
        "description": "Dinner at Barbeque Nation",
        "totalAmount": 900,
        "payer": "Rahul",
        "splits": [
            {"name": "Rahul", "amount": 300},
            {"name": "Amit",  "amount": 300},
            {"name": "Priya", "amount": 300}
        ],
        "reminders": "Bhai, 300 bhej dena!"
    }"#;

    #[test]
    fn parses_plain_json() {
        let draft = parse_response(DINNER).unwrap();
        assert_eq!(draft.payer, "Rahul");
        assert_eq!(draft.total_amount, Amount::from_minor(90_000));
        assert_eq!(draft.splits.len(), 3);
    }

    #[test]
    fn strips_code_fences() {
        let fenced = format!("```json\n{DINNER}\n```");
        assert_eq!(parse_response(&fenced).unwrap(), parse_response(DINNER).unwrap());

        let bare = format!("```\n{DINNER}\n```");
        assert!(parse_response(&bare).is_ok());
    }

    #[test]
    fn garbage_is_extraction_failure() {
        let err = parse_response("Sorry, I can't read that bill.").unwrap_err();
        assert!(matches!(err, AppError::ExtractionFailed(_)));
    }

    #[test]
    fn preview_flags_splits_that_do_not_add_up() {
        let mut draft = parse_response(DINNER).unwrap();
        assert!(draft.clone().preview().valid);

        draft.splits[2].amount = Amount::from_minor(25_000);
        let preview = draft.clone().preview();
        assert!(preview.valid);
        assert!(preview.issue.unwrap().contains("splits sum to 850.00"));

        draft.payer = " ".into();
        let preview = draft.preview();
        assert!(!preview.valid);
        assert!(preview.issue.unwrap().contains("payer"));
    }

    #[tokio::test]
    async fn disabled_extractor_refuses() {
        let result = DisabledExtractor.extract_from_text("chai 40").await;
        assert!(matches!(result, Err(AppError::ExtractionFailed(_))));
    }
}
