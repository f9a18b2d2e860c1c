//! # models::expense
//!
//! [`ExpenseRecord`]: one shared bill: who paid, how much, and who owes which
//! share.  Records are immutable once appended to the expense store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::money::{Amount, EPSILON, MAX_AMOUNT};

// ─── Split ────────────────────────────────────────────────────────────────────

/// One participant's share of an expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    /// Person name; identity is exact string match.
    pub name: String,
    /// Amount this person owes towards the bill.
    pub amount: Amount,
}

impl Split {
    pub fn new(name: impl Into<String>, amount: Amount) -> Self {
        Self { name: name.into(), amount }
    }
}

// ─── ExpenseRecord ────────────────────────────────────────────────────────────

/// A stored expense.  Field names follow the persisted `expenses` blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    pub id: String,
    pub description: String,
    pub total_amount: Amount,
    pub payer: String,
    /// Creation instant.
    pub date: DateTime<Utc>,
    pub splits: Vec<Split>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ExpenseRecord {
    /// Sum of all split amounts.
    pub fn split_total(&self) -> Amount {
        self.splits.iter().map(|s| s.amount).sum()
    }

    /// Signed gap between `total_amount` and the split sum.
    ///
    /// Records may carry a gap (legacy data, rounding, a caller that chose
    /// to); the balance engine credits and debits the stored numbers as-is.
    pub fn split_gap(&self) -> Amount {
        self.total_amount - self.split_total()
    }

    /// Human-readable note when the splits miss the total by more than ε.
    pub fn split_issue(&self) -> Option<String> {
        split_issue(self.total_amount, &self.splits)
    }

    /// `true` if any amount lies outside `±MAX_AMOUNT`.
    pub fn has_out_of_range_amount(&self) -> bool {
        std::iter::once(self.total_amount)
            .chain(self.splits.iter().map(|s| s.amount))
            .any(|a| a.abs() > MAX_AMOUNT)
    }
}

fn split_issue(total: Amount, splits: &[Split]) -> Option<String> {
    let split_sum: Amount = splits.iter().map(|s| s.amount).sum();
    ((total - split_sum).abs() > EPSILON).then(|| {
        format!("splits sum to {split_sum} but totalAmount is {total} (tolerance {EPSILON})")
    })
}

fn check_amount(field: &str, amount: Amount) -> Result<(), AppError> {
    if amount.is_negative() {
        return Err(AppError::Validation(format!("{field} must not be negative (got {amount})")));
    }
    if amount > MAX_AMOUNT {
        return Err(AppError::Validation(format!(
            "{field} is too large (got {amount}, maximum {MAX_AMOUNT})"
        )));
    }
    Ok(())
}

// ─── NewExpense ───────────────────────────────────────────────────────────────

/// Expense payload coming from the host (manual entry or a confirmed AI
/// preview) before it is given an id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub description: String,
    pub total_amount: Amount,
    pub payer: String,
    pub splits: Vec<Split>,
    #[serde(default)]
    pub category: Option<String>,
}

impl NewExpense {
    /// Reject payloads that cannot be an expense at all.
    ///
    /// A split sum that misses the total is *not* an error here: the record
    /// is stored exactly as given and the gap is reported through
    /// [`NewExpense::split_issue`].  Values are never renormalised.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.payer.trim().is_empty() {
            return Err(AppError::Validation("payer must not be empty".into()));
        }
        check_amount("totalAmount", self.total_amount)?;
        if self.splits.is_empty() {
            return Err(AppError::Validation("at least one split is required".into()));
        }
        for split in &self.splits {
            if split.name.trim().is_empty() {
                return Err(AppError::Validation("split name must not be empty".into()));
            }
            check_amount(&format!("split amount for {}", split.name), split.amount)?;
        }
        Ok(())
    }

    pub fn split_issue(&self) -> Option<String> {
        split_issue(self.total_amount, &self.splits)
    }

    /// Validate and stamp the payload with a fresh id and creation instant.
    pub fn into_record(self, now: DateTime<Utc>) -> Result<ExpenseRecord, AppError> {
        self.validate()?;

        Ok(ExpenseRecord {
            id:           Uuid::new_v4().to_string(),
            description:  self.description.trim().to_string(),
            total_amount: self.total_amount,
            payer:        self.payer,
            date:         now,
            splits:       self.splits,
            category:     self.category,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amt(minor: i64) -> Amount {
        Amount::from_minor(minor)
    }

    fn dinner() -> NewExpense {
        NewExpense {
            description:  "Dinner at Taj".into(),
            total_amount: amt(500_000),
            payer:        "Amit".into(),
            splits: vec![
                Split::new("Amit", amt(166_667)),
                Split::new("Rahul", amt(166_667)),
                Split::new("Sneha", amt(166_666)),
            ],
            category: None,
        }
    }

    #[test]
    fn valid_expense_becomes_record() {
        let now = Utc::now();
        let record = dinner().into_record(now).unwrap();
        assert_eq!(record.date, now);
        assert_eq!(record.payer, "Amit");
        assert_eq!(record.split_total(), amt(500_000));
        assert!(!record.id.is_empty());
    }

    #[test]
    fn one_minor_unit_gap_is_tolerated() {
        let mut e = dinner();
        e.splits[2].amount = amt(166_665);
        assert!(e.validate().is_ok());
    }

    #[test]
    fn larger_gap_is_accepted_but_reported() {
        let mut e = dinner();
        e.splits[2].amount = amt(166_000);
        assert!(e.validate().is_ok());
        assert!(e.split_issue().unwrap().contains("splits sum to 4993.34"));

        let record = e.into_record(Utc::now()).unwrap();
        assert_eq!(record.split_gap(), amt(666));
        assert_eq!(record.splits[2].amount, amt(166_000));
        assert!(record.split_issue().is_some());
    }

    #[test]
    fn amounts_beyond_the_maximum_are_rejected() {
        let mut e = dinner();
        e.total_amount = Amount::from_f64(5e28).unwrap();
        e.splits = vec![Split::new("B", Amount::from_f64(5e28).unwrap())];
        assert!(matches!(e.validate(), Err(AppError::Validation(_))));

        let mut e = dinner();
        e.total_amount = MAX_AMOUNT;
        e.splits = vec![Split::new("B", MAX_AMOUNT)];
        assert!(e.validate().is_ok());
    }

    #[test]
    fn negative_and_blank_inputs_are_rejected() {
        let mut e = dinner();
        e.payer = "  ".into();
        assert!(matches!(e.validate(), Err(AppError::Validation(_))));

        let mut e = dinner();
        e.splits[0].amount = amt(-100);
        assert!(matches!(e.validate(), Err(AppError::Validation(_))));

        let mut e = dinner();
        e.splits.clear();
        assert!(matches!(e.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn persisted_shape_matches_blob_layout() {
        let json = r#"{
            "id": "1718000000000",
            "description": "Chai",
            "totalAmount": 40,
            "payer": "A",
            "date": "2024-06-10T08:00:00Z",
            "splits": [{"name": "A", "amount": 20}, {"name": "B", "amount": 20}]
        }"#;
        let record: ExpenseRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.total_amount, amt(4000));
        assert_eq!(record.split_gap(), Amount::ZERO);
        assert!(record.category.is_none());
    }
}
