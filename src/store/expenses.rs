//! # store::expenses
//!
//! Append-only history of [`ExpenseRecord`]s.

use std::sync::Arc;

use tracing::{info, warn};

use crate::models::{Amount, ExpenseRecord, EPSILON};
use crate::store::kv::{load_json, save_json, KeyValueStore};
use crate::store::{Durability, EXPENSES_KEY};

pub struct ExpenseStore {
    records: Vec<ExpenseRecord>,
    backend: Arc<dyn KeyValueStore>,
}

impl ExpenseStore {
    /// Load the persisted history.  An unreadable blob starts an empty
    /// session instead of failing startup.
    pub fn load(backend: Arc<dyn KeyValueStore>) -> Self {
        let records: Vec<ExpenseRecord> = match load_json(backend.as_ref(), EXPENSES_KEY) {
            Ok(Some(records)) => records,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "⚠️ Could not load expenses, starting with empty history");
                Vec::new()
            }
        };

        let unbalanced = records.iter().filter(|r| r.split_gap().abs() > EPSILON).count();
        if unbalanced > 0 {
            warn!(unbalanced, "Some stored expenses have splits that do not sum to their total");
        }

        let oversized = records.iter().filter(|r| r.has_out_of_range_amount()).count();
        if oversized > 0 {
            warn!(oversized, "Some stored expenses exceed the maximum amount; sums will saturate");
        }

        info!(count = records.len(), "📒 Expense history loaded");
        Self { records, backend }
    }

    pub fn all(&self) -> &[ExpenseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a record and persist the whole history.
    pub fn append(&mut self, record: ExpenseRecord) -> Durability {
        info!(
            id     = %record.id,
            payer  = %record.payer,
            amount = %record.total_amount,
            "Expense appended"
        );
        self.records.push(record);
        Durability::from_write(save_json(self.backend.as_ref(), EXPENSES_KEY, &self.records), EXPENSES_KEY)
    }

    /// Total group spending across all expenses.
    pub fn total_spent(&self) -> Amount {
        self.records.iter().map(|r| r.total_amount).sum()
    }
}
