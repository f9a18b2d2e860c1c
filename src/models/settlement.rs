//! # models::settlement
//!
//! Derived, ephemeral outputs of the balance engine.  Neither type has an
//! identity; both are recomputed from the full expense history on demand.

use serde::{Deserialize, Serialize};

use crate::models::money::Amount;

/// "`from` owes `to` `amount`": one recommended payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementTransaction {
    pub from: String,
    pub to: String,
    pub amount: Amount,
}

impl SettlementTransaction {
    pub fn new(from: impl Into<String>, to: impl Into<String>, amount: Amount) -> Self {
        Self { from: from.into(), to: to.into(), amount }
    }
}

/// A person's aggregate balance: positive = owed money, negative = owes money.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetPosition {
    pub person: String,
    pub net: Amount,
}
