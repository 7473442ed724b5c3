//! Financial target compared against period actuals.

use serde::{Deserialize, Serialize};

/// Persisted target triple; one active goal per ledger.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Goal {
    pub income: f64,
    pub expenditure: f64,
    pub total_save: f64,
}

impl Goal {
    pub const REQUIRED_FIELDS: [&'static str; 3] = ["income", "expenditure", "total_save"];

    pub fn new(income: f64, expenditure: f64, total_save: f64) -> Self {
        Self {
            income,
            expenditure,
            total_save,
        }
    }
}
