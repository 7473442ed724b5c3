//! Domain model for a single finance log entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::*;
use crate::direction::Direction;

/// A single transaction record owned by a category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinanceLog {
    pub id: LogId,
    pub category_id: CategoryId,
    /// Resolved at creation time; only legacy snapshots leave this empty.
    #[serde(default)]
    pub actual_direction: Option<Direction>,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl FinanceLog {
    pub fn new(
        id: LogId,
        category_id: CategoryId,
        direction: Direction,
        amount: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            category_id,
            actual_direction: Some(direction),
            amount,
            note: None,
            timestamp,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

impl Identifiable for FinanceLog {
    type Id = LogId;

    fn id(&self) -> LogId {
        self.id
    }
}

impl Displayable for FinanceLog {
    fn display_label(&self) -> String {
        let direction = self
            .actual_direction
            .map(|d| d.to_string())
            .unwrap_or_else(|| "Unknown".into());
        format!("log:{} [{} {:.2}]", self.id, direction, self.amount)
    }
}
