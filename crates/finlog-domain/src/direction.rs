//! Economic direction of a transaction.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Classifies the economic effect of a finance log.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Income,
    Expenditure,
    Receivable,
    Payable,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Income,
        Direction::Expenditure,
        Direction::Receivable,
        Direction::Payable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Income => "Income",
            Direction::Expenditure => "Expenditure",
            Direction::Receivable => "Receivable",
            Direction::Payable => "Payable",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when text does not name a known [`Direction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDirection(pub String);

impl fmt::Display for UnknownDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown direction `{}` (expected Income, Expenditure, Receivable or Payable)",
            self.0
        )
    }
}

impl std::error::Error for UnknownDirection {}

impl FromStr for Direction {
    type Err = UnknownDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Direction::ALL
            .into_iter()
            .find(|direction| direction.as_str().to_ascii_lowercase() == normalized)
            .ok_or_else(|| UnknownDirection(s.to_string()))
    }
}
