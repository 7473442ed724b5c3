//! Composable filter/sort queries over the ledger.

use std::{cmp::Ordering, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use finlog_domain::{
    CategoryId, Direction, FinanceLog, LedgerSnapshot, LogId, NamedEntity, Period,
};
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult, LedgerStore};

/// Sort keys understood by the query engine.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Timestamp,
    Amount,
    Id,
    Category,
    Direction,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Timestamp => "timestamp",
            SortField::Amount => "amount",
            SortField::Id => "id",
            SortField::Category => "category",
            SortField::Direction => "direction",
        }
    }

    /// Ascending comparison on this key alone.
    fn compare(&self, a: &LogRow, b: &LogRow) -> Ordering {
        match self {
            SortField::Timestamp => a.timestamp.cmp(&b.timestamp),
            SortField::Amount => a.amount.total_cmp(&b.amount),
            SortField::Id => a.id.cmp(&b.id),
            SortField::Category => unresolved_last(a.category.as_deref(), b.category.as_deref())
                .then_with(|| a.category_id.cmp(&b.category_id)),
            SortField::Direction => unresolved_last(a.direction, b.direction),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "timestamp" => Ok(SortField::Timestamp),
            "amount" => Ok(SortField::Amount),
            "id" => Ok(SortField::Id),
            "category" => Ok(SortField::Category),
            "direction" => Ok(SortField::Direction),
            other => Err(CoreError::Validation(format!("unknown sort field `{other}`"))),
        }
    }
}

fn unresolved_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Filter, sort and limit settings for a log query. Absent filters impose no
/// constraint; all range bounds are inclusive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogQuery {
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    pub direction: Option<Direction>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub note_contains: Option<String>,
    pub sort_by: SortField,
    #[serde(alias = "reverse")]
    pub descending: bool,
    pub limit: Option<usize>,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            category_id: None,
            category_name: None,
            direction: None,
            min_amount: None,
            max_amount: None,
            start: None,
            end: None,
            note_contains: None,
            sort_by: SortField::Timestamp,
            descending: true,
            limit: None,
        }
    }
}

impl LogQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every log in the period, newest first.
    pub fn for_period(period: &Period) -> Self {
        Self::new().between(period.start, period.end)
    }

    pub fn category(mut self, id: CategoryId) -> Self {
        self.category_id = Some(id);
        self
    }

    pub fn category_named(mut self, name: impl Into<String>) -> Self {
        self.category_name = Some(name.into());
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn amount_between(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_amount = min;
        self.max_amount = max;
        self
    }

    pub fn between(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn note_contains(mut self, keyword: impl Into<String>) -> Self {
        self.note_contains = Some(keyword.into());
        self
    }

    pub fn sort(mut self, field: SortField, descending: bool) -> Self {
        self.sort_by = field;
        self.descending = descending;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Rejects malformed bounds before any data is touched.
    pub fn validate(&self) -> CoreResult<()> {
        for (label, bound) in [("min_amount", self.min_amount), ("max_amount", self.max_amount)] {
            if let Some(value) = bound {
                if !value.is_finite() || value < 0.0 {
                    return Err(CoreError::Validation(format!(
                        "{label} must be a non-negative number, got {value}"
                    )));
                }
            }
        }
        if let (Some(min), Some(max)) = (self.min_amount, self.max_amount) {
            if min > max {
                return Err(CoreError::Validation(format!(
                    "min_amount {min} is greater than max_amount {max}"
                )));
            }
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(CoreError::Validation(format!(
                    "start {start} is after end {end}"
                )));
            }
        }
        Ok(())
    }
}

/// A finance log joined with its category by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogRow {
    pub id: LogId,
    pub category_id: CategoryId,
    pub category: Option<String>,
    pub direction: Option<Direction>,
    pub amount: f64,
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl LogRow {
    pub fn join(ledger: &LedgerSnapshot, log: &FinanceLog) -> Self {
        Self {
            id: log.id,
            category_id: log.category_id,
            category: ledger
                .category(log.category_id)
                .map(|category| category.name().to_string()),
            direction: ledger.resolve_direction(log),
            amount: log.amount,
            note: log.note.clone(),
            timestamp: log.timestamp,
        }
    }
}

/// Stateless executor for [`LogQuery`].
pub struct QueryEngine;

impl QueryEngine {
    pub fn execute(store: &LedgerStore, query: &LogQuery) -> CoreResult<Vec<LogRow>> {
        store.read_with(|ledger| Self::run(ledger, query))?
    }

    pub fn run(ledger: &LedgerSnapshot, query: &LogQuery) -> CoreResult<Vec<LogRow>> {
        query.validate()?;

        let category_filter = match query.category_name.as_deref() {
            Some(name) => match ledger.category_by_name(name) {
                Some(category) => Some(category.id),
                None => return Ok(Vec::new()),
            },
            None => None,
        };
        let keyword = query
            .note_contains
            .as_deref()
            .map(str::trim)
            .filter(|keyword| !keyword.is_empty())
            .map(str::to_lowercase);

        let mut rows: Vec<LogRow> = ledger
            .logs
            .iter()
            .filter(|log| query.category_id.map_or(true, |id| log.category_id == id))
            .filter(|log| category_filter.map_or(true, |id| log.category_id == id))
            .filter(|log| query.min_amount.map_or(true, |min| log.amount >= min))
            .filter(|log| query.max_amount.map_or(true, |max| log.amount <= max))
            .filter(|log| query.start.map_or(true, |start| log.timestamp >= start))
            .filter(|log| query.end.map_or(true, |end| log.timestamp <= end))
            .filter(|log| match keyword.as_deref() {
                Some(keyword) => log
                    .note
                    .as_deref()
                    .is_some_and(|note| note.to_lowercase().contains(keyword)),
                None => true,
            })
            .map(|log| LogRow::join(ledger, log))
            .filter(|row| query.direction.map_or(true, |d| row.direction == Some(d)))
            .collect();

        let field = query.sort_by;
        let descending = query.descending;
        rows.sort_by(|a, b| {
            let primary = field.compare(a, b);
            let primary = if descending { primary.reverse() } else { primary };
            primary.then_with(|| a.id.cmp(&b.id))
        });
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }
}

impl LedgerStore {
    pub fn query(&self, query: &LogQuery) -> CoreResult<Vec<LogRow>> {
        QueryEngine::execute(self, query)
    }
}
