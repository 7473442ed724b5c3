//! Ledger snapshot and reporting periods.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::common::*;
use crate::direction::Direction;
use crate::log::FinanceLog;

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

/// Persistable state of the ledger: every category and log plus id counters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerSnapshot {
    #[serde(default = "LedgerSnapshot::default_schema_version")]
    pub schema_version: u8,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub logs: Vec<FinanceLog>,
    #[serde(default = "LedgerSnapshot::first_category_id")]
    pub next_category_id: CategoryId,
    #[serde(default = "LedgerSnapshot::first_log_id")]
    pub next_log_id: LogId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LedgerSnapshot {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            categories: Vec::new(),
            logs: Vec::new(),
            next_category_id: Self::first_category_id(),
            next_log_id: Self::first_log_id(),
            created_at: now,
            updated_at: now,
        }
    }

    fn default_schema_version() -> u8 {
        CURRENT_SCHEMA_VERSION
    }

    fn first_category_id() -> CategoryId {
        CategoryId(1)
    }

    fn first_log_id() -> LogId {
        LogId(1)
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    pub fn category_by_name(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.has_name(name))
    }

    pub fn log(&self, id: LogId) -> Option<&FinanceLog> {
        self.logs.iter().find(|log| log.id == id)
    }

    pub fn log_mut(&mut self, id: LogId) -> Option<&mut FinanceLog> {
        self.logs.iter_mut().find(|log| log.id == id)
    }

    /// Appends a category under the next free id.
    pub fn add_category(&mut self, name: impl Into<String>, direction: Direction) -> CategoryId {
        let id = self.allocate_category_id();
        self.categories.push(Category::new(id, name, direction));
        id
    }

    /// Appends a log; the caller supplies every field except the id.
    pub fn add_log(
        &mut self,
        category_id: CategoryId,
        direction: Direction,
        amount: f64,
        note: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> LogId {
        let id = self.allocate_log_id();
        let mut log = FinanceLog::new(id, category_id, direction, amount, timestamp);
        if let Some(note) = note {
            log = log.with_note(note);
        }
        self.logs.push(log);
        id
    }

    /// Removes the category and every log it owns. Returns the number of logs removed,
    /// or `None` when the category does not exist.
    pub fn remove_category(&mut self, id: CategoryId) -> Option<usize> {
        let before = self.categories.len();
        self.categories.retain(|category| category.id != id);
        if self.categories.len() == before {
            return None;
        }
        let logs_before = self.logs.len();
        self.logs.retain(|log| log.category_id != id);
        Some(logs_before - self.logs.len())
    }

    pub fn remove_log(&mut self, id: LogId) -> Option<FinanceLog> {
        let index = self.logs.iter().position(|log| log.id == id)?;
        Some(self.logs.remove(index))
    }

    /// Direction the log is accounted under: its own, else its category default.
    pub fn resolve_direction(&self, log: &FinanceLog) -> Option<Direction> {
        log.actual_direction.or_else(|| {
            self.category(log.category_id)
                .map(|category| category.default_direction)
        })
    }

    fn allocate_category_id(&mut self) -> CategoryId {
        let floor = max_id(&self.categories)
            .map(CategoryId::next)
            .unwrap_or(Self::first_category_id());
        let id = self.next_category_id.max(floor);
        self.next_category_id = id.next();
        id
    }

    fn allocate_log_id(&mut self) -> LogId {
        let floor = max_id(&self.logs)
            .map(LogId::next)
            .unwrap_or(Self::first_log_id());
        let id = self.next_log_id.max(floor);
        self.next_log_id = id.next();
        id
    }
}

fn max_id<T: Identifiable>(items: &[T]) -> Option<T::Id> {
    items.iter().map(Identifiable::id).max()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
/// Inclusive reporting window used by queries and reports.
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Period {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, PeriodError> {
        if start > end {
            return Err(PeriodError::InvalidRange);
        }
        Ok(Self { start, end })
    }

    /// Covers an entire calendar month, from its first instant to its last nanosecond.
    pub fn for_month(year: i32, month: u32) -> Result<Self, PeriodError> {
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or(PeriodError::InvalidDate)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or(PeriodError::InvalidDate)?;
        let start = Utc.from_utc_datetime(&first.and_time(chrono::NaiveTime::MIN));
        let end =
            Utc.from_utc_datetime(&next.and_time(chrono::NaiveTime::MIN)) - Duration::nanoseconds(1);
        Self::new(start, end)
    }

    /// Calendar month containing the given instant.
    pub fn month_containing(instant: DateTime<Utc>) -> Result<Self, PeriodError> {
        Self::for_month(instant.year(), instant.month())
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }

    pub fn start_label(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_label(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Errors that can occur when constructing [`Period`] values.
pub enum PeriodError {
    InvalidRange,
    InvalidDate,
}

impl fmt::Display for PeriodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodError::InvalidRange => f.write_str("period start must not be after its end"),
            PeriodError::InvalidDate => f.write_str("period references a non-existent date"),
        }
    }
}

impl std::error::Error for PeriodError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn removing_category_cascades_to_its_logs() {
        let mut ledger = LedgerSnapshot::new(at(2024, 1, 1));
        let food = ledger.add_category("Food", Direction::Expenditure);
        let salary = ledger.add_category("Salary", Direction::Income);
        ledger.add_log(food, Direction::Expenditure, 10.0, None, at(2024, 1, 2));
        ledger.add_log(food, Direction::Expenditure, 20.0, None, at(2024, 1, 3));
        let kept = ledger.add_log(salary, Direction::Income, 99.0, None, at(2024, 1, 4));

        assert_eq!(ledger.remove_category(food), Some(2));
        assert_eq!(ledger.logs.len(), 1);
        assert_eq!(ledger.logs[0].id, kept);
        assert_eq!(ledger.remove_category(food), None);
    }

    #[test]
    fn ids_are_never_reused_after_removal() {
        let mut ledger = LedgerSnapshot::new(at(2024, 1, 1));
        let food = ledger.add_category("Food", Direction::Expenditure);
        let first = ledger.add_log(food, Direction::Expenditure, 1.0, None, at(2024, 1, 2));
        ledger.remove_log(first);
        let second = ledger.add_log(food, Direction::Expenditure, 1.0, None, at(2024, 1, 2));
        assert!(second > first);
    }

    #[test]
    fn legacy_snapshot_without_counters_allocates_past_existing_ids() {
        let json = r#"{
            "categories": [{"id": 4, "name": "Food", "default_direction": "Expenditure"}],
            "logs": [{"id": 7, "category_id": 4, "amount": 3.5, "timestamp": "2024-01-02T00:00:00Z"}],
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }"#;
        let mut ledger: LedgerSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(ledger.logs[0].actual_direction, None);
        assert_eq!(
            ledger.resolve_direction(&ledger.logs[0].clone()),
            Some(Direction::Expenditure)
        );
        let id = ledger.add_log(CategoryId(4), Direction::Expenditure, 1.0, None, at(2024, 1, 3));
        assert_eq!(id, LogId(8));
        assert_eq!(ledger.add_category("Rent", Direction::Expenditure), CategoryId(5));
    }

    #[test]
    fn month_period_is_inclusive_of_both_ends() {
        let period = Period::for_month(2024, 2).unwrap();
        assert!(period.contains(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()));
        assert!(period.contains(Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap()));
        assert!(!period.contains(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()));
        assert_eq!(period.start_label(), "2024-02-01");
        assert_eq!(period.end_label(), "2024-02-29");
    }

    #[test]
    fn last_subsecond_of_month_belongs_to_it() {
        let period = Period::for_month(2024, 3).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap() + Duration::milliseconds(500);
        assert!(period.contains(late));
        assert_eq!(Period::month_containing(late).unwrap(), period);
        assert!(!period.contains(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()));
        assert_eq!(period.end_label(), "2024-03-31");
    }

    #[test]
    fn rejects_inverted_period() {
        let err = Period::new(at(2024, 2, 1), at(2024, 1, 1)).unwrap_err();
        assert_eq!(err, PeriodError::InvalidRange);
    }
}
