//! Transactional CRUD surface over categories and finance logs.

use std::sync::{Arc, RwLock, RwLockReadGuard};

use chrono::{DateTime, Utc};
use finlog_domain::{
    Category, CategoryId, Direction, Displayable, FinanceLog, LedgerSnapshot, LogId,
};
use tracing::{debug, info, warn};

use crate::storage::{ledger_warnings, LedgerStorage, MemoryStorage};
use crate::{Clock, CoreError, CoreResult, SystemClock};

/// Fields accepted when recording a new finance log.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLog {
    pub category_id: CategoryId,
    pub direction: Option<Direction>,
    pub amount: f64,
    pub note: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewLog {
    pub fn new(category_id: CategoryId, amount: f64) -> Self {
        Self {
            category_id,
            direction: None,
            amount,
            note: None,
            timestamp: None,
        }
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Partial update of a finance log. `None` leaves the field untouched;
/// `note: Some(None)` clears the note.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogPatch {
    pub category_id: Option<CategoryId>,
    pub direction: Option<Direction>,
    pub amount: Option<f64>,
    pub note: Option<Option<String>>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl LogPatch {
    pub fn is_empty(&self) -> bool {
        self == &LogPatch::default()
    }
}

/// Shared ledger state. Reads may run concurrently; writes are serialized and
/// either fully applied and persisted, or not applied at all.
pub struct LedgerStore {
    state: RwLock<LedgerSnapshot>,
    storage: Box<dyn LedgerStorage>,
    clock: Arc<dyn Clock>,
}

impl LedgerStore {
    /// Loads the persisted snapshot, starting an empty ledger when none exists.
    pub fn open(storage: Box<dyn LedgerStorage>, clock: Arc<dyn Clock>) -> CoreResult<Self> {
        let snapshot = match storage.load_snapshot()? {
            Some(snapshot) => {
                for warning in ledger_warnings(&snapshot) {
                    warn!(%warning, "ledger snapshot anomaly");
                }
                snapshot
            }
            None => LedgerSnapshot::new(clock.now()),
        };
        info!(
            categories = snapshot.categories.len(),
            logs = snapshot.logs.len(),
            "ledger store opened"
        );
        Ok(Self {
            state: RwLock::new(snapshot),
            storage,
            clock,
        })
    }

    /// Store backed by volatile memory, using the system clock.
    pub fn in_memory() -> Self {
        Self::in_memory_with_clock(Arc::new(SystemClock))
    }

    pub fn in_memory_with_clock(clock: Arc<dyn Clock>) -> Self {
        let snapshot = LedgerSnapshot::new(clock.now());
        Self {
            state: RwLock::new(snapshot),
            storage: Box::new(MemoryStorage::new()),
            clock,
        }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    // Category operations

    pub fn create_category(&self, name: &str, direction: Direction) -> CoreResult<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation(
                "category name must not be empty".into(),
            ));
        }
        let category = self.mutate(|ledger| {
            if ledger.category_by_name(name).is_some() {
                return Err(CoreError::DuplicateCategory(name.to_string()));
            }
            let id = ledger.add_category(name, direction);
            ledger
                .category(id)
                .cloned()
                .ok_or_else(|| CoreError::CategoryNotFound(id.to_string()))
        })?;
        info!(id = %category.id, label = %category.display_label(), "category created");
        Ok(category)
    }

    pub fn category(&self, id: CategoryId) -> CoreResult<Option<Category>> {
        Ok(self.read()?.category(id).cloned())
    }

    pub fn category_by_name(&self, name: &str) -> CoreResult<Option<Category>> {
        Ok(self.read()?.category_by_name(name).cloned())
    }

    pub fn list_categories(&self) -> CoreResult<Vec<Category>> {
        let mut categories = self.read()?.categories.clone();
        categories.sort_by_key(|category| category.id);
        Ok(categories)
    }

    /// Deletes the category and every log it owns. Returns `false` when the
    /// category does not exist.
    pub fn delete_category(&self, id: CategoryId) -> CoreResult<bool> {
        let outcome = self.mutate(|ledger| {
            ledger
                .remove_category(id)
                .ok_or_else(|| CoreError::CategoryNotFound(id.to_string()))
        });
        match outcome {
            Ok(removed_logs) => {
                info!(%id, removed_logs, "category deleted");
                Ok(true)
            }
            Err(CoreError::CategoryNotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub fn delete_category_by_name(&self, name: &str) -> CoreResult<bool> {
        match self.category_by_name(name)? {
            Some(category) => self.delete_category(category.id),
            None => Ok(false),
        }
    }

    // Log operations

    pub fn create_log(&self, new_log: NewLog) -> CoreResult<FinanceLog> {
        validate_amount(new_log.amount)?;
        let timestamp = new_log.timestamp.unwrap_or_else(|| self.clock.now());
        let log = self.mutate(|ledger| {
            let category = ledger
                .category(new_log.category_id)
                .ok_or_else(|| CoreError::CategoryNotFound(new_log.category_id.to_string()))?;
            let direction = new_log.direction.unwrap_or(category.default_direction);
            let id = ledger.add_log(
                new_log.category_id,
                direction,
                new_log.amount,
                new_log.note.clone(),
                timestamp,
            );
            ledger
                .log(id)
                .cloned()
                .ok_or(CoreError::LogNotFound(id))
        })?;
        debug!(log = %log.display_label(), category = %log.category_id, "log created");
        Ok(log)
    }

    /// Records a log against the category with the given name.
    pub fn create_log_by_category_name(
        &self,
        category_name: &str,
        amount: f64,
        direction: Option<Direction>,
        note: Option<String>,
        timestamp: Option<DateTime<Utc>>,
    ) -> CoreResult<FinanceLog> {
        let category = self
            .category_by_name(category_name)?
            .ok_or_else(|| CoreError::CategoryNotFound(category_name.to_string()))?;
        self.create_log(NewLog {
            category_id: category.id,
            direction,
            amount,
            note,
            timestamp,
        })
    }

    pub fn log(&self, id: LogId) -> CoreResult<Option<FinanceLog>> {
        Ok(self.read()?.log(id).cloned())
    }

    pub fn update_log(&self, id: LogId, patch: LogPatch) -> CoreResult<FinanceLog> {
        if let Some(amount) = patch.amount {
            validate_amount(amount)?;
        }
        if patch.is_empty() {
            return self.log(id)?.ok_or(CoreError::LogNotFound(id));
        }
        let log = self.mutate(|ledger| {
            if let Some(category_id) = patch.category_id {
                if ledger.category(category_id).is_none() {
                    return Err(CoreError::CategoryNotFound(category_id.to_string()));
                }
            }
            let log = ledger.log_mut(id).ok_or(CoreError::LogNotFound(id))?;
            if let Some(category_id) = patch.category_id {
                log.category_id = category_id;
            }
            if let Some(direction) = patch.direction {
                log.actual_direction = Some(direction);
            }
            if let Some(amount) = patch.amount {
                log.amount = amount;
            }
            if let Some(note) = patch.note.clone() {
                log.note = note;
            }
            if let Some(timestamp) = patch.timestamp {
                log.timestamp = timestamp;
            }
            Ok(log.clone())
        })?;
        debug!(%id, "log updated");
        Ok(log)
    }

    pub fn delete_log(&self, id: LogId) -> CoreResult<bool> {
        match self.mutate(|ledger| ledger.remove_log(id).ok_or(CoreError::LogNotFound(id))) {
            Ok(_) => {
                debug!(%id, "log deleted");
                Ok(true)
            }
            Err(CoreError::LogNotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Every log in ascending id order.
    pub fn list_all(&self) -> CoreResult<Vec<FinanceLog>> {
        let mut logs = self.read()?.logs.clone();
        logs.sort_by_key(|log| log.id);
        Ok(logs)
    }

    pub fn snapshot(&self) -> CoreResult<LedgerSnapshot> {
        Ok(self.read()?.clone())
    }

    /// Runs `reader` against the current state without cloning it.
    pub fn read_with<T>(&self, reader: impl FnOnce(&LedgerSnapshot) -> T) -> CoreResult<T> {
        let guard = self.read()?;
        Ok(reader(&guard))
    }

    fn read(&self) -> CoreResult<RwLockReadGuard<'_, LedgerSnapshot>> {
        self.state
            .read()
            .map_err(|_| CoreError::Storage("ledger lock poisoned".into()))
    }

    /// Applies `change` to a draft copy, persists the draft, then publishes it.
    fn mutate<T>(
        &self,
        change: impl FnOnce(&mut LedgerSnapshot) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let mut live = self
            .state
            .write()
            .map_err(|_| CoreError::Storage("ledger lock poisoned".into()))?;
        let mut draft = live.clone();
        let value = change(&mut draft)?;
        draft.touch(self.clock.now());
        if let Err(err) = self.storage.save_snapshot(&draft) {
            warn!(error = %err, "ledger write rolled back");
            return Err(err);
        }
        *live = draft;
        Ok(value)
    }
}

fn validate_amount(amount: f64) -> CoreResult<()> {
    if !amount.is_finite() {
        return Err(CoreError::Validation(format!(
            "amount must be a finite number, got {amount}"
        )));
    }
    if amount < 0.0 {
        return Err(CoreError::Validation(format!(
            "amount must not be negative, got {amount}"
        )));
    }
    Ok(())
}
