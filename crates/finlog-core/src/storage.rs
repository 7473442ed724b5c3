use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use finlog_domain::{normalize_name, Goal, LedgerSnapshot};

use crate::{CoreError, CoreResult};

/// Abstraction over persistence backends capable of storing a ledger snapshot.
pub trait LedgerStorage: Send + Sync {
    /// Returns `None` when nothing has been persisted yet.
    fn load_snapshot(&self) -> CoreResult<Option<LedgerSnapshot>>;
    fn save_snapshot(&self, snapshot: &LedgerSnapshot) -> CoreResult<()>;
}

/// Persistence for the single active goal.
pub trait GoalStorage: Send + Sync {
    /// Fails with [`CoreError::GoalNotFound`] when no goal has been stored.
    fn load_goal(&self) -> CoreResult<Goal>;
    fn save_goal(&self, goal: &Goal) -> CoreResult<()>;

    fn load_goal_or_default(&self) -> CoreResult<Goal> {
        match self.load_goal() {
            Ok(goal) => Ok(goal),
            Err(CoreError::GoalNotFound(what)) => {
                tracing::debug!(%what, "no goal stored, using zero targets");
                Ok(Goal::default())
            }
            Err(err) => Err(err),
        }
    }
}

/// Volatile storage, used for ephemeral ledgers and tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    snapshot: Mutex<Option<LedgerSnapshot>>,
    goal: Mutex<Option<Goal>>,
    reject_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_goal(goal: Goal) -> Self {
        let storage = Self::default();
        *storage.goal.lock().unwrap_or_else(|e| e.into_inner()) = Some(goal);
        storage
    }

    /// Makes every subsequent save fail with a storage error.
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    pub fn persisted(&self) -> Option<LedgerSnapshot> {
        self.snapshot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn check_writable(&self) -> CoreResult<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            Err(CoreError::Storage("memory storage is read-only".into()))
        } else {
            Ok(())
        }
    }
}

impl LedgerStorage for MemoryStorage {
    fn load_snapshot(&self) -> CoreResult<Option<LedgerSnapshot>> {
        Ok(self.persisted())
    }

    fn save_snapshot(&self, snapshot: &LedgerSnapshot) -> CoreResult<()> {
        self.check_writable()?;
        *self.snapshot.lock().unwrap_or_else(|e| e.into_inner()) = Some(snapshot.clone());
        Ok(())
    }
}

impl GoalStorage for MemoryStorage {
    fn load_goal(&self) -> CoreResult<Goal> {
        let goal = *self.goal.lock().unwrap_or_else(|e| e.into_inner());
        goal.ok_or_else(|| CoreError::GoalNotFound("no goal has been set".into()))
    }

    fn save_goal(&self, goal: &Goal) -> CoreResult<()> {
        self.check_writable()?;
        *self.goal.lock().unwrap_or_else(|e| e.into_inner()) = Some(*goal);
        Ok(())
    }
}

/// Detects dangling references and other anomalies within a ledger snapshot.
pub fn ledger_warnings(snapshot: &LedgerSnapshot) -> Vec<String> {
    let category_ids: HashSet<_> = snapshot.categories.iter().map(|c| c.id).collect();
    let mut names = HashSet::new();
    let mut warnings = Vec::new();

    for category in &snapshot.categories {
        if !names.insert(normalize_name(&category.name)) {
            warnings.push(format!(
                "category {} duplicates the name `{}`",
                category.id, category.name
            ));
        }
    }

    for log in &snapshot.logs {
        if !category_ids.contains(&log.category_id) {
            warnings.push(format!(
                "log {} references missing category {}",
                log.id, log.category_id
            ));
        }
        if !log.amount.is_finite() || log.amount < 0.0 {
            warnings.push(format!("log {} has invalid amount {}", log.id, log.amount));
        }
    }
    warnings
}
