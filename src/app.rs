//! Composition root: settings in, wired store and engines out.

use std::{collections::BTreeMap, fs, sync::Arc};

use chrono::{DateTime, Utc};
use finlog_config::{AdviceSettings, Settings};
use finlog_core::{
    storage::GoalStorage, totals_by_direction, AdviceOptions, AdviceOutcome, AdviceService,
    AdvisorLoader, AnalysisEngine, Clock, CoreError, GoalEngine, GoalReport, LedgerStore,
    LogQuery, LogRow, PeriodAnalysis,
};
use finlog_domain::{Goal, Period};
use finlog_storage_json::{JsonGoalStorage, JsonLedgerStorage, StoragePaths};
use tracing::info;

use crate::FinlogResult;

pub struct FinanceApp {
    settings: Settings,
    store: Arc<LedgerStore>,
    goals: Box<dyn GoalStorage>,
}

impl FinanceApp {
    /// Opens the JSON-backed ledger and goal files named by `settings`.
    pub fn open(settings: Settings, clock: Arc<dyn Clock>) -> FinlogResult<Self> {
        let data_dir = settings.resolve_data_dir();
        fs::create_dir_all(&data_dir).map_err(CoreError::from)?;

        let ledger_storage = JsonLedgerStorage::with_retention(
            StoragePaths {
                ledger_file: settings.ledger_path(),
                backup_root: settings.backup_dir(),
            },
            settings.backup_retention,
        )?;
        let store = LedgerStore::open(Box::new(ledger_storage), clock)?;
        let goals = JsonGoalStorage::new(settings.goal_path());
        info!(data_dir = %data_dir.display(), "finance app opened");

        Ok(Self::with_parts(settings, store, Box::new(goals)))
    }

    /// Assembles an app from already-built parts, e.g. in-memory storage.
    pub fn with_parts(settings: Settings, store: LedgerStore, goals: Box<dyn GoalStorage>) -> Self {
        Self {
            settings,
            store: Arc::new(store),
            goals,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<LedgerStore> {
        &self.store
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.store.clock().now()
    }

    /// Calendar month containing the store clock's "now".
    pub fn current_month(&self) -> FinlogResult<Period> {
        Ok(Period::month_containing(self.now()).map_err(CoreError::from)?)
    }

    pub fn query(&self, query: &LogQuery) -> FinlogResult<Vec<LogRow>> {
        Ok(self.store.query(query)?)
    }

    /// Totals per direction label across the whole ledger.
    pub fn totals_by_direction(&self) -> FinlogResult<BTreeMap<String, f64>> {
        let rows = self.store.query(&LogQuery::new())?;
        Ok(totals_by_direction(&rows))
    }

    pub fn analysis_report(&self, period: Option<&Period>) -> FinlogResult<PeriodAnalysis> {
        Ok(AnalysisEngine::analyze_period(&self.store, period)?)
    }

    pub fn goal_report(&self, period: &Period) -> FinlogResult<GoalReport> {
        Ok(GoalEngine::report(self.goals.as_ref(), &self.store, period)?)
    }

    /// Stored goal, or zero targets when none has been saved.
    pub fn goal(&self) -> FinlogResult<Goal> {
        Ok(self.goals.load_goal_or_default()?)
    }

    pub fn set_goal(&self, goal: &Goal) -> FinlogResult<()> {
        let targets = [goal.income, goal.expenditure, goal.total_save];
        if targets.iter().any(|value| !value.is_finite()) {
            return Err(CoreError::Validation("goal targets must be finite numbers".into()).into());
        }
        self.goals.save_goal(goal)?;
        info!(?goal, "goal updated");
        Ok(())
    }

    /// Analyses the period and, when it has data, asks a freshly loaded advisor.
    pub fn advise(
        &self,
        loader: &dyn AdvisorLoader,
        period: Option<&Period>,
        prompt_override: Option<&str>,
    ) -> FinlogResult<AdviceOutcome> {
        let analysis = self.analysis_report(period)?;
        let options = advice_options(&self.settings.advice);
        Ok(AdviceService::advise(
            loader,
            &options,
            &analysis,
            prompt_override,
        )?)
    }
}

pub fn advice_options(settings: &AdviceSettings) -> AdviceOptions {
    AdviceOptions {
        model_path: settings.model_path.clone(),
        default_system_prompt: settings.default_system_prompt.clone(),
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
        n_ctx: settings.n_ctx,
        n_threads: settings.n_threads,
    }
}
