//! Goal achievement: compares period actuals with the persisted targets.

use finlog_domain::{Direction, Goal, Period};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::{round_to, sum_direction};
use crate::{CoreError, CoreResult, GoalStorage, LedgerStore, LogQuery, LogRow};

/// How an actual value is judged against its goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricRule {
    /// Income and savings: reaching or exceeding the goal achieves it.
    HigherIsBetter,
    /// Expenditure: staying at or under the goal achieves it.
    LowerIsBetter,
}

impl MetricRule {
    pub fn evaluate(self, goal: f64, actual: f64) -> MetricReport {
        let (achieved, percentage) = match self {
            MetricRule::HigherIsBetter => {
                let percentage = if goal == 0.0 {
                    if actual == 0.0 {
                        0.0
                    } else {
                        100.0
                    }
                } else {
                    actual / goal * 100.0
                };
                (actual >= goal, percentage)
            }
            MetricRule::LowerIsBetter => {
                // zero budget always reports 0%, even when it is met
                let percentage = if goal == 0.0 {
                    0.0
                } else {
                    (goal - actual) / goal * 100.0
                };
                (actual <= goal, percentage)
            }
        };
        MetricReport {
            goal,
            actual,
            achieved,
            diff: actual - goal,
            percentage: round_to(percentage, 2),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MetricReport {
    pub goal: f64,
    pub actual: f64,
    pub achieved: bool,
    /// `actual - goal`; the sign reads differently per rule.
    pub diff: f64,
    pub percentage: f64,
}

/// Direction-tagged sums for a period.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct GoalActuals {
    pub income: f64,
    pub expenditure: f64,
    pub total_save: f64,
}

impl GoalActuals {
    pub fn from_rows(rows: &[LogRow]) -> Self {
        let income = sum_direction(rows, Direction::Income);
        let expenditure = sum_direction(rows, Direction::Expenditure);
        Self {
            income,
            expenditure,
            total_save: income - expenditure,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoalPeriod {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoalDetails {
    pub income: MetricReport,
    pub expenditure: MetricReport,
    pub total_save: MetricReport,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoalReport {
    pub period: GoalPeriod,
    pub details: GoalDetails,
}

pub struct GoalEngine;

impl GoalEngine {
    pub fn period_actuals(store: &LedgerStore, period: &Period) -> CoreResult<GoalActuals> {
        let rows = store.query(&LogQuery::for_period(period))?;
        Ok(GoalActuals::from_rows(&rows))
    }

    pub fn evaluate(goal: &Goal, actuals: &GoalActuals, period: &Period) -> GoalReport {
        GoalReport {
            period: GoalPeriod {
                start: period.start_label(),
                end: period.end_label(),
            },
            details: GoalDetails {
                income: MetricRule::HigherIsBetter.evaluate(goal.income, actuals.income),
                expenditure: MetricRule::LowerIsBetter
                    .evaluate(goal.expenditure, actuals.expenditure),
                total_save: MetricRule::HigherIsBetter
                    .evaluate(goal.total_save, actuals.total_save),
            },
        }
    }

    /// Loads the goal (fail-fast) and evaluates it against the period.
    pub fn report(
        goals: &dyn GoalStorage,
        store: &LedgerStore,
        period: &Period,
    ) -> CoreResult<GoalReport> {
        let goal = goals.load_goal()?;
        let actuals = Self::period_actuals(store, period)?;
        tracing::debug!(?goal, ?actuals, "evaluating goal");
        Ok(Self::evaluate(&goal, &actuals, period))
    }
}

/// Validates a persisted goal record: all three numeric fields must be present.
pub fn goal_from_value(value: &Value) -> CoreResult<Goal> {
    let object = value
        .as_object()
        .ok_or_else(|| CoreError::Validation("goal record must be a JSON object".into()))?;

    let mut missing: Vec<&str> = Goal::REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| !object.contains_key(*field))
        .collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        return Err(CoreError::Validation(format!(
            "goal record is missing required fields: {}",
            missing.join(", ")
        )));
    }

    let number = |field: &str| -> CoreResult<f64> {
        object
            .get(field)
            .and_then(Value::as_f64)
            .ok_or_else(|| CoreError::Validation(format!("goal field `{field}` must be numeric")))
    };
    Ok(Goal::new(
        number("income")?,
        number("expenditure")?,
        number("total_save")?,
    ))
}
