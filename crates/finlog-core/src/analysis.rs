//! Period statistics: totals, expenditure structure, anomalies and frequency.

use std::collections::{BTreeMap, HashMap};

use finlog_domain::{CategoryId, Direction, Period};
use serde::{Deserialize, Serialize};

use crate::{CoreResult, LedgerStore, LogQuery, LogRow};

pub const UNKNOWN_LABEL: &str = "Unknown";
pub const ANOMALY_FACTOR: f64 = 2.0;
pub const TOP_FREQUENCY: usize = 3;

/// Outcome of analysing a period; callers branch on `NoData` explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PeriodAnalysis {
    NoData,
    Report(FinanceReport),
}

impl PeriodAnalysis {
    pub fn report(&self) -> Option<&FinanceReport> {
        match self {
            PeriodAnalysis::Report(report) => Some(report),
            PeriodAnalysis::NoData => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, PeriodAnalysis::NoData)
    }
}

/// Structured report handed to presentation layers and the advice capability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinanceReport {
    pub period: ReportPeriod,
    pub totals_by_direction: BTreeMap<String, f64>,
    pub metrics: ReportMetrics,
    pub expenditure_structure: Vec<CategoryShare>,
    pub anomalies: Vec<Anomaly>,
    pub consumption_behavior: ConsumptionBehavior,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportPeriod {
    pub start: String,
    pub end: String,
}

impl ReportPeriod {
    /// Unbounded analyses are labelled from "Origin" to "Now".
    pub fn describe(period: Option<&Period>) -> Self {
        match period {
            Some(period) => Self {
                start: period.start.to_rfc3339(),
                end: period.end.to_rfc3339(),
            },
            None => Self {
                start: "Origin".into(),
                end: "Now".into(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportMetrics {
    pub total_income: f64,
    pub total_expense: f64,
    pub net_savings: f64,
    /// `(income - expense) / income`, or `0` without income.
    pub savings_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryShare {
    pub category: String,
    pub amount: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Anomaly {
    pub category: String,
    pub amount: f64,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsumptionBehavior {
    pub high_frequency_categories: Vec<CategoryFrequency>,
    pub average_transaction: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryFrequency {
    pub category: String,
    pub count: usize,
}

/// Per-category expenditure bucket, kept in first-seen order.
struct CategoryBucket {
    label: String,
    amount: f64,
    count: usize,
}

pub struct AnalysisEngine;

impl AnalysisEngine {
    /// Queries the period (all categories and directions) and summarizes it.
    /// `None` analyses the whole ledger.
    pub fn analyze_period(store: &LedgerStore, period: Option<&Period>) -> CoreResult<PeriodAnalysis> {
        let query = match period {
            Some(period) => LogQuery::for_period(period),
            None => LogQuery::new(),
        };
        let rows = store.query(&query)?;
        tracing::debug!(rows = rows.len(), "analysing period");
        Ok(Self::summarize(&rows, ReportPeriod::describe(period)))
    }

    pub fn summarize(rows: &[LogRow], period: ReportPeriod) -> PeriodAnalysis {
        if rows.is_empty() {
            return PeriodAnalysis::NoData;
        }

        let totals_by_direction = totals_by_direction(rows);
        let expenses: Vec<&LogRow> = rows
            .iter()
            .filter(|row| row.direction == Some(Direction::Expenditure))
            .collect();

        let total_income = sum_direction(rows, Direction::Income);
        let total_expense: f64 = expenses.iter().map(|row| row.amount).sum();
        let net_savings = total_income - total_expense;
        let savings_rate = if total_income == 0.0 {
            0.0
        } else {
            net_savings / total_income
        };

        let buckets = group_by_category(&expenses);
        let average = mean(&expenses);

        PeriodAnalysis::Report(FinanceReport {
            period,
            totals_by_direction,
            metrics: ReportMetrics {
                total_income: round_to(total_income, 2),
                total_expense: round_to(total_expense, 2),
                net_savings: round_to(net_savings, 2),
                savings_rate,
            },
            expenditure_structure: expenditure_structure(&buckets, total_expense),
            anomalies: anomalies(&expenses, average),
            consumption_behavior: ConsumptionBehavior {
                high_frequency_categories: high_frequency(&buckets),
                average_transaction: round_to(average.unwrap_or(0.0), 2),
            },
        })
    }
}

/// Sum of amounts per direction label; unresolved directions land in "Unknown".
pub fn totals_by_direction(rows: &[LogRow]) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for row in rows {
        let key = row
            .direction
            .map(|d| d.as_str().to_string())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string());
        *totals.entry(key).or_insert(0.0) += row.amount;
    }
    totals
}

pub fn sum_direction(rows: &[LogRow], direction: Direction) -> f64 {
    rows.iter()
        .filter(|row| row.direction == Some(direction))
        .map(|row| row.amount)
        .sum()
}

fn category_label(row: &LogRow) -> String {
    row.category
        .clone()
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
}

fn group_by_category(expenses: &[&LogRow]) -> Vec<CategoryBucket> {
    let mut index: HashMap<CategoryId, usize> = HashMap::new();
    let mut buckets: Vec<CategoryBucket> = Vec::new();
    for row in expenses {
        let slot = *index.entry(row.category_id).or_insert_with(|| {
            buckets.push(CategoryBucket {
                label: category_label(row),
                amount: 0.0,
                count: 0,
            });
            buckets.len() - 1
        });
        buckets[slot].amount += row.amount;
        buckets[slot].count += 1;
    }
    buckets
}

fn mean(expenses: &[&LogRow]) -> Option<f64> {
    if expenses.is_empty() {
        return None;
    }
    let total: f64 = expenses.iter().map(|row| row.amount).sum();
    Some(total / expenses.len() as f64)
}

fn expenditure_structure(buckets: &[CategoryBucket], total_expense: f64) -> Vec<CategoryShare> {
    if total_expense == 0.0 {
        return Vec::new();
    }
    let mut shares: Vec<CategoryShare> = buckets
        .iter()
        .map(|bucket| CategoryShare {
            category: bucket.label.clone(),
            amount: round_to(bucket.amount, 2),
            percentage: round_to(bucket.amount / total_expense * 100.0, 1),
        })
        .collect();
    // stable: equal amounts keep first-seen order
    shares.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    shares
}

fn anomalies(expenses: &[&LogRow], average: Option<f64>) -> Vec<Anomaly> {
    let Some(average) = average else {
        return Vec::new();
    };
    let threshold = average * ANOMALY_FACTOR;
    expenses
        .iter()
        .filter(|row| row.amount > threshold)
        .map(|row| Anomaly {
            category: category_label(row),
            amount: row.amount,
            note: row.note.clone(),
        })
        .collect()
}

fn high_frequency(buckets: &[CategoryBucket]) -> Vec<CategoryFrequency> {
    let mut ranked: Vec<&CategoryBucket> = buckets.iter().collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked
        .into_iter()
        .take(TOP_FREQUENCY)
        .map(|bucket| CategoryFrequency {
            category: bucket.label.clone(),
            count: bucket.count,
        })
        .collect()
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use finlog_domain::LogId;

    fn at(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, d, 8, 0, 0).unwrap()
    }

    fn row(id: u64, category: u64, name: &str, direction: Option<Direction>, amount: f64) -> LogRow {
        LogRow {
            id: LogId(id),
            category_id: CategoryId(category),
            category: Some(name.to_string()),
            direction,
            amount,
            note: None,
            timestamp: at(1 + (id % 28) as u32),
        }
    }

    fn expense(id: u64, category: u64, name: &str, amount: f64) -> LogRow {
        row(id, category, name, Some(Direction::Expenditure), amount)
    }

    fn report(rows: &[LogRow]) -> FinanceReport {
        AnalysisEngine::summarize(rows, ReportPeriod::describe(None))
            .report()
            .cloned()
            .expect("report")
    }

    #[test]
    fn empty_input_is_no_data() {
        let analysis = AnalysisEngine::summarize(&[], ReportPeriod::describe(None));
        assert!(analysis.is_no_data());
        assert_eq!(
            serde_json::to_value(&analysis).unwrap(),
            serde_json::json!({"status": "no_data"})
        );
    }

    #[test]
    fn savings_rate_is_zero_without_income() {
        let report = report(&[expense(1, 1, "Food", 20.0)]);
        assert_eq!(report.metrics.savings_rate, 0.0);
        assert_eq!(report.metrics.net_savings, -20.0);
    }

    #[test]
    fn savings_rate_uses_income_as_denominator() {
        let rows = [
            row(1, 1, "Salary", Some(Direction::Income), 1000.0),
            expense(2, 2, "Food", 250.0),
        ];
        let report = report(&rows);
        assert!((report.metrics.savings_rate - 0.75).abs() < 1e-12);
    }

    #[test]
    fn totals_group_by_direction_with_unknown_bucket() {
        let rows = [
            row(1, 1, "Salary", Some(Direction::Income), 100.0),
            row(2, 2, "Loan", Some(Direction::Payable), 30.0),
            row(3, 3, "Legacy", None, 7.0),
            row(4, 1, "Salary", Some(Direction::Income), 50.0),
        ];
        let totals = report(&rows).totals_by_direction;
        assert_eq!(totals.get("Income"), Some(&150.0));
        assert_eq!(totals.get("Payable"), Some(&30.0));
        assert_eq!(totals.get(UNKNOWN_LABEL), Some(&7.0));
        assert_eq!(totals.get("Expenditure"), None);
    }

    #[test]
    fn breakdown_sorted_descending_and_sums_to_hundred() {
        let rows = [
            expense(1, 1, "Food", 10.0),
            expense(2, 2, "Rent", 70.0),
            expense(3, 3, "Fun", 13.0),
            expense(4, 1, "Food", 7.0),
        ];
        let structure = report(&rows).expenditure_structure;
        let names: Vec<_> = structure.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(names, vec!["Rent", "Food", "Fun"]);
        assert_eq!(structure[0].percentage, 70.0);
        assert_eq!(structure[1].percentage, 17.0);
        let total: f64 = structure.iter().map(|s| s.percentage).sum();
        assert!((total - 100.0).abs() <= 0.05 * structure.len() as f64);
    }

    #[test]
    fn zero_total_expense_produces_no_breakdown() {
        let rows = [
            row(1, 1, "Salary", Some(Direction::Income), 10.0),
            expense(2, 2, "Freebies", 0.0),
        ];
        let report = report(&rows);
        assert!(report.expenditure_structure.is_empty());
        assert!(report.anomalies.is_empty());
    }

    #[test]
    fn anomalies_require_strictly_more_than_twice_the_mean() {
        // mean 25, threshold 50
        let rows = [expense(1, 1, "Food", 0.0), expense(2, 1, "Food", 50.0)];
        assert!(report(&rows).anomalies.is_empty());

        let mut rows = vec![expense(1, 1, "Food", 10.0); 4];
        rows.push(LogRow {
            note: Some("laptop".into()),
            ..expense(5, 2, "Gear", 1000.0)
        });
        let anomalies = report(&rows).anomalies;
        assert_eq!(
            anomalies,
            vec![Anomaly {
                category: "Gear".into(),
                amount: 1000.0,
                note: Some("laptop".into()),
            }]
        );
    }

    #[test]
    fn no_expenditure_means_no_anomalies_and_zero_average() {
        let report = report(&[row(1, 1, "Salary", Some(Direction::Income), 10.0)]);
        assert!(report.anomalies.is_empty());
        assert!(report.consumption_behavior.high_frequency_categories.is_empty());
        assert_eq!(report.consumption_behavior.average_transaction, 0.0);
    }

    #[test]
    fn frequency_keeps_top_three_with_first_seen_tiebreak() {
        let rows = [
            expense(1, 4, "Coffee", 3.0),
            expense(2, 1, "Food", 10.0),
            expense(3, 2, "Taxi", 15.0),
            expense(4, 1, "Food", 11.0),
            expense(5, 3, "Books", 20.0),
            expense(6, 2, "Taxi", 12.0),
        ];
        let top = report(&rows).consumption_behavior.high_frequency_categories;
        assert_eq!(
            top,
            vec![
                CategoryFrequency { category: "Food".into(), count: 2 },
                CategoryFrequency { category: "Taxi".into(), count: 2 },
                CategoryFrequency { category: "Coffee".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn report_serializes_contract_fields() {
        let rows = [
            row(1, 1, "Salary", Some(Direction::Income), 100.0),
            expense(2, 2, "Food", 40.0),
        ];
        let value = serde_json::to_value(PeriodAnalysis::Report(report(&rows))).unwrap();
        assert_eq!(value["status"], "report");
        assert_eq!(value["metrics"]["total_income"], 100.0);
        assert_eq!(value["metrics"]["total_expense"], 40.0);
        assert_eq!(value["metrics"]["savings_rate"], 0.6);
        assert_eq!(value["expenditure_structure"][0]["category"], "Food");
        assert_eq!(value["expenditure_structure"][0]["percentage"], 100.0);
        assert!(value["anomalies"].is_array());
        assert_eq!(
            value["consumption_behavior"]["high_frequency_categories"][0]["count"],
            1
        );
    }
}
