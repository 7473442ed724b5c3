mod common;

use chrono::{TimeZone, Utc};
use common::{at, setup_test_app};
use finlog_core::{ErrorKind, GoalActuals, GoalEngine, LogQuery, NewLog, PeriodAnalysis, SortField};
use finlog_domain::{Direction, Goal, Period};

fn march() -> Period {
    Period::for_month(2024, 3).expect("period")
}

fn seed_salary_and_food(app: &finlog::FinanceApp, food_amounts: &[f64]) {
    let store = app.store();
    let salary = store
        .create_category("Salary", Direction::Income)
        .expect("salary");
    let food = store
        .create_category("Food", Direction::Expenditure)
        .expect("food");
    store
        .create_log(NewLog::new(salary.id, 55000.0).at(at(1, 9)))
        .expect("salary log");
    for (offset, amount) in food_amounts.iter().enumerate() {
        store
            .create_log(NewLog::new(food.id, *amount).at(at(2 + offset as u32, 12)))
            .expect("food log");
    }
}

fn report(app: &finlog::FinanceApp) -> finlog_core::FinanceReport {
    match app.analysis_report(Some(&march())).expect("analysis") {
        PeriodAnalysis::Report(report) => report,
        PeriodAnalysis::NoData => panic!("expected a report"),
    }
}

#[test]
fn expenditure_at_twice_the_mean_is_not_an_anomaly() {
    let (app, _) = setup_test_app();
    seed_salary_and_food(&app, &[10000.0, 40000.0]);

    let report = report(&app);
    assert_eq!(report.metrics.total_expense, 50000.0);
    assert_eq!(report.metrics.total_income, 55000.0);
    assert!(report.anomalies.is_empty());
    assert_eq!(report.consumption_behavior.average_transaction, 25000.0);
}

#[test]
fn third_food_log_keeps_the_period_free_of_anomalies() {
    let (app, _) = setup_test_app();
    seed_salary_and_food(&app, &[10000.0, 40000.0, 60000.0]);
    assert!(report(&app).anomalies.is_empty());
}

#[test]
fn outsized_food_log_is_flagged() {
    let (app, _) = setup_test_app();
    seed_salary_and_food(&app, &[10000.0, 40000.0, 9999999.0]);

    let anomalies = report(&app).anomalies;
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0].category, "Food");
    assert_eq!(anomalies[0].amount, 9999999.0);
}

#[test]
fn goal_report_scores_period_actuals() {
    let (app, _) = setup_test_app();
    let store = app.store();
    let salary = store.create_category("Salary", Direction::Income).unwrap();
    let rent = store.create_category("Rent", Direction::Expenditure).unwrap();
    store
        .create_log(NewLog::new(salary.id, 55000.0).at(at(1, 9)))
        .unwrap();
    store
        .create_log(NewLog::new(rent.id, 15000.0).at(at(3, 9)))
        .unwrap();
    // outside the period
    store
        .create_log(
            NewLog::new(rent.id, 999.0).at(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()),
        )
        .unwrap();

    app.set_goal(&Goal::new(50000.0, 30000.0, 20000.0)).unwrap();
    let report = app.goal_report(&march()).expect("goal report");

    assert_eq!(report.period.start, "2024-03-01");
    assert_eq!(report.period.end, "2024-03-31");
    let details = report.details;
    assert!(details.income.achieved);
    assert_eq!(details.income.percentage, 110.0);
    assert!(details.expenditure.achieved);
    assert_eq!(details.expenditure.percentage, 50.0);
    assert!(details.total_save.achieved);
    assert_eq!(details.total_save.actual, 40000.0);
    assert_eq!(details.total_save.percentage, 200.0);
}

#[test]
fn zero_expenditure_goal_with_no_spending() {
    let (app, _) = setup_test_app();
    app.set_goal(&Goal::new(0.0, 0.0, 0.0)).unwrap();

    let report = app.goal_report(&march()).expect("goal report");
    assert!(report.details.expenditure.achieved);
    assert_eq!(report.details.expenditure.percentage, 0.0);
    assert_eq!(
        GoalEngine::period_actuals(app.store(), &march()).unwrap(),
        GoalActuals::default()
    );
}

#[test]
fn goal_report_requires_a_stored_goal() {
    let (app, _) = setup_test_app();
    let err = app.goal_report(&march()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn empty_period_has_no_data() {
    let (app, _) = setup_test_app();
    let analysis = app.analysis_report(Some(&march())).unwrap();
    assert!(analysis.is_no_data());
    let json = serde_json::to_value(&analysis).unwrap();
    assert_eq!(json["status"], "no_data");
}

#[test]
fn identical_queries_return_identical_rows() {
    let (app, _) = setup_test_app();
    seed_salary_and_food(&app, &[20.0, 20.0, 20.0, 5.0]);

    let query = LogQuery::new()
        .direction(Direction::Expenditure)
        .sort(SortField::Amount, true)
        .limit(3);
    let first = app.query(&query).unwrap();
    let second = app.query(&query).unwrap();
    assert_eq!(first, second);
    let ids: Vec<u64> = first.iter().map(|row| row.id.get()).collect();
    // equal amounts fall back to ascending id
    assert_eq!(ids, vec![2, 3, 4]);
}

#[test]
fn inverted_amount_range_is_rejected() {
    let (app, _) = setup_test_app();
    let err = app
        .query(&LogQuery::new().amount_between(Some(10.0), Some(1.0)))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn deleting_a_category_removes_its_logs() {
    let (app, _) = setup_test_app();
    seed_salary_and_food(&app, &[10.0, 20.0]);
    assert!(app.store().delete_category_by_name("food").unwrap());

    let rows = app.query(&LogQuery::new()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].category.as_deref(), Some("Salary"));
    assert!(app
        .query(&LogQuery::new().category_named("Food"))
        .unwrap()
        .is_empty());
}
