use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use finlog_core::{
    storage::LedgerStorage, AnalysisEngine, LogQuery, QueryEngine, ReportPeriod, SortField,
};
use finlog_domain::{Direction, LedgerSnapshot, Period};
use finlog_storage_json::{JsonLedgerStorage, StoragePaths};
use tempfile::tempdir;

fn build_sample_ledger(log_count: usize) -> LedgerSnapshot {
    let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let mut ledger = LedgerSnapshot::new(start);

    let salary = ledger.add_category("Salary", Direction::Income);
    let categories = [
        ledger.add_category("Groceries", Direction::Expenditure),
        ledger.add_category("Transport", Direction::Expenditure),
        ledger.add_category("Dining", Direction::Expenditure),
        ledger.add_category("Utilities", Direction::Expenditure),
    ];

    for idx in 0..log_count {
        let timestamp = start + Duration::hours((idx % (365 * 24)) as i64);
        if idx % 30 == 0 {
            ledger.add_log(salary, Direction::Income, 3000.0, None, timestamp);
            continue;
        }
        let note = (idx % 7 == 0).then(|| format!("receipt #{idx}"));
        ledger.add_log(
            categories[idx % categories.len()],
            Direction::Expenditure,
            5.0 + (idx % 100) as f64,
            note,
            timestamp,
        );
    }
    ledger
}

fn bench_queries(c: &mut Criterion) {
    let ledger = build_sample_ledger(black_box(10_000));
    let june = Period::for_month(2025, 6).unwrap();

    c.bench_function("query_default_10k", |b| {
        b.iter(|| black_box(QueryEngine::run(&ledger, &LogQuery::new()).unwrap()))
    });

    let filtered = LogQuery::for_period(&june)
        .direction(Direction::Expenditure)
        .amount_between(Some(20.0), Some(80.0))
        .note_contains("RECEIPT")
        .sort(SortField::Category, false)
        .limit(50);
    c.bench_function("query_filtered_10k", |b| {
        b.iter(|| black_box(QueryEngine::run(&ledger, &filtered).unwrap()))
    });
}

fn bench_analysis(c: &mut Criterion) {
    let ledger = build_sample_ledger(black_box(10_000));
    let rows = QueryEngine::run(&ledger, &LogQuery::new()).unwrap();

    c.bench_function("summarize_10k", |b| {
        b.iter(|| black_box(AnalysisEngine::summarize(&rows, ReportPeriod::describe(None))))
    });
}

fn bench_snapshot_io(c: &mut Criterion) {
    let ledger = build_sample_ledger(black_box(10_000));
    let dir = tempdir().expect("tempdir");
    let storage = JsonLedgerStorage::new(StoragePaths {
        ledger_file: dir.path().join("ledger.json"),
        backup_root: dir.path().join("backups"),
    })
    .expect("storage");

    c.bench_function("snapshot_save_10k", |b| {
        b.iter(|| storage.save_snapshot(&ledger).expect("save"))
    });

    c.bench_function("snapshot_load_10k", |b| {
        b.iter(|| black_box(storage.load_snapshot().expect("load")))
    });
}

criterion_group!(benches, bench_queries, bench_analysis, bench_snapshot_io);
criterion_main!(benches);
