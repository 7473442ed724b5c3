#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc, sync::Mutex};

use chrono::{DateTime, TimeZone, Utc};
use finlog::FinanceApp;
use finlog_config::Settings;
use finlog_core::FixedClock;
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
}

/// Creates a unique data directory that outlives the calling test.
pub fn temp_data_dir() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Opens a JSON-backed app rooted in `dir` with the clock pinned to mid-March 2024.
pub fn open_app(dir: &PathBuf) -> FinanceApp {
    let clock = Arc::new(FixedClock(at(15, 12)));
    FinanceApp::open(Settings::in_dir(dir), clock).expect("open finance app")
}

pub fn setup_test_app() -> (FinanceApp, PathBuf) {
    let dir = temp_data_dir();
    (open_app(&dir), dir)
}
