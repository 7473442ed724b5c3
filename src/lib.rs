#![doc(test(attr(deny(warnings))))]

//! finlog records categorized financial transactions, answers filtered and
//! sorted queries over them, summarizes periods into structured reports and
//! scores the results against savings goals.

pub mod app;
pub mod errors;
pub mod utils;

pub use app::FinanceApp;
pub use errors::{FinlogError, FinlogResult};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("finlog tracing initialized.");
    });
}
