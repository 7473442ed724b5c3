//! finlog-core
//!
//! Ledger store, query engine, aggregation engine and goal engine.
//! Depends on finlog-domain. No terminal I/O, no direct filesystem access.

pub mod advice;
pub mod analysis;
pub mod clock;
pub mod error;
pub mod goal;
pub mod ledger_store;
pub mod query;
pub mod storage;

pub use advice::*;
pub use analysis::*;
pub use clock::*;
pub use error::{CoreError, CoreResult, ErrorKind};
pub use goal::*;
pub use ledger_store::*;
pub use query::*;
pub use storage::{ledger_warnings, GoalStorage, LedgerStorage, MemoryStorage};
