//! finlog-domain
//!
//! Pure domain models (Category, FinanceLog, Goal, LedgerSnapshot, Period).
//! No I/O, no storage. Only data types and core enums.

pub mod category;
pub mod common;
pub mod direction;
pub mod goal;
pub mod ledger;
pub mod log;

pub use category::*;
pub use common::*;
pub use direction::*;
pub use goal::*;
pub use ledger::*;
pub use log::*;
