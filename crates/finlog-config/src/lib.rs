//! finlog-config
//!
//! Settings model (storage locations, advice capability options) plus disk
//! persistence with partial updates.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::ConfigManager;
pub use model::{AdviceSettings, AdviceSettingsPatch, Settings, SettingsPatch};
