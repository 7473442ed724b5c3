use std::{
    fs,
    path::{Path, PathBuf},
};

use finlog_core::{goal_from_value, storage::GoalStorage, CoreError, CoreResult};
use finlog_domain::Goal;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::write_json_atomic;

/// Goal targets stored as a single JSON object.
///
/// Saving merges the three target fields into whatever object is already on
/// disk, so unrelated keys survive.
#[derive(Debug, Clone)]
pub struct JsonGoalStorage {
    path: PathBuf,
}

impl JsonGoalStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn existing_object(&self) -> Map<String, Value> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return Map::new(),
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(object)) => object,
            Ok(_) | Err(_) => {
                warn!(path = %self.path.display(), "goal file is corrupt, resetting");
                Map::new()
            }
        }
    }
}

impl GoalStorage for JsonGoalStorage {
    fn load_goal(&self) -> CoreResult<Goal> {
        if !self.path.exists() {
            return Err(CoreError::GoalNotFound(self.path.display().to_string()));
        }
        let raw = fs::read_to_string(&self.path)?;
        let value: Value = serde_json::from_str(&raw)?;
        goal_from_value(&value)
    }

    fn save_goal(&self, goal: &Goal) -> CoreResult<()> {
        let mut object = self.existing_object();
        object.insert("income".into(), Value::from(goal.income));
        object.insert("expenditure".into(), Value::from(goal.expenditure));
        object.insert("total_save".into(), Value::from(goal.total_save));
        let data = serde_json::to_string_pretty(&Value::Object(object))?;
        write_json_atomic(&self.path, &data)?;
        info!(path = %self.path.display(), "goal saved");
        Ok(())
    }
}
