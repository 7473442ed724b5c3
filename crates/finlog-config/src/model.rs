use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a professional financial advisor. \
Give efficient, precise financial insights without filler.\n\
[Requirements]\n\
1. Identify the one expenditure category that most needs cutting.\n\
2. Propose one concrete savings target.\n\
3. Keep the tone professional and minimal.";

/// Explicit settings value handed to the application at open time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Root directory for ledger, goal and backup files. Defaults to the
    /// platform data directory.
    pub data_dir: Option<PathBuf>,
    pub ledger_file: String,
    pub goal_file: String,
    pub backup_retention: usize,
    pub advice: AdviceSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            ledger_file: "ledger.json".into(),
            goal_file: "goal.json".into(),
            backup_retention: 5,
            advice: AdviceSettings::default(),
        }
    }
}

impl Settings {
    /// Settings rooted at `dir`; handy for tests and portable installs.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(dir.into()),
            ..Self::default()
        }
    }

    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(path) = &self.data_dir {
            return path.clone();
        }

        let base = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join("finlog")
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.resolve_data_dir().join(&self.ledger_file)
    }

    pub fn goal_path(&self) -> PathBuf {
        self.resolve_data_dir().join(&self.goal_file)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.resolve_data_dir().join("backups")
    }

    /// Applies every field present in `patch`; returns whether anything changed.
    pub fn apply(&mut self, patch: SettingsPatch) -> bool {
        let before = self.clone();
        if let Some(data_dir) = patch.data_dir {
            self.data_dir = Some(data_dir);
        }
        if let Some(ledger_file) = patch.ledger_file {
            self.ledger_file = ledger_file;
        }
        if let Some(goal_file) = patch.goal_file {
            self.goal_file = goal_file;
        }
        if let Some(retention) = patch.backup_retention {
            self.backup_retention = retention;
        }
        if let Some(advice) = patch.advice {
            self.advice.apply(advice);
        }
        *self != before
    }
}

/// Options for the external advice capability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdviceSettings {
    pub model_path: PathBuf,
    pub default_system_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub n_ctx: u32,
    pub n_threads: u32,
}

impl Default for AdviceSettings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/advisor.gguf"),
            default_system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            temperature: 0.1,
            max_tokens: 800,
            n_ctx: 0,
            n_threads: 16,
        }
    }
}

impl AdviceSettings {
    fn apply(&mut self, patch: AdviceSettingsPatch) {
        if let Some(model_path) = patch.model_path {
            self.model_path = model_path;
        }
        if let Some(prompt) = patch.default_system_prompt {
            self.default_system_prompt = prompt;
        }
        if let Some(temperature) = patch.temperature {
            self.temperature = temperature;
        }
        if let Some(max_tokens) = patch.max_tokens {
            self.max_tokens = max_tokens;
        }
        if let Some(n_ctx) = patch.n_ctx {
            self.n_ctx = n_ctx;
        }
        if let Some(n_threads) = patch.n_threads {
            self.n_threads = n_threads;
        }
    }
}

/// Partial settings update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SettingsPatch {
    pub data_dir: Option<PathBuf>,
    pub ledger_file: Option<String>,
    pub goal_file: Option<String>,
    pub backup_retention: Option<usize>,
    pub advice: Option<AdviceSettingsPatch>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdviceSettingsPatch {
    pub model_path: Option<PathBuf>,
    pub default_system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub n_ctx: Option<u32>,
    pub n_threads: Option<u32>,
}
