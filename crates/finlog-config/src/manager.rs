use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::{ConfigError, Settings, SettingsPatch};

const TMP_SUFFIX: &str = "tmp";

/// Handles persistence of [`Settings`].
#[derive(Debug, Clone)]
pub struct ConfigManager {
    settings_path: PathBuf,
}

impl ConfigManager {
    pub fn new(settings_path: PathBuf) -> Self {
        Self { settings_path }
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        let config_dir = base.join("config");
        fs::create_dir_all(&config_dir)?;
        Ok(Self::new(config_dir.join("settings.json")))
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Missing file yields defaults; missing keys fall back per field.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        if self.settings_path.exists() {
            let data = fs::read_to_string(&self.settings_path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Settings::default())
        }
    }

    pub fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(settings)?;
        let tmp = tmp_path(&self.settings_path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.settings_path)?;
        Ok(())
    }

    /// Loads, applies the patch and persists only when something changed.
    pub fn update(&self, patch: SettingsPatch) -> Result<(Settings, bool), ConfigError> {
        let mut settings = self.load()?;
        let changed = settings.apply(patch);
        if changed {
            self.save(&settings)?;
        }
        Ok((settings, changed))
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
