use std::{
    cmp::Reverse,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use finlog_core::{storage::LedgerStorage, CoreError, CoreResult};
use finlog_domain::{LedgerSnapshot, CURRENT_SCHEMA_VERSION};
use tracing::{debug, info, warn};

mod goal;

pub use goal::JsonGoalStorage;

const JSON_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S%3f";
const TMP_SUFFIX: &str = "tmp";
pub const DEFAULT_RETENTION: usize = 5;

/// Where the ledger file and its backups live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    pub ledger_file: PathBuf,
    pub backup_root: PathBuf,
}

/// Filesystem-backed JSON persistence for the ledger snapshot and its backups.
#[derive(Debug, Clone)]
pub struct JsonLedgerStorage {
    paths: StoragePaths,
    retention: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub path: PathBuf,
}

impl JsonLedgerStorage {
    pub fn new(paths: StoragePaths) -> CoreResult<Self> {
        Self::with_retention(paths, DEFAULT_RETENTION)
    }

    pub fn with_retention(paths: StoragePaths, retention: usize) -> CoreResult<Self> {
        if let Some(parent) = paths.ledger_file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir_all(&paths.backup_root)?;
        Ok(Self {
            paths,
            retention: retention.max(1),
        })
    }

    pub fn ledger_path(&self) -> &Path {
        &self.paths.ledger_file
    }

    pub fn backup_dir(&self) -> &Path {
        &self.paths.backup_root
    }

    /// Backups of the ledger file, newest first.
    pub fn list_backups(&self) -> CoreResult<Vec<BackupInfo>> {
        let dir = self.backup_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(JSON_EXTENSION) {
                continue;
            }
            if let Some(file_name) = path.file_name().and_then(|name| name.to_str()) {
                entries.push(BackupInfo {
                    id: file_name.to_string(),
                    created_at: parse_backup_timestamp(file_name),
                    path: path.clone(),
                });
            }
        }
        entries.sort_by_key(|info| Reverse((info.created_at, backup_sequence(&info.id))));
        Ok(entries)
    }

    /// Replaces the ledger file with the given backup and returns its snapshot.
    pub fn restore_backup(&self, backup: &BackupInfo) -> CoreResult<LedgerSnapshot> {
        if !backup.path.exists() {
            return Err(CoreError::Storage(format!(
                "backup `{}` not found",
                backup.id
            )));
        }
        let snapshot = load_snapshot_from_path(&backup.path)?;
        self.save_snapshot(&snapshot)?;
        info!(backup = %backup.id, "ledger restored from backup");
        Ok(snapshot)
    }

    /// Copies the current ledger file aside, stamped with `stamp`.
    fn backup_existing_file(&self, stamp: DateTime<Utc>) -> CoreResult<()> {
        let path = self.ledger_path();
        if !path.exists() {
            return Ok(());
        }
        let dir = self.backup_dir();
        fs::create_dir_all(dir)?;
        let stem = format!(
            "{}_{}",
            canonical_name(&file_stem(path)),
            stamp.format(BACKUP_TIMESTAMP_FORMAT)
        );
        // continue past the highest surviving sequence for this stamp
        let next_sequence = self
            .list_backups()?
            .iter()
            .filter_map(|backup| {
                let rest = backup.id.strip_prefix(&stem)?;
                if rest == format!(".{JSON_EXTENSION}") {
                    Some(1)
                } else {
                    rest.strip_prefix('-')
                        .map(|_| backup_sequence(&backup.id) + 1)
                }
            })
            .max();
        let backup_path = match next_sequence {
            None => dir.join(format!("{stem}.{JSON_EXTENSION}")),
            Some(sequence) => dir.join(format!("{stem}-{sequence}.{JSON_EXTENSION}")),
        };
        fs::copy(path, &backup_path)?;
        debug!(backup = %backup_path.display(), "ledger backup written");
        self.prune_backups()
    }

    fn prune_backups(&self) -> CoreResult<()> {
        for entry in self.list_backups()?.into_iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(&entry.path) {
                warn!(backup = %entry.id, %err, "failed to prune backup");
            }
        }
        Ok(())
    }
}

impl LedgerStorage for JsonLedgerStorage {
    fn load_snapshot(&self) -> CoreResult<Option<LedgerSnapshot>> {
        let path = self.ledger_path();
        if !path.exists() {
            debug!(path = %path.display(), "no ledger file yet");
            return Ok(None);
        }
        load_snapshot_from_path(path).map(Some)
    }

    fn save_snapshot(&self, snapshot: &LedgerSnapshot) -> CoreResult<()> {
        self.backup_existing_file(snapshot.updated_at)?;
        write_json_atomic(self.ledger_path(), &serialize_snapshot(snapshot)?)
    }
}

/// Loads a snapshot, refusing files written by a newer schema.
pub fn load_snapshot_from_path(path: &Path) -> CoreResult<LedgerSnapshot> {
    let data = fs::read_to_string(path)?;
    let snapshot: LedgerSnapshot = serde_json::from_str(&data)?;
    if snapshot.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(CoreError::Storage(format!(
            "ledger schema v{} is newer than supported v{}",
            snapshot.schema_version, CURRENT_SCHEMA_VERSION
        )));
    }
    Ok(snapshot)
}

fn serialize_snapshot(snapshot: &LedgerSnapshot) -> CoreResult<String> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default()
        .to_string()
}

fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '-',
        })
        .collect();
    if sanitized.trim_matches('-').is_empty() {
        "ledger".into()
    } else {
        sanitized
    }
}

/// Reads `<stem>_<YYYYmmdd>_<HHMMSSmmm>[-n].json`.
fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let trimmed = name.strip_suffix(&format!(".{JSON_EXTENSION}"))?;
    let mut segments = trimmed.rsplit('_');
    let time = segments.next()?;
    let time = time.split('-').next().unwrap_or(time);
    let date = segments.next()?;
    if !is_digits(date, 8) || !is_digits(time, 9) {
        return None;
    }
    NaiveDateTime::parse_from_str(&format!("{date}{time}"), "%Y%m%d%H%M%S%3f")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

/// Collision counter appended when two backups share a timestamp.
fn backup_sequence(name: &str) -> u32 {
    name.strip_suffix(&format!(".{JSON_EXTENSION}"))
        .and_then(|stem| stem.rsplit_once('_'))
        .and_then(|(_, time)| time.split_once('-'))
        .and_then(|(_, seq)| seq.parse().ok())
        .unwrap_or(0)
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

/// Writes to a sibling temp file, then renames it over `path`.
pub(crate) fn write_json_atomic(path: &Path, data: &str) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    {
        let mut file = File::create(&tmp)?;
        file.write_all(data.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_names_round_trip_their_timestamp() {
        let parsed = parse_backup_timestamp("ledger_20240305_101500250.json").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-05T10:15:00.250+00:00");
        assert_eq!(
            parse_backup_timestamp("ledger_20240305_101500250-2.json"),
            Some(parsed)
        );
        assert_eq!(backup_sequence("ledger_20240305_101500250-2.json"), 2);
        assert_eq!(backup_sequence("ledger_20240305_101500250.json"), 0);
        assert_eq!(parse_backup_timestamp("ledger.json"), None);
        assert_eq!(parse_backup_timestamp("ledger_2024_1015.json"), None);
    }

    #[test]
    fn tmp_path_keeps_original_extension() {
        assert_eq!(
            tmp_path(Path::new("/data/ledger.json")),
            PathBuf::from("/data/ledger.json.tmp")
        );
        assert_eq!(tmp_path(Path::new("/data/goal")), PathBuf::from("/data/goal.tmp"));
    }

    #[test]
    fn canonical_name_falls_back_for_symbols() {
        assert_eq!(canonical_name("My Ledger"), "my-ledger");
        assert_eq!(canonical_name("???"), "ledger");
    }
}
