//! Saved game state and the file store that persists it.
use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    mode::state::SceneMode,
    stats::{GameFlags, GameStats, StatKey},
    world::time::{ClockReading, GameClock},
};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("snapshot at {path} is malformed: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("snapshot version {found} is not supported (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

/// Everything needed to resume play: true stat values, raised flags, the
/// clock and the active scene. Mode and in-flight work are not saved; a
/// restore always lands in overview with nothing pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub version: u32,
    pub stats: BTreeMap<StatKey, f32>,
    pub flags: Vec<String>,
    pub clock: ClockReading,
    pub scene: SceneMode,
}

impl GameSnapshot {
    pub fn capture(stats: &GameStats, flags: &GameFlags, clock: &GameClock, scene: SceneMode) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            stats: stats.snapshot(),
            flags: flags.iter().map(str::to_string).collect(),
            clock: clock.reading(),
            scene,
        }
    }
}

/// Persistence backend for snapshots.
pub trait SnapshotStore: Send + Sync {
    fn save(&self, snapshot: &GameSnapshot) -> Result<(), SnapshotError>;

    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<GameSnapshot>, SnapshotError>;

    fn describe(&self) -> String;
}

/// Pretty-printed JSON in a single file, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct JsonSnapshotFile {
    path: PathBuf,
}

impl JsonSnapshotFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> SnapshotError {
        SnapshotError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SnapshotStore for JsonSnapshotFile {
    fn save(&self, snapshot: &GameSnapshot) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }

        let json =
            serde_json::to_string_pretty(snapshot).map_err(|source| SnapshotError::Serialization {
                path: self.path.clone(),
                source,
            })?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, json).map_err(|err| self.io_error(err))?;
        fs::rename(&temp_path, &self.path).map_err(|err| self.io_error(err))?;

        debug!(target: "persistence", "Snapshot written to {}", self.path.display());
        Ok(())
    }

    fn load(&self) -> Result<Option<GameSnapshot>, SnapshotError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error(err)),
        };

        let snapshot: GameSnapshot =
            serde_json::from_str(&data).map_err(|source| SnapshotError::Serialization {
                path: self.path.clone(),
                source,
            })?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        debug!(target: "persistence", "Snapshot read from {}", self.path.display());
        Ok(Some(snapshot))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::stats::NumericStore;

    fn snapshot() -> GameSnapshot {
        let mut stats = GameStats::default();
        stats.set_value(StatKey::Money, 321.0);
        let mut flags = GameFlags::default();
        flags.set("worked_once");
        let mut clock = GameClock::default();
        clock.advance(3);
        GameSnapshot::capture(&stats, &flags, &clock, SceneMode::LocationB)
    }

    #[test]
    fn saves_into_missing_directories_and_reads_back() {
        let dir = tempdir().expect("temp dir");
        let store = JsonSnapshotFile::new(dir.path().join("saves/slot.json"));

        assert!(store.load().expect("missing file is not an error").is_none());

        let saved = snapshot();
        store.save(&saved).expect("save succeeds");
        let loaded = store.load().expect("load succeeds").expect("snapshot present");
        assert_eq!(loaded, saved);
        assert_eq!(loaded.stats.get(&StatKey::Money), Some(&321.0));
        assert!(!dir.path().join("saves/slot.json.tmp").exists());
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("slot.json");
        fs::write(&path, "{ not json").expect("write fixture");

        let error = JsonSnapshotFile::new(&path).load().expect_err("malformed");
        assert!(matches!(error, SnapshotError::Serialization { .. }));
    }

    #[test]
    fn future_versions_are_rejected() {
        let dir = tempdir().expect("temp dir");
        let store = JsonSnapshotFile::new(dir.path().join("slot.json"));
        let mut future = snapshot();
        future.version = SNAPSHOT_VERSION + 1;
        store.save(&future).expect("save succeeds");

        let error = store.load().expect_err("version mismatch");
        assert!(matches!(
            error,
            SnapshotError::UnsupportedVersion { found, .. } if found == SNAPSHOT_VERSION + 1
        ));
    }
}
