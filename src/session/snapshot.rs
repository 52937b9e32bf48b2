use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::WorkoutSet;

pub const SNAPSHOT_FILE: &str = "active_session.json";

/// What the user has recorded for one exercise so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseProgress {
    pub sets: Vec<WorkoutSet>,
    pub distance_km: Option<f64>,
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub notes: String,
}

/// Everything needed to put an interrupted session back together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub task_id: String,
    pub exercise_index: usize,
    pub elapsed_seconds: u64,
    pub progress: BTreeMap<usize, ExerciseProgress>,
    /// The exercise on screen when the snapshot was taken.
    pub current: ExerciseProgress,
    #[serde(default)]
    pub current_touched: bool,
    pub saved_at: DateTime<Utc>,
}

/// A single-slot JSON file next to the database.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SNAPSHOT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Overwrites the slot. Writes go through a temp file so a crash never
    /// leaves half a snapshot behind.
    pub fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }

        let temp_path = self.path.with_extension("tmp");
        let file = File::create(&temp_path)
            .with_context(|| format!("Failed to create {}", temp_path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, snapshot)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to move snapshot into {}", self.path.display()))?;
        Ok(())
    }

    /// Reads without consuming.
    pub fn load(&self) -> Result<Option<SessionSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let snapshot = serde_json::from_str(&raw)
            .with_context(|| format!("Corrupt session snapshot at {}", self.path.display()))?;
        Ok(Some(snapshot))
    }

    /// Returns whether there was anything to remove.
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", self.path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> SessionSnapshot {
        let mut progress = BTreeMap::new();
        progress.insert(
            0,
            ExerciseProgress {
                sets: vec![WorkoutSet {
                    reps: 8,
                    weight: Some(40.0),
                    is_completed: true,
                }],
                ..Default::default()
            },
        );
        SessionSnapshot {
            task_id: "task-1".into(),
            exercise_index: 1,
            elapsed_seconds: 754,
            progress,
            current: ExerciseProgress {
                distance_km: Some(2.5),
                notes: "felt easy".into(),
                ..Default::default()
            },
            current_touched: true,
            saved_at: Utc::now(),
        }
    }

    #[test]
    fn save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        assert!(store.load().unwrap().is_none());
        assert!(!store.clear().unwrap());

        let snap = snapshot();
        store.save(&snap).unwrap();
        assert!(store.exists());
        assert!(!store.path().with_extension("tmp").exists());

        assert_eq!(store.load().unwrap(), Some(snap.clone()));
        // loading does not consume
        assert_eq!(store.load().unwrap(), Some(snap));

        assert!(store.clear().unwrap());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn second_save_overwrites_the_slot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("nested"));

        let mut snap = snapshot();
        store.save(&snap).unwrap();
        snap.exercise_index = 2;
        snap.elapsed_seconds = 900;
        store.save(&snap).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.exercise_index, 2);
        assert_eq!(loaded.elapsed_seconds, 900);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load().is_err());
    }
}
