//! Modification-time snapshots for incremental builds.
//!
//! A snapshot maps every file in the content tree to its last observed
//! modification time. Comparing the snapshot persisted by the previous run
//! with a fresh capture tells the orchestrator which files need to be copied
//! and re-rendered (see [`crate::changes`]).
//!
//! # Design
//!
//! ## Keys
//!
//! Keys are paths relative to the content root, `/`-separated
//! (`guides/intro.html`). Relative keys survive moving the whole project
//! directory and are exactly the input [`crate::sync::selective_sync`]
//! expects.
//!
//! ## Values
//!
//! Modification time as `f64` seconds since the Unix epoch, with the
//! sub-second part the platform reports. No content hashing: a file rewritten
//! with identical bytes still counts as modified, and a file restored with an
//! old timestamp does not.
//!
//! ## Storage
//!
//! The snapshot file is a flat JSON object, keys sorted:
//!
//! ```json
//! {
//!   "guides/intro.html": 1718031102.4431105,
//!   "index.html": 1718030950.0
//! }
//! ```
//!
//! Saving writes to a temporary sibling and renames it over the target, so a
//! crash mid-write never leaves a truncated snapshot behind. Floats are
//! written with shortest round-trip formatting, which makes `save(load())` a
//! byte-for-byte no-op.

use crate::naming;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Cannot scan content tree: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Cannot persist snapshot to {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Path key → modification time in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    entries: BTreeMap<String, f64>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current modification time of every file under `content_dir`.
    ///
    /// Symlinks are followed. Files whose relative path is not valid UTF-8
    /// cannot be keyed and are skipped with a warning.
    pub fn capture(content_dir: &Path) -> Result<Self, SnapshotError> {
        let mut snapshot = Self::new();
        for entry in WalkDir::new(content_dir)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if crate::sync::is_dangling(&e) => {
                    warn!(error = %e, "skipping dangling entry");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if !naming::has_utf8_key(content_dir, entry.path()) {
                warn!(path = %entry.path().display(), "skipping file with non-UTF-8 name");
                continue;
            }
            let metadata = entry.metadata()?;
            let modified = metadata.modified().map_err(|source| SnapshotError::Io {
                path: entry.path().to_path_buf(),
                source,
            })?;
            snapshot.insert(
                naming::path_key(content_dir, entry.path()),
                seconds_since_epoch(modified),
            );
        }
        debug!(files = snapshot.len(), dir = %content_dir.display(), "captured snapshot");
        Ok(snapshot)
    }

    pub fn insert(&mut self, key: impl Into<String>, modified: f64) {
        self.entries.insert(key.into(), modified);
    }

    pub fn remove(&mut self, key: &str) -> Option<f64> {
        self.entries.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries.get(key).copied()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, f64)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Convert a filesystem timestamp to fractional seconds since the epoch.
///
/// Times before the epoch are reported as negative seconds.
pub fn seconds_since_epoch(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}

/// Persists a [`Snapshot`] to a single JSON file.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted snapshot.
    ///
    /// Returns an empty snapshot if the file doesn't exist or can't be parsed;
    /// every file then counts as new.
    pub fn load(&self) -> Snapshot {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Snapshot::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cannot read snapshot, starting empty");
                return Snapshot::new();
            }
        };
        match serde_json::from_str(&content) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "corrupt snapshot, starting empty");
                Snapshot::new()
            }
        }
    }

    /// Atomically replace the persisted snapshot.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        self.write_atomic(snapshot).map_err(|source| SnapshotError::Persistence {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), files = snapshot.len(), "snapshot saved");
        Ok(())
    }

    /// Delete the persisted snapshot so every file counts as new.
    pub fn clear(&self) -> Result<(), SnapshotError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "snapshot cleared");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SnapshotError::Persistence {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write_atomic(&self, snapshot: &Snapshot) -> io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let mut json = serde_json::to_string_pretty(snapshot)?;
        json.push('\n');

        let temp_path = self.temp_path();
        fs::write(&temp_path, json)?;
        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".tmp-{}", std::process::id()));
        self.path.with_file_name(name)
    }
}
