//! Persistent target cache
//!
//! `make` decides staleness by mtime alone, so a flag-only change (or
//! an artifact removed from BUILD) would leave outputs stranded. The
//! cache keeps the previous run's (target, prereqs, command) tuples
//! under `.biu/targets` and deletes outputs whose tuple changed, so
//! the next `make` rebuilds them.

use std::collections::BTreeMap;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::system::{self, Error};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub prereqs: Vec<String>,
    pub command: String,
    pub is_object: bool,
}

/// Outcome of one save: which targets were deleted and why.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheDiff {
    /// prereqs or command changed
    pub dirty: Vec<String>,
    /// present previously, absent now
    pub expired: Vec<String>,
    /// link/archive outputs whose prereqs intersect dirty ∪ expired
    pub cascaded: Vec<String>,
}

impl CacheDiff {
    pub fn is_empty(&self) -> bool {
        self.dirty.is_empty() && self.expired.is_empty() && self.cascaded.is_empty()
    }
}

pub struct TargetCache {
    /// Workspace root; targets are stored root-relative
    root: PathBuf,
    /// The persistent store (<root>/.biu/targets)
    path: PathBuf,
    records: BTreeMap<String, CacheRecord>,
}

impl TargetCache {
    pub fn open(root: &Path, path: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            path: path.to_path_buf(),
            records: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, target: &str, prereqs: Vec<String>, command: String, is_object: bool) {
        self.records.insert(
            target.to_string(),
            CacheRecord {
                prereqs,
                command,
                is_object,
            },
        );
    }

    /// Diff against the previous run, delete stale outputs from disk,
    /// then persist the current records.
    pub fn save(&mut self) -> Result<CacheDiff, Error> {
        let previous = self.load_previous();
        let diff = self.invalidate(&previous)?;

        if let Some(parent) = self.path.parent() {
            system::ensure_directory(parent)?;
        }
        let file = system::create(&self.path)?;
        serde_json::to_writer_pretty(&file, &self.records)
            .map_err(|e| Error::SaveCache(self.path.display().to_string(), e))?;
        file.sync_all()
            .map_err(|e| Error::WriteFile(self.path.display().to_string(), e))?;
        Ok(diff)
    }

    /// A corrupt or unreadable store is not fatal: the worst outcome of
    /// an empty previous snapshot is one over-build.
    fn load_previous(&self) -> BTreeMap<String, CacheRecord> {
        if !self.path.exists() {
            return BTreeMap::new();
        }
        let file = match system::open(&self.path) {
            Ok(file) => BufReader::new(file),
            Err(_) => {
                system::hintln!("Warning", "target cache is unreadable, assuming a fresh build");
                return BTreeMap::new();
            }
        };
        match serde_json::from_reader(file) {
            Ok(records) => records,
            Err(_) => {
                system::hintln!("Warning", "target cache is corrupt, assuming a fresh build");
                BTreeMap::new()
            }
        }
    }

    fn invalidate(&self, previous: &BTreeMap<String, CacheRecord>) -> Result<CacheDiff, Error> {
        let mut diff = CacheDiff::default();

        for (target, record) in &self.records {
            if let Some(old) = previous.get(target) {
                if old.prereqs != record.prereqs || old.command != record.command {
                    self.delete(target)?;
                    diff.dirty.push(target.clone());
                }
            }
        }
        for target in previous.keys() {
            if !self.records.contains_key(target) {
                self.delete(target)?;
                diff.expired.push(target.clone());
            }
        }

        // the object may be regenerated bit-identical, but a consumer
        // whose inputs were invalidated must still relink
        let stale: FxHashSet<&String> =
            diff.dirty.iter().chain(diff.expired.iter()).collect();
        for (target, record) in &self.records {
            if record.is_object || diff.dirty.contains(target) {
                continue;
            }
            if record.prereqs.iter().any(|p| stale.contains(p)) {
                self.delete(target)?;
                diff.cascaded.push(target.clone());
            }
        }
        Ok(diff)
    }

    fn delete(&self, target: &str) -> Result<(), Error> {
        system::remove_file(self.root.join(target))
    }
}
