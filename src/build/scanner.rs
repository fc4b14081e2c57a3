//! Quoted-include closure scanning
//!
//! The closure of a translation unit becomes its Make prerequisite
//! list, so editing any header rebuilds the objects that depend on it.
//! Only `#include "..."` is followed; angle-bracket includes are system
//! headers and never scanned.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::system::{self, Error, PathExt};

static INCLUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^#include\s+"([^"]+)""#).unwrap());

/// One scanner per artifact: header extraction is memoized per file,
/// which is only sound while the include directory list is fixed.
pub struct Scanner<'a> {
    root: &'a Path,
    includes: Vec<PathBuf>,
    extracted: FxHashMap<PathBuf, Vec<String>>,
}

impl<'a> Scanner<'a> {
    pub fn new(root: &'a Path, include_dirs: &[String]) -> Self {
        Self {
            root,
            includes: include_dirs.iter().map(PathBuf::from).collect(),
            extracted: FxHashMap::default(),
        }
    }

    /// Compute the prerequisite closure of `source`: the source itself
    /// first, then every transitively included header in discovery
    /// order (breadth-first).
    ///
    /// Headers are resolved by probing the include directories in
    /// order, then the source's own directory; the first existing path
    /// wins. Unresolved quoted includes are skipped: builds routinely
    /// compile with `-I` directories not declared here.
    pub fn closure(&mut self, source: &Path) -> Result<Vec<PathBuf>, Error> {
        // the source's own directory resolves sibling headers; for a
        // root-level source the empty parent yields bare header names
        let mut probe = self.includes.clone();
        if let Some(parent) = source.parent() {
            probe.push(parent.to_path_buf());
        }

        let mut prereqs = Vec::new();
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut resolved: FxHashSet<PathBuf> = FxHashSet::default();
        let mut queue = VecDeque::new();
        queue.push_back(source.to_path_buf());
        if let Ok(canon) = self.absolute(source).canonicalize2() {
            resolved.insert(canon);
        }

        while let Some(file) = queue.pop_front() {
            prereqs.push(file.clone());
            let names = self.headers_of(&file)?.to_vec();
            for name in names {
                if !seen.insert(name.clone()) {
                    continue;
                }
                let Some(found) = self.resolve(&probe, &name) else {
                    continue;
                };
                // two spellings of the same header count once
                let canon = self
                    .absolute(&found)
                    .canonicalize2()
                    .unwrap_or_else(|_| found.clone());
                if resolved.insert(canon) {
                    queue.push_back(found);
                }
            }
        }
        Ok(prereqs)
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn headers_of(&mut self, file: &Path) -> Result<&[String], Error> {
        if !self.extracted.contains_key(file) {
            let content = system::read_file(self.absolute(file))?;
            let names = INCLUDE
                .captures_iter(&content)
                .map(|c| c[1].to_string())
                .collect();
            self.extracted.insert(file.to_path_buf(), names);
        }
        Ok(self.extracted.get(file).expect("just inserted"))
    }

    fn resolve(&self, probe: &[PathBuf], name: &str) -> Option<PathBuf> {
        probe
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| self.absolute(candidate).exists())
    }
}
