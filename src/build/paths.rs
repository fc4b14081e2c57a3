//! Pattern expansion and workspace layout

use std::path::{Path, PathBuf};

use crate::system::Error;

/// The user-authored build description at each workspace root
pub const BUILD_FILE: &str = "BUILD";
/// Build-state directory kept next to the BUILD file
pub const BUILD_ROOT: &str = ".biu";
/// Directory all generated artifacts are placed under
pub const OUTPUT_DIR: &str = "output";

/// Expand user-supplied patterns against the filesystem.
///
/// Each pattern is tilde-expanded, resolved against `root` when
/// relative, then matched with POSIX glob semantics (`*`, `?`, `[..]`).
/// The result concatenates per-pattern matches in input order; matches
/// under `root` are reported root-relative. Duplicates are preserved,
/// de-duplication is a caller concern.
pub fn expand(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, Error> {
    let mut paths = Vec::new();
    for pattern in patterns {
        let expanded = expand_tilde(pattern);
        let full = if Path::new(&expanded).is_absolute() {
            expanded.clone()
        } else {
            root.join(&expanded).display().to_string()
        };
        let matches =
            glob::glob(&full).map_err(|e| Error::InvalidPattern(pattern.clone(), e))?;
        for entry in matches.flatten() {
            let path = entry
                .strip_prefix(root)
                .map(Path::to_path_buf)
                .unwrap_or(entry);
            paths.push(path);
        }
    }
    Ok(paths)
}

/// Expand a leading `~/` to the user home directory. Patterns without
/// one (or with no resolvable home) pass through unchanged.
fn expand_tilde(pattern: &str) -> String {
    if let Some(rest) = pattern.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).display().to_string();
        }
    }
    pattern.to_string()
}

/// Well-known paths of one workspace. All absolute except
/// `output_root`, which is the root-relative prefix every generated
/// target starts with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    /// Absolute workspace root (where BUILD is)
    pub root: PathBuf,
    /// The BUILD file (<root>/BUILD)
    pub build_file: PathBuf,
    /// The generated Makefile (<root>/Makefile)
    pub makefile: PathBuf,
    /// The build-state directory (<root>/.biu)
    pub build_root: PathBuf,
    /// The target cache (<root>/.biu/targets)
    pub targets_file: PathBuf,
    /// Workspace list for `clean` (<root>/.biu/modules)
    pub modules_file: PathBuf,
    /// Generated protobuf source list for `clean` (<root>/.biu/protos)
    pub protos_file: PathBuf,
    /// The output directory (<root>/output)
    pub output_dir: PathBuf,
    /// Root-relative artifact prefix (output/<module>)
    pub output_root: PathBuf,
}

impl Layout {
    pub fn new(root: &Path, module_name: &str) -> Self {
        let build_root = root.join(BUILD_ROOT);
        Self {
            root: root.to_path_buf(),
            build_file: root.join(BUILD_FILE),
            makefile: root.join("Makefile"),
            targets_file: build_root.join("targets"),
            modules_file: build_root.join("modules"),
            protos_file: build_root.join("protos"),
            build_root,
            output_dir: root.join(OUTPUT_DIR),
            output_root: Path::new(OUTPUT_DIR).join(module_name),
        }
    }
}
