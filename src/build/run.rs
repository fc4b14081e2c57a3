//! The biu build and clean commands

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rustc_hash::FxHashSet;

use crate::build::cache::{CacheDiff, TargetCache};
use crate::build::module::Module;
use crate::build::{makefile, paths, proto};
use crate::system::{self, Error, PathExt};
use crate::Options;

/// Run biu build: evaluate the BUILD tree rooted at `dir`, generate a
/// Makefile per workspace, and refresh each workspace's target cache.
pub fn run(dir: &str, _options: &Options) -> Result<(), Error> {
    let start_time = Instant::now();
    let root = Path::new(dir).canonicalize2()?;

    let mut workspaces: Vec<PathBuf> = Vec::new();
    let mut proto_srcs: Vec<String> = Vec::new();
    let mut seen: FxHashSet<PathBuf> = FxHashSet::default();
    let mut queue = VecDeque::new();
    queue.push_back(root.clone());

    let mut top_name = String::new();
    while let Some(workspace) = queue.pop_front() {
        if !seen.insert(workspace.clone()) {
            continue;
        }
        let mut module = Module::load(&workspace)?;
        system::infoln!("Building", "{}", module.name);
        if top_name.is_empty() {
            top_name = module.name.clone();
        }

        let generated = proto::generate(&module)?;
        module.build_artifacts()?;
        makefile::emit(&module)?;
        let diff = refresh_cache(&module)?;
        if !diff.is_empty() {
            system::verboseln!(
                "Invalidated",
                "{} dirty, {} expired, {} cascaded",
                diff.dirty.len(),
                diff.expired.len(),
                diff.cascaded.len()
            );
        }

        for pb in &generated {
            proto_srcs.push(rel_or_abs(&module.layout.root.join(pb), &root));
        }
        for sub in &module.sub_modules {
            queue.push_back(sub.workspace.clone());
        }
        workspaces.push(workspace);
    }

    // control files under the top workspace so clean can find the tree
    system::ensure_directory(root.join(paths::BUILD_ROOT))?;
    let lines: Vec<String> = workspaces
        .iter()
        .map(|ws| ws.display().to_string())
        .collect();
    write_lines(&root.join(paths::BUILD_ROOT).join("modules"), &lines)?;
    write_lines(&root.join(paths::BUILD_ROOT).join("protos"), &proto_srcs)?;

    let elapsed = start_time.elapsed();
    system::infoln!(
        "Finished",
        "{} in {:.2}s",
        top_name,
        elapsed.as_secs_f32()
    );
    system::hintln!("Hint", "run `make` to compile the project");
    Ok(())
}

/// Run biu clean: remove the Makefile, build state and outputs of
/// every recorded workspace, plus all generated protobuf sources.
pub fn clean(dir: &str, _options: &Options) -> Result<(), Error> {
    let root = Path::new(dir).canonicalize2()?;
    let build_root = root.join(paths::BUILD_ROOT);
    let modules_file = build_root.join("modules");
    let protos_file = build_root.join("protos");

    if protos_file.exists() {
        for line in system::read_file(&protos_file)?.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let path = Path::new(line);
            let path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                root.join(path)
            };
            system::remove_file(path)?;
        }
    }

    let mut workspaces = vec![root.clone()];
    if modules_file.exists() {
        workspaces = system::read_file(&modules_file)?
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect();
    }
    for workspace in workspaces {
        system::remove_file(workspace.join("Makefile"))?;
        system::remove_directory(workspace.join(paths::BUILD_ROOT))?;
        system::remove_directory(workspace.join(paths::OUTPUT_DIR))?;
        system::infoln!("Cleaned", "{}", workspace.display());
    }
    Ok(())
}

fn refresh_cache(module: &Module) -> Result<CacheDiff, Error> {
    let mut cache = TargetCache::open(&module.layout.root, &module.layout.targets_file);
    for artifact in &module.artifacts {
        for rule in &artifact.object_rules {
            cache.set(
                rule.target(),
                rule.prereqs().to_vec(),
                rule.command().unwrap_or_default(),
                true,
            );
        }
        if let Some(rule) = &artifact.link_rule {
            cache.set(
                rule.target(),
                rule.prereqs().to_vec(),
                rule.command().unwrap_or_default(),
                false,
            );
        }
    }
    cache.save()
}

fn write_lines(path: &Path, lines: &[String]) -> Result<(), Error> {
    let mut content = lines.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    system::write_file(path, content)
}

/// Paths under `base` are recorded relative to it; everything else
/// stays absolute so clean can still resolve it.
fn rel_or_abs(path: &Path, base: &Path) -> String {
    match pathdiff::diff_paths(path, base) {
        Some(rel) if !rel.starts_with("..") => rel.display().to_string(),
        _ => path.display().to_string(),
    }
}
