//! The per-workspace module model

use std::path::{Path, PathBuf};

use crate::build::artifact::{Artifact, ArtifactKind};
use crate::build::config::{ArtifactConfig, Config, SubmoduleConfig, Toolchain};
use crate::build::paths::{self, Layout};
use crate::build::proto;
use crate::build::scope::{FlagSet, Scope};
use crate::system::{self, Error, PathExt};

/// A sub-workspace imported with `[[submodule]]`
#[derive(Debug, Clone, PartialEq)]
pub struct SubModule {
    /// Basename of the sub-workspace directory; also its phony target
    pub name: String,
    /// Absolute path of the sub-workspace
    pub workspace: PathBuf,
    /// Imported library paths, relative to the parent root
    /// (through the `output/<name>` symlink)
    pub libs: Vec<String>,
}

/// One workspace, frozen after BUILD evaluation: everything the build
/// pass needs to synthesize rules and emit a Makefile.
#[derive(Debug, Clone)]
pub struct Module {
    /// Basename of the workspace path
    pub name: String,
    pub layout: Layout,
    pub toolchain: Toolchain,
    /// Workspace-level flags; sub-module libraries are appended to its
    /// ldlibs as they are declared
    base: FlagSet,
    pub artifacts: Vec<Artifact>,
    pub sub_modules: Vec<SubModule>,
    /// Declared protos, in first-seen order, de-duplicated
    pub protos: Vec<PathBuf>,
    /// Phony target names: `all`, `clean`, then one per sub-module
    pub phonies: Vec<String>,
}

impl Module {
    /// Evaluate the BUILD file at `dir` into a frozen Module.
    pub fn load(dir: &Path) -> Result<Self, Error> {
        let root = dir.canonicalize2()?;
        let build_file = root.join(paths::BUILD_FILE);
        if !build_file.exists() {
            return Err(Error::NotWorkspace(root.display().to_string()));
        }
        let config = Config::from_path(&build_file)?;

        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "workspace".to_string());
        let layout = Layout::new(&root, &name);

        let mut base = config.flags.clone();
        base.includes = expand_display(&root, &base.includes)?;

        let mut module = Self {
            name,
            layout,
            toolchain: config.toolchain.clone(),
            base,
            artifacts: Vec::new(),
            sub_modules: Vec::new(),
            protos: Vec::new(),
            phonies: vec!["all".to_string(), "clean".to_string()],
        };

        // sub-modules first: their imported libraries feed every
        // artifact's link line
        for sub in &config.submodules {
            module.add_sub_module(sub)?;
        }
        for cfg in &config.binaries {
            module.add_artifact(ArtifactKind::Binary, cfg)?;
        }
        for cfg in &config.tests {
            module.add_artifact(ArtifactKind::Test, cfg)?;
        }
        for cfg in &config.libraries {
            let kind = if cfg.name.ends_with(".a") {
                ArtifactKind::StaticLibrary
            } else {
                ArtifactKind::SharedLibrary
            };
            module.add_artifact(kind, cfg)?;
        }
        Ok(module)
    }

    fn add_sub_module(&mut self, cfg: &SubmoduleConfig) -> Result<(), Error> {
        let declared = Path::new(&cfg.workspace);
        let workspace = if declared.is_absolute() {
            declared.to_path_buf()
        } else {
            self.layout.root.join(declared)
        }
        .canonicalize2()?;
        let name = workspace
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| cfg.workspace.clone());

        let libs: Vec<String> = cfg
            .libs
            .iter()
            .map(|lib| format!("{}/{}/lib/{}", paths::OUTPUT_DIR, name, lib))
            .collect();
        for lib in &libs {
            self.base.ldlibs.push(lib.clone());
        }
        self.phonies.push(name.clone());
        self.sub_modules.push(SubModule {
            name,
            workspace,
            libs,
        });
        Ok(())
    }

    fn add_artifact(&mut self, kind: ArtifactKind, cfg: &ArtifactConfig) -> Result<(), Error> {
        let root = self.layout.root.clone();
        let mut scope = Scope::new(&self.toolchain.cc, &self.toolchain.cxx, self.base.clone());
        let mut overrides = cfg.overrides();
        overrides.flags.includes = expand_display(&root, &overrides.flags.includes)?;
        scope.extend(&overrides);

        let mut sources = paths::expand(&root, &cfg.sources)?;
        for proto in paths::expand(&root, &cfg.protos)? {
            // generated sources take part in scanning and compilation
            sources.push(proto::pb_source(&proto));
            if !self.protos.contains(&proto) {
                self.protos.push(proto);
            }
        }

        let sub_module_libs = self
            .sub_modules
            .iter()
            .flat_map(|sub| sub.libs.iter().cloned())
            .collect();
        self.artifacts.push(Artifact::new(
            kind,
            cfg.name.clone(),
            scope,
            sources,
            sub_module_libs,
        ));
        Ok(())
    }

    /// Run the build pass: scan sources and synthesize every
    /// artifact's rules.
    pub fn build_artifacts(&mut self) -> Result<(), Error> {
        let root = self.layout.root.clone();
        let output_root = self.layout.output_root.clone();
        for artifact in &mut self.artifacts {
            system::infoln!("Building", "artifact {}", artifact.name);
            artifact.build(&root, &output_root)?;
        }
        Ok(())
    }
}

fn expand_display(root: &Path, patterns: &[String]) -> Result<Vec<String>, Error> {
    Ok(paths::expand(root, patterns)?
        .iter()
        .map(|p| p.display().to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, name: &str, content: &str) {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn load_populates_artifacts_and_phonies() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("ws");
        fs::create_dir(&root).unwrap();
        write(&root, "a.cc", "");
        write(
            &root,
            "BUILD",
            r#"
            [flags]
            cxxflags = ["-O2"]

            [[binary]]
            name = "app"
            sources = ["*.cc"]
            "#,
        );

        let module = Module::load(&root).unwrap();
        assert_eq!(module.name, "ws");
        assert_eq!(module.phonies, vec!["all", "clean"]);
        assert_eq!(module.artifacts.len(), 1);
        assert_eq!(module.artifacts[0].sources, vec![PathBuf::from("a.cc")]);
    }

    #[test]
    fn missing_build_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = Module::load(dir.path()).unwrap_err();
        assert!(matches!(err, Error::NotWorkspace(_)));
    }

    #[test]
    fn sub_module_libs_feed_ldlibs_and_phonies() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("ws");
        fs::create_dir_all(root.join("sub")).unwrap();
        write(&root, "sub/BUILD", "");
        write(&root, "main.cc", "");
        write(
            &root,
            "BUILD",
            r#"
            [[submodule]]
            workspace = "./sub"
            libs = ["libsub.a"]

            [[binary]]
            name = "app"
            sources = ["main.cc"]
            "#,
        );

        let module = Module::load(&root).unwrap();
        assert_eq!(module.phonies, vec!["all", "clean", "sub"]);
        assert_eq!(
            module.artifacts[0].sub_module_libs,
            vec!["output/sub/lib/libsub.a"]
        );
        assert_eq!(
            module.artifacts[0].scope.ldlibs(),
            "output/sub/lib/libsub.a"
        );
    }

    #[test]
    fn protos_are_registered_once_and_add_generated_sources() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("ws");
        fs::create_dir(&root).unwrap();
        write(&root, "p/foo.proto", "");
        write(
            &root,
            "BUILD",
            r#"
            [[binary]]
            name = "app"
            sources = []
            protos = ["p/foo.proto"]

            [[test]]
            name = "app_test"
            sources = []
            protos = ["p/foo.proto"]
            "#,
        );

        let module = Module::load(&root).unwrap();
        assert_eq!(module.protos, vec![PathBuf::from("p/foo.proto")]);
        assert_eq!(
            module.artifacts[0].sources,
            vec![PathBuf::from("p/foo.pb.cc")]
        );
        assert_eq!(
            module.artifacts[1].sources,
            vec![PathBuf::from("p/foo.pb.cc")]
        );
    }

    #[test]
    fn library_kind_follows_the_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("ws");
        fs::create_dir(&root).unwrap();
        write(&root, "z.c", "");
        write(
            &root,
            "BUILD",
            r#"
            [[library]]
            name = "libz.a"
            sources = ["z.c"]

            [[library]]
            name = "libz.so"
            sources = ["z.c"]
            "#,
        );

        let module = Module::load(&root).unwrap();
        assert_eq!(module.artifacts[0].kind, ArtifactKind::StaticLibrary);
        assert_eq!(module.artifacts[1].kind, ArtifactKind::SharedLibrary);
    }
}
