//! Artifacts and their rule synthesis

use std::path::{Path, PathBuf};

use crate::build::rule::{LinkLayout, Rule};
use crate::build::scanner::Scanner;
use crate::build::scope::Scope;
use crate::system::{self, Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Binary,
    Test,
    SharedLibrary,
    StaticLibrary,
}

/// A named build output and everything needed to synthesize its rules.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub name: String,
    /// Workspace flags specialized with this artifact's overrides
    pub scope: Scope,
    /// Root-relative sources, glob-expanded, generated pb sources last
    pub sources: Vec<PathBuf>,
    /// Imported sub-module library paths, in declaration order
    pub sub_module_libs: Vec<String>,
    /// Filled by `build`: one Compile rule per source
    pub object_rules: Vec<Rule>,
    /// Filled by `build`: the link/archive rule
    pub link_rule: Option<Rule>,
}

impl Artifact {
    pub fn new(
        kind: ArtifactKind,
        name: String,
        scope: Scope,
        sources: Vec<PathBuf>,
        sub_module_libs: Vec<String>,
    ) -> Self {
        Self {
            kind,
            name,
            scope,
            sources,
            sub_module_libs,
            object_rules: Vec::new(),
            link_rule: None,
        }
    }

    /// Scan every source and synthesize this artifact's rules: one
    /// Compile rule per source, then the link/archive rule whose
    /// prerequisites are the object targets plus the imported
    /// sub-module libraries.
    pub fn build(&mut self, root: &Path, output_root: &Path) -> Result<(), Error> {
        let include_dirs = self.scope.include_dirs();
        let mut scanner = Scanner::new(root, &include_dirs);
        let mut objects = Vec::with_capacity(self.sources.len());
        let total = self.sources.len();
        for (i, source) in self.sources.iter().enumerate() {
            system::infoln!("Analyzing", "{} ({}/{})", source.display(), i + 1, total);
            let prereqs = scanner
                .closure(source)?
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            let rule = Rule::compile(output_root, &self.name, source, prereqs, &self.scope);
            objects.push(rule.target().to_string());
            self.object_rules.push(rule);
        }

        let mut prereqs = objects.clone();
        prereqs.extend(self.sub_module_libs.iter().cloned());
        self.link_rule = Some(match self.kind {
            ArtifactKind::Binary => Rule::link(
                output_root,
                &self.name,
                prereqs,
                &objects,
                &self.scope,
                LinkLayout::Bin,
            ),
            ArtifactKind::Test => Rule::link(
                output_root,
                &self.name,
                prereqs,
                &objects,
                &self.scope,
                LinkLayout::Test,
            ),
            ArtifactKind::SharedLibrary => {
                Rule::shared(output_root, &self.name, prereqs, &objects, &self.scope)
            }
            ArtifactKind::StaticLibrary => {
                Rule::archive(output_root, &self.name, prereqs, &objects)
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::scope::FlagSet;
    use std::fs;

    fn scope() -> Scope {
        Scope::new("gcc", "g++", FlagSet::default())
    }

    #[test]
    fn binary_links_objects_and_imported_libs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.cc"), "").unwrap();
        fs::write(dir.path().join("b.cc"), "").unwrap();

        let mut artifact = Artifact::new(
            ArtifactKind::Binary,
            "app".to_string(),
            scope(),
            vec![PathBuf::from("a.cc"), PathBuf::from("b.cc")],
            vec!["output/sub/lib/libsub.a".to_string()],
        );
        artifact.build(dir.path(), Path::new("output/ws")).unwrap();

        assert_eq!(artifact.object_rules.len(), 2);
        assert_eq!(
            artifact.object_rules[0].target(),
            "output/ws/objs/app/a.cc.o"
        );
        let link = artifact.link_rule.as_ref().unwrap();
        assert_eq!(link.target(), "output/ws/bin/app");
        assert_eq!(
            link.prereqs(),
            &[
                "output/ws/objs/app/a.cc.o".to_string(),
                "output/ws/objs/app/b.cc.o".to_string(),
                "output/sub/lib/libsub.a".to_string(),
            ]
        );
    }

    #[test]
    fn static_library_archives_its_objects() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("z.c"), "").unwrap();

        let mut artifact = Artifact::new(
            ArtifactKind::StaticLibrary,
            "libz.a".to_string(),
            scope(),
            vec![PathBuf::from("z.c")],
            Vec::new(),
        );
        artifact.build(dir.path(), Path::new("output/ws")).unwrap();

        let link = artifact.link_rule.as_ref().unwrap();
        assert_eq!(link.target(), "output/ws/lib/libz.a");
        assert_eq!(
            link.command().unwrap(),
            "ar rcs output/ws/lib/libz.a output/ws/objs/libz.a/z.c.o"
        );
    }

    #[test]
    fn same_source_in_two_artifacts_makes_distinct_objects() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("shared.cc"), "").unwrap();

        let mut first = Artifact::new(
            ArtifactKind::Binary,
            "one".to_string(),
            scope(),
            vec![PathBuf::from("shared.cc")],
            Vec::new(),
        );
        let mut second = Artifact::new(
            ArtifactKind::Binary,
            "two".to_string(),
            scope(),
            vec![PathBuf::from("shared.cc")],
            Vec::new(),
        );
        first.build(dir.path(), Path::new("output/ws")).unwrap();
        second.build(dir.path(), Path::new("output/ws")).unwrap();
        assert_ne!(
            first.object_rules[0].target(),
            second.object_rules[0].target()
        );
    }
}
