//! Makefile rule variants
//!
//! Every rule serializes as
//! `TARGET : PREREQ1 \`-continuations, then a tab-indented command.
//! Commands are normalized to single spaces at construction so empty
//! flag groups leave no holes in the rendered line.

use std::fmt;
use std::path::Path;

use crate::build::scope::{break_str, Scope};

/// Which compiler front-end a source goes through. Dispatch is by
/// suffix: `.c` is C, everything else is C++.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationUnit {
    C,
    Cxx,
}

impl TranslationUnit {
    pub fn of(source: &Path) -> Self {
        match source.extension() {
            Some(ext) if ext == "c" => Self::C,
            _ => Self::Cxx,
        }
    }
}

/// Where a linked executable lands under the output root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkLayout {
    Bin,
    Test,
}

impl LinkLayout {
    fn dir(self) -> &'static str {
        match self {
            Self::Bin => "bin",
            Self::Test => "test",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Compile one translation unit to an object file
    Compile {
        target: String,
        prereqs: Vec<String>,
        command: String,
        source: String,
        unit: TranslationUnit,
    },
    /// Link objects into an executable
    Link {
        target: String,
        prereqs: Vec<String>,
        command: String,
        layout: LinkLayout,
    },
    /// Archive objects into a static library
    Static {
        target: String,
        prereqs: Vec<String>,
        command: String,
    },
    /// Link objects into a shared object
    Shared {
        target: String,
        prereqs: Vec<String>,
        command: String,
    },
    /// A target that names an action, not a file
    Phony {
        name: String,
        prereqs: Vec<String>,
        command: String,
    },
    /// Delete every generated target
    Clean { targets: Vec<String> },
}

impl Rule {
    /// Object rule for one source of one artifact. The target path
    /// encodes both so two artifacts can compile the same source with
    /// different flags without collision.
    pub fn compile(
        output_root: &Path,
        artifact: &str,
        source: &Path,
        prereqs: Vec<String>,
        scope: &Scope,
    ) -> Self {
        let target = format!(
            "{}/objs/{}/{}.o",
            output_root.display(),
            artifact,
            source.display()
        );
        let unit = TranslationUnit::of(source);
        let command = match unit {
            TranslationUnit::C => format!(
                "{} -o {} -c {} {} {}",
                scope.cc(),
                target,
                scope.cflags(),
                scope.includes(),
                source.display()
            ),
            TranslationUnit::Cxx => format!(
                "{} -o {} -c {} {} {}",
                scope.cxx(),
                target,
                scope.cxxflags(),
                scope.includes(),
                source.display()
            ),
        };
        Self::Compile {
            target,
            prereqs,
            command: normalize(&command),
            source: source.display().to_string(),
            unit,
        }
    }

    /// Link rule for a binary or test executable. The `-(` / `-)`
    /// grouping lets `ld` resolve circular library dependencies.
    pub fn link(
        output_root: &Path,
        name: &str,
        prereqs: Vec<String>,
        objs: &[String],
        scope: &Scope,
        layout: LinkLayout,
    ) -> Self {
        let target = format!("{}/{}/{}", output_root.display(), layout.dir(), name);
        let command = format!(
            "{} -o {} -Wl,-E {} {} -Xlinker \"-(\" {} -Xlinker \"-)\"",
            scope.cxx(),
            target,
            break_str(objs),
            scope.ldflags(),
            scope.ldlibs()
        );
        Self::Link {
            target,
            prereqs,
            command: normalize(&command),
            layout,
        }
    }

    pub fn shared(
        output_root: &Path,
        name: &str,
        prereqs: Vec<String>,
        objs: &[String],
        scope: &Scope,
    ) -> Self {
        let target = format!("{}/lib/{}", output_root.display(), name);
        let command = format!(
            "{} -o {} -shared -fPIC {} {} -Xlinker \"-(\" {} -Xlinker \"-)\"",
            scope.cxx(),
            target,
            break_str(objs),
            scope.ldflags(),
            scope.ldlibs()
        );
        Self::Shared {
            target,
            prereqs,
            command: normalize(&command),
        }
    }

    pub fn archive(
        output_root: &Path,
        name: &str,
        prereqs: Vec<String>,
        objs: &[String],
    ) -> Self {
        let target = format!("{}/lib/{}", output_root.display(), name);
        let command = format!("ar rcs {} {}", target, break_str(objs));
        Self::Static {
            target,
            prereqs,
            command: normalize(&command),
        }
    }

    pub fn phony<S>(name: &str, prereqs: Vec<String>, command: S) -> Self
    where
        S: Into<String>,
    {
        Self::Phony {
            name: name.to_string(),
            prereqs,
            command: command.into(),
        }
    }

    /// The `clean` rule. The leading `-` tells make to ignore removal
    /// failures.
    pub fn clean(targets: Vec<String>) -> Self {
        Self::Clean { targets }
    }

    pub fn target(&self) -> &str {
        match self {
            Self::Compile { target, .. }
            | Self::Link { target, .. }
            | Self::Static { target, .. }
            | Self::Shared { target, .. } => target,
            Self::Phony { name, .. } => name,
            Self::Clean { .. } => "clean",
        }
    }

    pub fn prereqs(&self) -> &[String] {
        match self {
            Self::Compile { prereqs, .. }
            | Self::Link { prereqs, .. }
            | Self::Static { prereqs, .. }
            | Self::Shared { prereqs, .. }
            | Self::Phony { prereqs, .. } => prereqs,
            Self::Clean { .. } => &[],
        }
    }

    pub fn command(&self) -> Option<String> {
        match self {
            Self::Compile { command, .. }
            | Self::Link { command, .. }
            | Self::Static { command, .. }
            | Self::Shared { command, .. } => Some(command.clone()),
            Self::Phony { command, .. } => {
                (!command.is_empty()).then(|| command.clone())
            }
            Self::Clean { targets } => {
                Some(format!("-rm -fr {}", break_str(targets)))
            }
        }
    }

    /// True for rules that produce an object file; the cache treats
    /// those differently from link/archive rules on cascade.
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Compile { .. })
    }

    /// True for rules whose target is not a file on disk.
    pub fn is_phony(&self) -> bool {
        matches!(self, Self::Phony { .. } | Self::Clean { .. })
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.target(), break_str(self.prereqs()))?;
        if let Some(command) = self.command() {
            write!(f, "\n\t{}", command)?;
        }
        Ok(())
    }
}

/// Merge consecutive spaces. Continuation sequences live inside
/// tokens, so they survive.
fn normalize(command: &str) -> String {
    command
        .split(' ')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
