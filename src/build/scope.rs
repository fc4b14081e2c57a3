//! Layered flag configuration

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Join parts into multiline Makefile text with escaped continuations.
pub fn break_str<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts.into_iter().map(|s| s.as_ref().to_string()).join(" \\\n\t")
}

/// One layer of build flags, as authored in the `[flags]` section of a
/// BUILD file or inline on an artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlagSet {
    /// Flags for C source files
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cflags: Vec<String>,
    /// Flags for C++ source files
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cxxflags: Vec<String>,
    /// Flags for the link step
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ldflags: Vec<String>,
    /// Libraries (and library paths) passed at the end of the link line
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ldlibs: Vec<String>,
    /// Include directories, may contain glob patterns
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<String>,
}

impl FlagSet {
    /// Append another layer onto this one. List-valued keys extend,
    /// they never replace.
    pub fn extend(&mut self, other: &FlagSet) {
        self.cflags.extend(other.cflags.iter().cloned());
        self.cxxflags.extend(other.cxxflags.iter().cloned());
        self.ldflags.extend(other.ldflags.iter().cloned());
        self.ldlibs.extend(other.ldlibs.iter().cloned());
        self.includes.extend(other.includes.iter().cloned());
    }
}

/// Per-artifact specialization of the workspace configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub cc: Option<String>,
    pub cxx: Option<String>,
    pub flags: FlagSet,
}

/// A two-level configuration view: the workspace layer below, an
/// artifact layer above. Reads fall through to the workspace layer;
/// list-valued reads chain both layers, workspace first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    cc: String,
    cxx: String,
    parent: FlagSet,
    child: FlagSet,
}

impl Scope {
    pub fn new(cc: &str, cxx: &str, base: FlagSet) -> Self {
        Self {
            cc: cc.to_string(),
            cxx: cxx.to_string(),
            parent: base,
            child: FlagSet::default(),
        }
    }

    /// Lay an artifact's overrides on top of the workspace layer.
    pub fn extend(&mut self, overrides: &Overrides) {
        if let Some(cc) = &overrides.cc {
            self.cc = cc.clone();
        }
        if let Some(cxx) = &overrides.cxx {
            self.cxx = cxx.clone();
        }
        self.child.extend(&overrides.flags);
    }

    pub fn cc(&self) -> &str {
        &self.cc
    }

    pub fn cxx(&self) -> &str {
        &self.cxx
    }

    fn chain<'a>(
        &'a self,
        pick: fn(&FlagSet) -> &Vec<String>,
    ) -> impl Iterator<Item = &'a str> {
        pick(&self.parent)
            .iter()
            .chain(pick(&self.child).iter())
            .map(String::as_str)
    }

    pub fn cflags(&self) -> String {
        self.chain(|f| &f.cflags).join(" ")
    }

    pub fn cxxflags(&self) -> String {
        self.chain(|f| &f.cxxflags).join(" ")
    }

    pub fn ldflags(&self) -> String {
        self.chain(|f| &f.ldflags).join(" ")
    }

    /// Rendered with escaped continuations so long linker lines stay
    /// readable in the generated Makefile.
    pub fn ldlibs(&self) -> String {
        break_str(self.chain(|f| &f.ldlibs))
    }

    pub fn includes(&self) -> String {
        self.chain(|f| &f.includes)
            .map(|dir| format!("-I {}", dir))
            .join(" ")
    }

    /// Raw include directories, in effective order, for the scanner.
    pub fn include_dirs(&self) -> Vec<String> {
        self.chain(|f| &f.includes).map(str::to_string).collect()
    }
}
