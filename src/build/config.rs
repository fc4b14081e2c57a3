//! BUILD file structures
//!
//! A workspace is described by a TOML file named `BUILD` at its root:
//! a `[toolchain]` section, a `[flags]` section with workspace-wide
//! defaults, and `[[binary]]` / `[[test]]` / `[[library]]` /
//! `[[submodule]]` tables.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::build::scope::{FlagSet, Overrides};
use crate::system::{self, Error};

/// Config data read from a BUILD file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// The `[toolchain]` section
    pub toolchain: Toolchain,

    /// The `[flags]` section, workspace-wide defaults
    pub flags: FlagSet,

    /// The `[[submodule]]` tables
    #[serde(rename = "submodule", skip_serializing_if = "Vec::is_empty")]
    pub submodules: Vec<SubmoduleConfig>,

    /// The `[[binary]]` tables
    #[serde(rename = "binary", skip_serializing_if = "Vec::is_empty")]
    pub binaries: Vec<ArtifactConfig>,

    /// The `[[test]]` tables
    #[serde(rename = "test", skip_serializing_if = "Vec::is_empty")]
    pub tests: Vec<ArtifactConfig>,

    /// The `[[library]]` tables. Names ending in `.a` become static
    /// archives, names ending in `.so` become shared objects.
    #[serde(rename = "library", skip_serializing_if = "Vec::is_empty")]
    pub libraries: Vec<ArtifactConfig>,
}

impl Config {
    /// Load a config from a file
    pub fn from_path<S>(path: S) -> Result<Self, Error>
    where
        S: AsRef<Path>,
    {
        let path = path.as_ref();
        let content = system::read_file(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::ParseConfig(path.display().to_string(), e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Error> {
        for artifact in self
            .binaries
            .iter()
            .chain(self.tests.iter())
            .chain(self.libraries.iter())
        {
            if artifact.name.is_empty() {
                return Err(Error::NoArtifactName);
            }
        }
        for library in &self.libraries {
            if !library.name.ends_with(".a") && !library.name.ends_with(".so") {
                return Err(Error::InvalidLibraryName(library.name.clone()));
            }
        }
        Ok(())
    }
}

/// The `[toolchain]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Toolchain {
    /// The C compiler
    pub cc: String,
    /// The C++ compiler, also used for linking
    pub cxx: String,
    /// The protobuf compiler
    pub protoc: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            cc: "gcc".to_string(),
            cxx: "g++".to_string(),
            protoc: "protoc".to_string(),
        }
    }
}

/// One artifact declaration. The flag fields are per-artifact overrides
/// layered over the `[flags]` section; list-valued overrides append.
/// Any other key is rejected at parse time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactConfig {
    /// The artifact name. Required (checked after parsing so the error
    /// names the problem rather than the TOML position).
    pub name: String,

    /// Source globs, relative to the workspace root
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,

    /// Protobuf inputs, relative to the workspace root
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub protos: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cxx: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cflags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cxxflags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ldflags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ldlibs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<String>,
}

impl ArtifactConfig {
    /// The artifact-layer overrides, with include patterns still
    /// unexpanded.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            cc: self.cc.clone(),
            cxx: self.cxx.clone(),
            flags: FlagSet {
                cflags: self.cflags.clone(),
                cxxflags: self.cxxflags.clone(),
                ldflags: self.ldflags.clone(),
                ldlibs: self.ldlibs.clone(),
                includes: self.includes.clone(),
            },
        }
    }
}

/// One `[[submodule]]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubmoduleConfig {
    /// Path to the sub-workspace, relative to this workspace
    pub workspace: String,
    /// Library file names the sub-workspace produces under its `lib/`
    pub libs: Vec<String>,
}
