//! The biu create command

use std::path::Path;

use clap::Parser;

use crate::build::config::{ArtifactConfig, Config};
use crate::build::paths;
use crate::build::scope::FlagSet;
use crate::system::{self, Error};

/// Options for the BUILD scaffold
#[derive(Debug, Clone, Default, PartialEq, Parser)]
pub struct CreateArgs {
    /// Artifact name. eg: app
    #[clap(long, default_value = "app")]
    pub name: String,

    /// Comma-separated source globs
    #[clap(long, value_delimiter = ',')]
    pub sources: Vec<String>,

    /// Comma-separated C compiler flags
    #[clap(long, value_delimiter = ',')]
    pub cflags: Vec<String>,

    /// Comma-separated C++ compiler flags
    #[clap(long, value_delimiter = ',')]
    pub cxxflags: Vec<String>,

    /// Comma-separated linker flags
    #[clap(long, value_delimiter = ',')]
    pub ldflags: Vec<String>,

    /// Comma-separated linker libraries
    #[clap(long, value_delimiter = ',')]
    pub ldlibs: Vec<String>,

    /// Comma-separated include directories
    #[clap(long, value_delimiter = ',')]
    pub includes: Vec<String>,
}

fn or_default(values: &[String], default: &[&str]) -> Vec<String> {
    if values.is_empty() {
        default.iter().map(|s| s.to_string()).collect()
    } else {
        values.to_vec()
    }
}

pub fn create(dir: &str, args: &CreateArgs) -> Result<(), Error> {
    let root = Path::new(dir);
    if !root.exists() {
        return Err(Error::NotFound(root.display().to_string()));
    }
    let build_path = root.join(paths::BUILD_FILE);
    if build_path.exists() {
        return Err(Error::AlreadyExists(build_path.display().to_string()));
    }

    let config = Config {
        flags: FlagSet {
            cflags: or_default(&args.cflags, &["-g", "-pipe", "-Wall", "-std=c99"]),
            cxxflags: or_default(&args.cxxflags, &["-g", "-pipe", "-Wall", "-std=c++11"]),
            ldflags: or_default(&args.ldflags, &["-L."]),
            ldlibs: or_default(&args.ldlibs, &["-lpthread"]),
            includes: args.includes.clone(),
        },
        binaries: vec![ArtifactConfig {
            name: args.name.clone(),
            sources: or_default(&args.sources, &["src/*.cc", "src/*.cpp"]),
            ..Default::default()
        }],
        ..Default::default()
    };

    let content = toml::to_string_pretty(&config)
        .map_err(|e| Error::RenderConfig(build_path.display().to_string(), e.to_string()))?;
    system::write_file(&build_path, &content)?;
    system::infoln!("Created", "{}", build_path.display());
    Ok(())
}
