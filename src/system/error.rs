//! Error types

use std::process::ExitStatus;

use crate::system;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // pre-check
    #[error("`BUILD` not found in `{0}`. Please run inside a biu workspace.")]
    NotWorkspace(String),
    #[error("Cannot find required tool `{0}`: {1}")]
    MissingTool(String, which::Error),

    // fs
    #[error("Cannot find `{0}`")]
    NotFound(String),
    #[error("`{0}` already exists")]
    AlreadyExists(String),
    #[error("Invalid path `{0}`: {1}")]
    InvalidPath(String, std::io::Error),
    #[error("Cannot read file `{0}`: {1}")]
    ReadFile(String, std::io::Error),
    #[error("Cannot write file `{0}`: {1}")]
    WriteFile(String, std::io::Error),
    #[error("Cannot remove file `{0}`: {1}")]
    RemoveFile(String, std::io::Error),
    #[error("Cannot create directory `{0}`: {1}")]
    CreateDirectory(String, std::io::Error),
    #[error("Cannot remove directory `{0}`: {1}")]
    RemoveDirectory(String, std::io::Error),
    #[error("Cannot link `{0}`: {1}")]
    Symlink(String, std::io::Error),

    // process
    #[error("error spawning `{0}`: {1}")]
    SpawnChild(String, std::io::Error),
    #[error("error executing `{0}`: {1}")]
    WaitForChild(String, std::io::Error),

    // config
    #[error("Cannot parse `{0}`: {1}")]
    ParseConfig(String, String),
    #[error("Cannot render `{0}`: {1}")]
    RenderConfig(String, String),
    #[error("An artifact is missing a `name`")]
    NoArtifactName,
    #[error("Library `{0}` must end in `.a` or `.so`")]
    InvalidLibraryName(String),
    #[error("Invalid glob pattern `{0}`: {1}")]
    InvalidPattern(String, glob::PatternError),

    // build
    #[error("protoc exited with status {0}. Check the errors above.")]
    Protoc(ExitStatus),
    #[error("Cannot save target cache `{0}`: {1}")]
    SaveCache(String, serde_json::Error),

    #[cfg(windows)]
    #[error("The program is not supported on Windows.")]
    Windows,
}

impl Error {
    pub fn print(&self) {
        system::errorln!("Fatal", "{}", self);
    }
}
