use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no game named '{name}' in the catalog")]
    NotFound { name: String },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error("{path} is not a readable directory")]
    InvalidDirectory { path: PathBuf },

    #[error("no runnable files found in {path}")]
    NoRunnableFiles { path: PathBuf },

    #[error("remote catalog at {endpoint} is not available")]
    RemoteUnavailable { endpoint: String },

    #[error("prompt canceled")]
    PromptCanceled,

    #[error("prompt failed: {message}")]
    PromptFailed { message: String },
}

/// Failures reading or writing the catalog document.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("failed to read catalog {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("catalog {path} is malformed: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },

    #[error("failed to serialize catalog: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to write catalog {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("{path} does not exist")]
    MissingFile { path: PathBuf },

    #[error("{path} is not executable and no interpreter is configured for it")]
    NotExecutable { path: PathBuf },

    #[error("failed to start {path}: {source}")]
    Spawn { path: PathBuf, source: io::Error },
}
