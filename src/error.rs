use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Bundle text is malformed or carries nothing installable.
    #[error("invalid package format: {0}")]
    Format(String),

    #[error("no .whl files downloaded (it may have fallen back to source)")]
    NoWheels,

    #[error("'{program}' failed with exit code {code:?}: {stderr}")]
    Process {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("failed to execute '{program}'")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("target path exists and is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
