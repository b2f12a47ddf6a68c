use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the file systems, the compressor and the composer.
#[derive(Debug, Error)]
pub enum Error {
    /// A call into the host file system failed. The underlying
    /// [std::io::Error] is kept untouched, so its message (and kind) can be
    /// inspected by callers.
    #[error("{op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: no such file or directory", .0.display())]
    NotFound(PathBuf),

    #[error("{}: is a directory", .0.display())]
    IsADirectory(PathBuf),

    #[error("{}: not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("{}: invalid path", .0.display())]
    InvalidPath(PathBuf),

    /// The bundle body could not be decoded, or it decoded to a different
    /// number of entries than declared.
    #[error("corrupt bundle {name}: {reason}")]
    Corrupt { name: String, reason: String },

    #[error("unable to compress bundle: {0}")]
    Compression(#[source] std::io::Error),

    /// An error raised by a walk callback. It is handed back to the caller
    /// of `walk` as is.
    #[error(transparent)]
    Visit(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl Error {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            op,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(name: &str, reason: impl ToString) -> Self {
        Error::Corrupt {
            name: name.to_owned(),
            reason: reason.to_string(),
        }
    }

    /// Wraps an arbitrary error so it can be returned from a walk callback.
    pub fn visit<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Error::Visit(err.into())
    }

    /// Returns the [std::io::ErrorKind] closest to this error.
    pub fn kind(&self) -> std::io::ErrorKind {
        match self {
            Error::Io { source, .. } => source.kind(),
            Error::NotFound(_) => std::io::ErrorKind::NotFound,
            Error::IsADirectory(_) => std::io::ErrorKind::IsADirectory,
            Error::NotADirectory(_) => std::io::ErrorKind::NotADirectory,
            Error::InvalidPath(_) => std::io::ErrorKind::InvalidInput,
            Error::Corrupt { .. } => std::io::ErrorKind::InvalidData,
            Error::Compression(e) => e.kind(),
            Error::Visit(_) => std::io::ErrorKind::Other,
        }
    }
}

impl From<Error> for std::io::Error {
    fn from(value: Error) -> Self {
        match value {
            Error::Io { source, .. } => source,
            e => Self::new(e.kind(), e),
        }
    }
}
