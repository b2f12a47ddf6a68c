use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parcel(#[from] parcel::Error),

    #[error("unable to {op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} has no usable name", .0.display())]
    Unnamed(PathBuf),

    #[error("unable to write output: {0}")]
    Output(#[source] io::Error),

    #[error(transparent)]
    Tracing(#[from] parcel_tracing::Error),
}

impl Error {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }
}
