//! Error types for relpack-changes.

use std::path::PathBuf;

use thiserror::Error;

use relpack_vcs::VcsError;

#[derive(Debug, Error)]
pub enum ChangesError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Filesystem error while loading user templates.
    #[error("template io error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    /// Upstream history could not be queried.
    #[error(transparent)]
    Vcs(#[from] VcsError),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ChangesError {
    ChangesError::Io {
        path: path.into(),
        source,
    }
}
