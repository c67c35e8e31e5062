//! Error types for relpack-sync.

use std::path::PathBuf;

use thiserror::Error;

use relpack_changes::ChangesError;
use relpack_core::SpecError;
use relpack_vcs::VcsError;

/// Hard failures of a package update. Batch code turns these into
/// [`relpack_core::SyncOutcome::Failed`] instead of aborting.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("spec error: {0}")]
    Spec(#[from] SpecError),

    #[error("changelog error: {0}")]
    Changes(#[from] ChangesError),

    #[error(transparent)]
    Vcs(#[from] VcsError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A tarball pattern that is not a valid glob.
    #[error("invalid tarball pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
