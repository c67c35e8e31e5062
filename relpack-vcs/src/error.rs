//! Error types for relpack-vcs.

use thiserror::Error;

/// Failure of an external tool invocation.
#[derive(Debug, Error)]
pub enum VcsError {
    /// The tool could not be started at all.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran and exited non-zero.
    #[error("`{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// A revision (tag, branch, commit) could not be resolved.
    #[error("unknown revision '{rev}'")]
    UnknownRevision { rev: String },
}
