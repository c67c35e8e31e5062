//! Error types for relpack-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or rewriting a package spec file.
#[derive(Debug, Error)]
pub enum SpecError {
    /// Underlying I/O failure, with the offending path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a well-formed spec document.
    #[error("failed to parse spec file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// `write_version` found no `Version:` line to rewrite.
    #[error("no Version: field in {path}")]
    MissingVersion { path: PathBuf },
}

/// Errors raised while loading or resolving user configuration.
///
/// Every variant is fatal: the run aborts before any package is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error, with the config file path.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// Neither the command line nor the config file named a committer.
    #[error("you must specify one committer (--committer or `committer:` in the config file)")]
    MissingCommitter,
}

pub(crate) fn spec_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SpecError {
    SpecError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn config_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
