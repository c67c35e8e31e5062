//! relpack core library: domain types, spec file access, configuration.
//!
//! - [`types`]: package identity, release kinds, sync outcomes
//! - [`spec`]: read a [`PackageDescriptor`] from a `.spec` file, rewrite `Version:`
//! - [`config`]: user configuration and the per-package override table
//! - [`error`]: [`SpecError`], [`ConfigError`]

pub mod config;
pub mod error;
pub mod spec;
pub mod types;

pub use config::{Config, PackageOverride, PackageTable, ReponameFold, Settings};
pub use error::{ConfigError, SpecError};
pub use types::{
    OutcomeBucket, PackageDescriptor, PackageName, ReleaseKind, ReleaseType, SyncOutcome,
};
