//! # relpack-sync
//!
//! Package update orchestration.
//!
//! - [`staging`]: copy tarballs into a checkout, archive them to `done`
//! - [`writer`]: atomic writes and `.changes` prepending
//! - [`changelog`]: upstream lookup and fallbacks around synthesis
//! - [`update`]: the per-package state machine ([`PackageUpdater`])
//! - [`batch`] / [`pipeline`]: directory-wide runs and their report

pub mod batch;
pub mod changelog;
pub mod error;
pub mod hook;
pub mod pipeline;
pub mod staging;
pub mod update;
pub mod writer;

pub use batch::{BatchReport, PackageResult};
pub use changelog::{record_changes, ChangeSource};
pub use error::SyncError;
pub use pipeline::BatchMode;
pub use staging::StagingResult;
pub use update::{PackageUpdate, PackageUpdater, UpdateOptions};
