//! Shared batch entrypoint used by the CLI.

use std::path::PathBuf;

use crate::batch::{sync_from_unstable, update_all, BatchReport};
use crate::update::{PackageUpdater, UpdateOptions};
use crate::SyncError;

/// Which batch workflow to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchMode {
    /// Update every package checkout under `root`.
    Update { root: PathBuf },
    /// Reconcile `stable_root` against `unstable_root`, then update.
    SyncFromUnstable {
        stable_root: PathBuf,
        unstable_root: PathBuf,
    },
}

/// Run a batch to `target_version`.
pub fn run(
    mode: &BatchMode,
    target_version: &str,
    updater: &PackageUpdater<'_>,
    options: &UpdateOptions,
) -> Result<BatchReport, SyncError> {
    match mode {
        BatchMode::Update { root } => update_all(root, target_version, updater, options),
        BatchMode::SyncFromUnstable {
            stable_root,
            unstable_root,
        } => sync_from_unstable(stable_root, unstable_root, target_version, updater, options),
    }
}
