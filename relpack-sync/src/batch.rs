//! Batch processing over a directory of package checkouts.
//!
//! A failing package never stops the batch: every package ends up as one
//! [`SyncOutcome`] in the [`BatchReport`].

use std::fmt;
use std::path::{Path, PathBuf};

use relpack_core::{spec, OutcomeBucket, PackageName, SyncOutcome};

use crate::error::{io_err, SyncError};
use crate::update::{PackageUpdater, UpdateOptions};
use crate::writer;

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageResult {
    pub name: PackageName,
    pub outcome: SyncOutcome,
}

/// Outcomes of one batch run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub results: Vec<PackageResult>,
}

impl BatchReport {
    pub fn record(&mut self, name: PackageName, outcome: SyncOutcome) {
        tracing::info!("{}: {}", name, outcome);
        self.results.push(PackageResult { name, outcome });
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn count(&self, bucket: OutcomeBucket) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome.bucket() == bucket)
            .count()
    }

    pub fn names(&self, bucket: OutcomeBucket) -> Vec<&PackageName> {
        self.results
            .iter()
            .filter(|r| r.outcome.bucket() == bucket)
            .map(|r| &r.name)
            .collect()
    }

    pub fn outcome_of(&self, name: &str) -> Option<&SyncOutcome> {
        self.results
            .iter()
            .find(|r| r.name.as_str() == name)
            .map(|r| &r.outcome)
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {} packages: updated {}, skipped {}, failed {}, missing {}",
            self.total(),
            self.count(OutcomeBucket::Updated),
            self.count(OutcomeBucket::Skipped),
            self.count(OutcomeBucket::Failed),
            self.count(OutcomeBucket::Missing),
        )?;
        for (title, bucket) in [
            ("Missing packages:", OutcomeBucket::Missing),
            ("Failed packages:", OutcomeBucket::Failed),
        ] {
            let names = self.names(bucket);
            if names.is_empty() {
                continue;
            }
            write!(f, "\n{title}")?;
            for name in names {
                write!(f, "\n- {name}")?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Directory scan
// ---------------------------------------------------------------------------

/// Non-hidden immediate subdirectories of `root`, sorted by name.
pub fn package_dirs(root: &Path) -> Result<Vec<PathBuf>, SyncError> {
    let mut dirs = Vec::new();
    let entries = std::fs::read_dir(root).map_err(|e| io_err(root, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(root, e))?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// Update every package under `root` to `target_version`.
pub fn update_all(
    root: &Path,
    target_version: &str,
    updater: &PackageUpdater<'_>,
    options: &UpdateOptions,
) -> Result<BatchReport, SyncError> {
    let mut report = BatchReport::default();
    for dir in package_dirs(root)? {
        let update = updater.update(&dir, target_version, options);
        report.record(spec::package_name(&dir), update.outcome);
    }
    Ok(report)
}

// ---------------------------------------------------------------------------
// Sync from unstable
// ---------------------------------------------------------------------------

/// Bring every package under `stable_root` in line with its counterpart
/// under `unstable_root`, then update it to `target_version`.
///
/// Packages without a counterpart are recorded as missing. The unstable
/// spec's version is the baseline of the update. Patch drift is measured
/// against the stable package's patches as they were before the files
/// were replaced. The entry written on success is also prepended to the
/// unstable `.changes`.
pub fn sync_from_unstable(
    stable_root: &Path,
    unstable_root: &Path,
    target_version: &str,
    updater: &PackageUpdater<'_>,
    options: &UpdateOptions,
) -> Result<BatchReport, SyncError> {
    let mut report = BatchReport::default();
    for dest in package_dirs(stable_root)? {
        let name = spec::package_name(&dest);
        let source = unstable_root.join(name.as_str());
        if !source.is_dir() {
            tracing::warn!("{} not found in {}", name, unstable_root.display());
            report.record(name, SyncOutcome::MissingCheckout);
            continue;
        }
        let outcome = match sync_package(&source, &dest, target_version, updater, options) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("Syncing {} failed: {}", name, e);
                SyncOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };
        report.record(name, outcome);
    }
    Ok(report)
}

fn sync_package(
    source: &Path,
    dest: &Path,
    target_version: &str,
    updater: &PackageUpdater<'_>,
    options: &UpdateOptions,
) -> Result<SyncOutcome, SyncError> {
    let baseline = spec::read_with(&spec::spec_path(source), &options.table)?;
    let previous_patches = match spec::read_with(&spec::spec_path(dest), &options.table) {
        Ok(stable) => stable.patches,
        Err(e) => {
            tracing::warn!(
                "Cannot read {} before syncing, patch changes are not tracked: {}",
                dest.display(),
                e
            );
            baseline.patches
        }
    };
    replace_package_files(source, dest)?;

    let options = UpdateOptions {
        version_from: Some(baseline.version),
        previous_patches: Some(previous_patches),
        ..options.clone()
    };
    let update = updater.update(dest, target_version, &options);
    if let Some(entry) = &update.entry {
        writer::prepend_entry(&writer::changes_path(source), &entry.text)?;
    }
    Ok(update.outcome)
}

fn is_synced_file(name: &str) -> bool {
    !name.starts_with('.') && !name.ends_with(".changes")
}

/// Replace the non-hidden, non-`.changes` files of `dest` with those of
/// `source`. Subdirectories are left alone.
pub fn replace_package_files(source: &Path, dest: &Path) -> Result<(), SyncError> {
    for entry in std::fs::read_dir(dest).map_err(|e| io_err(dest, e))? {
        let entry = entry.map_err(|e| io_err(dest, e))?;
        let path = entry.path();
        if path.is_file() && is_synced_file(&entry.file_name().to_string_lossy()) {
            std::fs::remove_file(&path).map_err(|e| io_err(&path, e))?;
        }
    }
    for entry in std::fs::read_dir(source).map_err(|e| io_err(source, e))? {
        let entry = entry.map_err(|e| io_err(source, e))?;
        let path = entry.path();
        let name = entry.file_name();
        if path.is_file() && is_synced_file(&name.to_string_lossy()) {
            let target = dest.join(&name);
            std::fs::copy(&path, &target).map_err(|e| io_err(&target, e))?;
            tracing::debug!("copied {} -> {}", path.display(), target.display());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn package_dirs_skip_hidden_and_files() {
        let root = TempDir::new().unwrap();
        for dir in ["okular", ".osc", "kate"] {
            fs::create_dir(root.path().join(dir)).unwrap();
        }
        fs::write(root.path().join("README"), "").unwrap();
        let dirs = package_dirs(root.path()).unwrap();
        let names: Vec<_> = dirs.iter().map(|d| spec::package_name(d).0).collect();
        assert_eq!(names, vec!["kate", "okular"]);
    }

    #[test]
    fn report_format() {
        let mut report = BatchReport::default();
        report.record("kate".into(), SyncOutcome::Updated);
        report.record("okular".into(), SyncOutcome::AlreadyCurrent);
        report.record("dolphin".into(), SyncOutcome::MissingCheckout);
        report.record(
            "kdelibs4".into(),
            SyncOutcome::Failed {
                reason: "boom".to_string(),
            },
        );
        assert_eq!(
            report.to_string(),
            "Processed 4 packages: updated 1, skipped 1, failed 1, missing 1\n\
             Missing packages:\n- dolphin\n\
             Failed packages:\n- kdelibs4"
        );
    }

    #[test]
    fn replace_keeps_hidden_and_changes_files() {
        let root = TempDir::new().unwrap();
        let src = root.path().join("src");
        let dest = root.path().join("dest");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(dest.join(".osc")).unwrap();
        fs::write(src.join("kate.spec"), "new spec").unwrap();
        fs::write(src.join("kate.changes"), "unstable log").unwrap();
        fs::write(dest.join("kate.spec"), "old spec").unwrap();
        fs::write(dest.join("old.patch"), "stale").unwrap();
        fs::write(dest.join("kate.changes"), "stable log").unwrap();
        fs::write(dest.join(".osc").join("_files"), "meta").unwrap();

        replace_package_files(&src, &dest).unwrap();

        assert_eq!(fs::read_to_string(dest.join("kate.spec")).unwrap(), "new spec");
        assert_eq!(fs::read_to_string(dest.join("kate.changes")).unwrap(), "stable log");
        assert!(!dest.join("old.patch").exists());
        assert!(dest.join(".osc").join("_files").exists());
    }
}
