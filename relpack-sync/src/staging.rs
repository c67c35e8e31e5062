//! Tarball staging.
//!
//! Candidates are the files in the source directory whose name matches the
//! package's glob pattern. Staging copies each candidate into the package
//! checkout and then moves the source file into `<source>/done`. A file in
//! `done` is never looked at again, so `done` is the record of what has
//! already been processed.
//!
//! No locking: two runs against the same source directory race.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::error::{io_err, SyncError};

/// Archive subdirectory of the tarball source directory.
pub const DONE_DIR: &str = "done";

const TARBALL_SUFFIX: &str = ".tar.xz";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagingResult {
    /// Nothing in the source directory matches the pattern.
    NoTarballFound,
    /// Every candidate is already present in the checkout, or was archived
    /// to `done` by an earlier run and is present in the checkout.
    AlreadyStaged,
    Staged {
        /// File names copied into the checkout.
        copied: Vec<String>,
        /// File names moved into `done`.
        archived: Vec<String>,
        /// Stale tarballs deleted from the checkout.
        removed: Vec<String>,
    },
}

/// Sorted names of the files in `source_dir` matching `pattern`.
pub fn candidates(source_dir: &Path, pattern: &str) -> Result<Vec<String>, SyncError> {
    let glob = Pattern::new(pattern).map_err(|source| SyncError::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut names = Vec::new();
    let entries = std::fs::read_dir(source_dir).map_err(|e| io_err(source_dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(source_dir, e))?;
        let file_type = entry.file_type().map_err(|e| io_err(entry.path(), e))?;
        if !file_type.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if glob.matches(&name) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Stage the tarballs matching `pattern` from `source_dir` into `checkout_dir`.
pub fn stage(
    checkout_dir: &Path,
    source_dir: &Path,
    pattern: &str,
) -> Result<StagingResult, SyncError> {
    let names = candidates(source_dir, pattern)?;
    if names.is_empty() {
        let done = source_dir.join(DONE_DIR);
        if done.is_dir() {
            let archived = candidates(&done, pattern)?;
            if !archived.is_empty() && archived.iter().all(|n| checkout_dir.join(n).exists()) {
                tracing::info!("Tarballs matching {} were already processed", pattern);
                return Ok(StagingResult::AlreadyStaged);
            }
        }
        tracing::info!("No tarballs matching {} in {}", pattern, source_dir.display());
        return Ok(StagingResult::NoTarballFound);
    }
    if names.iter().all(|n| checkout_dir.join(n).exists()) {
        tracing::info!(
            "All tarballs matching {} already copied to {}",
            pattern,
            checkout_dir.display()
        );
        return Ok(StagingResult::AlreadyStaged);
    }

    let removed = remove_stale(checkout_dir, &names)?;

    let done = source_dir.join(DONE_DIR);
    std::fs::create_dir_all(&done).map_err(|e| io_err(&done, e))?;

    let mut copied = Vec::new();
    let mut archived = Vec::new();
    for name in names {
        let src = source_dir.join(&name);
        let dest = checkout_dir.join(&name);
        if dest.exists() {
            tracing::debug!("Tarball {} already copied", name);
        } else {
            std::fs::copy(&src, &dest).map_err(|e| io_err(&dest, e))?;
            tracing::debug!("copied {} -> {}", src.display(), dest.display());
            copied.push(name.clone());
        }
        move_file(&src, &done.join(&name))?;
        tracing::debug!("archived {}", name);
        archived.push(name);
    }

    Ok(StagingResult::Staged {
        copied,
        archived,
        removed,
    })
}

/// Delete `*.tar.xz` files in `checkout_dir` not named in `keep`.
fn remove_stale(checkout_dir: &Path, keep: &[String]) -> Result<Vec<String>, SyncError> {
    let keep: BTreeSet<&str> = keep.iter().map(String::as_str).collect();
    let mut stale: Vec<PathBuf> = Vec::new();
    let entries = std::fs::read_dir(checkout_dir).map_err(|e| io_err(checkout_dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(checkout_dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(TARBALL_SUFFIX) && !keep.contains(name.as_str()) {
            stale.push(entry.path());
        }
    }
    stale.sort();

    let mut removed = Vec::with_capacity(stale.len());
    for path in stale {
        std::fs::remove_file(&path).map_err(|e| io_err(&path, e))?;
        tracing::debug!("removed stale tarball {}", path.display());
        if let Some(name) = path.file_name() {
            removed.push(name.to_string_lossy().into_owned());
        }
    }
    Ok(removed)
}

/// Rename, falling back to copy + remove across filesystems.
fn move_file(from: &Path, to: &Path) -> Result<(), SyncError> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    std::fs::copy(from, to).map_err(|e| io_err(to, e))?;
    std::fs::remove_file(from).map_err(|e| io_err(from, e))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
