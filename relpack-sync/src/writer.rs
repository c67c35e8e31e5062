//! Atomic file replacement and `.changes` prepending.
//!
//! Content goes to `<path>.relpack.tmp` first and is renamed over the
//! target, so readers see either the old file or the new one. A replaced
//! file keeps its permissions.

use std::path::{Path, PathBuf};

use crate::error::{io_err, SyncError};

/// Replace `path` with `content` via a temp sibling and rename.
pub fn atomic_write(path: &Path, content: &str) -> Result<(), SyncError> {
    let tmp = PathBuf::from(format!("{}.relpack.tmp", path.display()));
    atomic_write_with_tmp(path, content, &tmp)
}

fn atomic_write_with_tmp(path: &Path, content: &str, tmp: &Path) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    std::fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;
    let result = keep_permissions(path, tmp).and_then(|()| std::fs::rename(tmp, path));
    if let Err(e) = result {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

/// Give `tmp` the permissions of `path`, if `path` already exists.
fn keep_permissions(path: &Path, tmp: &Path) -> std::io::Result<()> {
    match std::fs::metadata(path) {
        Ok(meta) => std::fs::set_permissions(tmp, meta.permissions()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// `<package_dir>/<package>.changes`.
pub fn changes_path(package_dir: &Path) -> PathBuf {
    let name = relpack_core::spec::package_name(package_dir);
    package_dir.join(format!("{}.changes", name.as_str()))
}

/// Put `entry` at the top of the changes file at `path`.
///
/// The entry is followed by one blank line, then every original line with
/// trailing whitespace removed. A missing file is created.
pub fn prepend_entry(path: &Path, entry: &str) -> Result<(), SyncError> {
    let existing = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(io_err(path, e)),
    };

    let mut out = String::with_capacity(entry.len() + existing.len() + 2);
    out.push_str(entry.trim_end());
    out.push('\n');
    if !existing.is_empty() {
        out.push('\n');
        for line in existing.lines() {
            out.push_str(line.trim_end());
            out.push('\n');
        }
    }

    atomic_write(path, &out)?;
    tracing::debug!("prepended entry to {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
