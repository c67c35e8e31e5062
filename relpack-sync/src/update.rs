//! Single-package update.
//!
//! ```text
//! read spec ─► already current? ──yes──► AlreadyCurrent
//!                 │ no
//!                 ▼
//!         prepare Version rewrite (in memory)
//!                 │
//!                 ▼
//!         tarball dir present? ──yes──► stage ──none──► MissingTarball
//!                 │ no                    │
//!                 ▼                       │ staged / already staged
//!             download ──err──► DownloadFailed
//!                 │                       │
//!                 ▼                       ▼
//!        synthesize entry ─► prepend .changes ─► write Version ─► hook ─► Updated
//! ```
//!
//! The new spec is built before anything is staged, so a spec whose
//! `Version:` line cannot be rewritten fails without side effects. Renaming
//! it into place is the last file change, so a failure anywhere before it
//! leaves the spec pointing at the old version.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use relpack_changes::{ChangeRequest, ChangelogEntry, Synthesizer};
use relpack_core::{spec, PackageTable, ReleaseKind, ReleaseType, SyncOutcome};
use relpack_vcs::{SourceFetcher, UpstreamRepos};

use crate::changelog::{record_changes, ChangeSource};
use crate::error::SyncError;
use crate::hook;
use crate::staging::{self, StagingResult};
use crate::writer;

/// Settings shared by every package of a run.
#[derive(Debug, Clone)]
pub struct UpdateOptions {
    pub committer: String,
    pub kind: ReleaseKind,
    pub release_type: ReleaseType,
    /// `-b/--stable-branch`.
    pub upstream_branch: Option<String>,
    /// Replaces the spec's version as the "previous" version.
    pub version_from: Option<String>,
    /// Patch list of the previous package, for drift detection.
    pub previous_patches: Option<Vec<String>>,
    pub tarball_dir: Option<PathBuf>,
    /// Header date of every entry written in this run.
    pub timestamp: DateTime<Utc>,
    pub table: PackageTable,
}

impl UpdateOptions {
    pub fn new(committer: impl Into<String>) -> Self {
        UpdateOptions {
            committer: committer.into(),
            kind: ReleaseKind::default(),
            release_type: ReleaseType::default(),
            upstream_branch: None,
            version_from: None,
            previous_patches: None,
            tarball_dir: None,
            timestamp: Utc::now(),
            table: PackageTable::builtin(),
        }
    }
}

/// Result of [`PackageUpdater::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageUpdate {
    pub outcome: SyncOutcome,
    /// The entry written to the `.changes` file, on success.
    pub entry: Option<ChangelogEntry>,
}

impl PackageUpdate {
    fn outcome(outcome: SyncOutcome) -> Self {
        PackageUpdate {
            outcome,
            entry: None,
        }
    }

    pub fn is_updated(&self) -> bool {
        self.outcome.is_updated()
    }
}

/// Updates package checkouts using the given collaborators.
pub struct PackageUpdater<'a> {
    synthesizer: &'a Synthesizer,
    fetcher: &'a dyn SourceFetcher,
    repos: Option<&'a dyn UpstreamRepos>,
}

impl<'a> PackageUpdater<'a> {
    pub fn new(synthesizer: &'a Synthesizer, fetcher: &'a dyn SourceFetcher) -> Self {
        PackageUpdater {
            synthesizer,
            fetcher,
            repos: None,
        }
    }

    /// Read upstream history from `repos` instead of writing dummy entries.
    pub fn with_repos(mut self, repos: &'a dyn UpstreamRepos) -> Self {
        self.repos = Some(repos);
        self
    }

    /// Update the package checked out at `package_dir` to `target_version`.
    ///
    /// Never fails: hard errors become [`SyncOutcome::Failed`].
    pub fn update(
        &self,
        package_dir: &Path,
        target_version: &str,
        options: &UpdateOptions,
    ) -> PackageUpdate {
        match self.try_update(package_dir, target_version, options) {
            Ok(update) => update,
            Err(e) => {
                tracing::warn!("Updating {} failed: {}", package_dir.display(), e);
                PackageUpdate::outcome(SyncOutcome::Failed {
                    reason: e.to_string(),
                })
            }
        }
    }

    fn try_update(
        &self,
        package_dir: &Path,
        target_version: &str,
        options: &UpdateOptions,
    ) -> Result<PackageUpdate, SyncError> {
        let spec_path = spec::spec_path(package_dir);
        let package = spec::read_with(&spec_path, &options.table)?;
        let current = options
            .version_from
            .clone()
            .unwrap_or_else(|| package.version.clone());

        if current == target_version {
            tracing::info!(
                "Package {} is already at the latest version {}, skipping",
                package.name,
                current
            );
            return Ok(PackageUpdate::outcome(SyncOutcome::AlreadyCurrent));
        }
        tracing::info!("Updating package {}", package.name);
        let rewrite = spec::prepare_version(&spec_path, target_version)?;

        match options.tarball_dir.as_deref().filter(|dir| dir.is_dir()) {
            Some(tarball_dir) => {
                let pattern = options.table.tarball_pattern(
                    &package.name,
                    &package.upstream_reponame,
                    target_version,
                );
                match staging::stage(package_dir, tarball_dir, &pattern)? {
                    StagingResult::NoTarballFound => {
                        tracing::info!("No tarballs found for {}, skipping", package.name);
                        return Ok(PackageUpdate::outcome(SyncOutcome::MissingTarball));
                    }
                    StagingResult::AlreadyStaged => {
                        tracing::info!("Tarballs for {} already in place", package.name);
                    }
                    StagingResult::Staged { copied, .. } => {
                        tracing::debug!("staged {} tarball(s) for {}", copied.len(), package.name);
                    }
                }
            }
            None => {
                tracing::info!("No tarball directory, attempting download for {}", package.name);
                if let Err(e) = self.fetcher.fetch(package_dir) {
                    tracing::warn!("Download of {} failed: {}", package.name, e);
                    return Ok(PackageUpdate::outcome(SyncOutcome::DownloadFailed));
                }
            }
        }

        let request = ChangeRequest {
            version_from: current,
            version_to: target_version.to_string(),
            kind: options.kind,
            release_type: options.release_type,
            fallback_branch: None,
            previous_patches: options.previous_patches.clone(),
            current_patches: package.patches.clone(),
            committer: options.committer.clone(),
            timestamp: options.timestamp,
        };
        let source = ChangeSource {
            repos: self.repos,
            table: &options.table,
            branch: options.upstream_branch.as_deref(),
        };
        let entry = record_changes(
            &source,
            self.synthesizer,
            &package.name,
            &package.upstream_reponame,
            request,
        )?;

        writer::prepend_entry(&writer::changes_path(package_dir), &entry.text)?;
        rewrite.commit()?;
        hook::run_pre_checkin(package_dir);

        Ok(PackageUpdate {
            outcome: SyncOutcome::Updated,
            entry: Some(entry),
        })
    }
}
