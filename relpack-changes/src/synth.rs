//! Changelog synthesis from an upstream commit range.
//!
//! The range is `v{version_from}..v{version_to}`. Commits are filtered
//! (silent markers, short subjects, `NO_CHANGELOG`), bug references are
//! extracted from `BUG:` lines, and patch-set drift between the previous
//! and current package is appended as sections needing manual review.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};

use relpack_core::{ReleaseKind, ReleaseType};
use relpack_vcs::{CommitHistory, VcsError};

use crate::context::{EntryContext, SectionCtx};
use crate::engine::TemplateEngine;
use crate::error::ChangesError;

/// Ranges longer than this are summarised in a single line.
pub const MAX_LISTED_COMMITS: usize = 30;

/// Subjects shorter than this ("Fix", "improve it") are not listed.
const MIN_SUBJECT_LEN: usize = 10;

const SILENT_MARKERS: &[&str] = &["GIT_SILENT", "SVN_SILENT"];
const NO_CHANGELOG_MARKER: &str = "NO_CHANGELOG";
const BUG_PREFIX: &str = "BUG:";

// ---------------------------------------------------------------------------
// Request / result
// ---------------------------------------------------------------------------

/// Everything needed to write one `.changes` entry.
#[derive(Debug, Clone)]
pub struct ChangeRequest {
    pub version_from: String,
    pub version_to: String,
    pub kind: ReleaseKind,
    pub release_type: ReleaseType,
    /// Used as the range end when the `v{version_to}` tag does not exist.
    pub fallback_branch: Option<String>,
    /// Patch list of the previous package; `None` disables drift detection.
    pub previous_patches: Option<Vec<String>>,
    pub current_patches: Vec<String>,
    pub committer: String,
    pub timestamp: DateTime<Utc>,
}

impl ChangeRequest {
    pub fn tag_from(&self) -> String {
        format!("v{}", self.version_from)
    }

    pub fn tag_to(&self) -> String {
        format!("v{}", self.version_to)
    }
}

/// Patches that appeared or disappeared between two package versions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchDrift {
    /// In current order.
    pub added: Vec<String>,
    /// In previous order.
    pub removed: Vec<String>,
}

impl PatchDrift {
    pub fn between(previous: &[String], current: &[String]) -> PatchDrift {
        let prev: HashSet<&str> = previous.iter().map(String::as_str).collect();
        let curr: HashSet<&str> = current.iter().map(String::as_str).collect();
        PatchDrift {
            added: current
                .iter()
                .filter(|p| !prev.contains(p.as_str()))
                .cloned()
                .collect(),
            removed: previous
                .iter()
                .filter(|p| !curr.contains(p.as_str()))
                .cloned()
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// A rendered entry, ready to be prepended to a `.changes` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
    /// Rendered text without a trailing newline.
    pub text: String,
    pub drift: PatchDrift,
}

// ---------------------------------------------------------------------------
// Commit filtering
// ---------------------------------------------------------------------------

/// `kde#<id>` for every `BUG:` line of `message`, in order.
pub fn bug_references(message: &str) -> Vec<String> {
    message
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with(BUG_PREFIX))
        .filter_map(|line| line.split(':').nth(1))
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| format!("kde#{id}"))
        .collect()
}

/// The bullet text for one commit, or `None` if it is not changelog-worthy.
pub fn commit_line(subject: &str, message: &str) -> Option<String> {
    let subject = subject.trim();
    if SILENT_MARKERS.iter().any(|m| subject.contains(m)) {
        return None;
    }
    if subject.chars().count() < MIN_SUBJECT_LEN {
        return None;
    }
    if message.lines().any(|l| l.contains(NO_CHANGELOG_MARKER)) {
        return None;
    }
    let bugs = bug_references(message);
    if bugs.is_empty() {
        Some(subject.to_string())
    } else {
        Some(format!("{subject} ({})", bugs.join(", ")))
    }
}

// ---------------------------------------------------------------------------
// Synthesizer
// ---------------------------------------------------------------------------

pub struct Synthesizer {
    engine: TemplateEngine,
}

impl Synthesizer {
    pub fn new(user_template_dir: Option<&Path>) -> Result<Self, ChangesError> {
        Ok(Synthesizer {
            engine: TemplateEngine::new(user_template_dir)?,
        })
    }

    /// Build the full entry for `request` from `history`.
    ///
    /// Any failing VCS query is returned as [`ChangesError::Vcs`], except a
    /// failed range listing when the target tag is missing and no fallback
    /// branch was given: that range is treated as empty.
    pub fn synthesize(
        &self,
        history: &dyn CommitHistory,
        request: &ChangeRequest,
    ) -> Result<ChangelogEntry, ChangesError> {
        let from = request.tag_from();
        let mut to = request.tag_to();
        let mut soft_range = false;
        if !history.tag_exists(&to)? {
            match &request.fallback_branch {
                Some(branch) => {
                    tracing::info!("Tag {} not found, using branch {}", to, branch);
                    to = branch.clone();
                }
                None => {
                    tracing::warn!("Tag {} not found and no fallback branch given", to);
                    soft_range = true;
                }
            }
        }

        let commits = match history.commits_in_range(&from, &to) {
            Ok(commits) => commits,
            Err(e) if soft_range => {
                tracing::warn!("Could not list {}..{}: {}", from, to, e);
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        let mut ctx = EntryContext::release(
            request.timestamp,
            &request.committer,
            &request.version_to,
            request.kind,
            request.release_type,
        );
        ctx.sections
            .push(commit_section(history, &commits, &request.version_from)?);

        let drift = patch_drift(request);
        if !drift.is_empty() {
            if !drift.added.is_empty() {
                ctx.sections
                    .push(SectionCtx::new("- Added patches:", drift.added.clone()));
            }
            if !drift.removed.is_empty() {
                ctx.sections
                    .push(SectionCtx::new("- Removed patches:", drift.removed.clone()));
            }
        }

        Ok(ChangelogEntry {
            text: self.engine.render_entry(&ctx)?,
            drift,
        })
    }

    /// Entry used when no upstream checkout is available.
    ///
    /// The text carries only the version line, but patch drift is still
    /// computed and announced so it is not lost.
    pub fn dummy(&self, request: &ChangeRequest) -> Result<ChangelogEntry, ChangesError> {
        let ctx = EntryContext::dummy(request.timestamp, &request.committer, &request.version_to);
        Ok(ChangelogEntry {
            text: self.engine.render_entry(&ctx)?,
            drift: patch_drift(request),
        })
    }
}

/// Drift between the request's patch lists; warns when there is any.
fn patch_drift(request: &ChangeRequest) -> PatchDrift {
    let drift = request
        .previous_patches
        .as_deref()
        .map(|previous| PatchDrift::between(previous, &request.current_patches))
        .unwrap_or_default();
    if !drift.is_empty() {
        tracing::warn!(
            "Patches changed between {} and {}: added [{}], removed [{}], this requires MANUAL REVIEW",
            request.version_from,
            request.version_to,
            drift.added.join(", "),
            drift.removed.join(", ")
        );
    }
    drift
}

fn commit_section(
    history: &dyn CommitHistory,
    commits: &[String],
    version_from: &str,
) -> Result<SectionCtx, VcsError> {
    let heading = format!("- Changes since {version_from}:");
    if commits.is_empty() {
        return Ok(SectionCtx::new(heading, vec!["None".to_string()]));
    }
    if commits.len() > MAX_LISTED_COMMITS {
        return Ok(SectionCtx::new(
            heading,
            vec!["Too many changes to list here".to_string()],
        ));
    }

    let mut lines = Vec::new();
    for commit in commits {
        let subject = history.subject(commit)?;
        if SILENT_MARKERS.iter().any(|m| subject.contains(m)) {
            tracing::debug!("Skipping silent commit {}", commit);
            continue;
        }
        let message = history.message(commit)?;
        if let Some(line) = commit_line(&subject, &message) {
            lines.push(line);
        }
    }

    if lines.is_empty() {
        return Ok(SectionCtx::new(
            format!("- No code changes since {version_from}"),
            Vec::new(),
        ));
    }
    Ok(SectionCtx::new(heading, lines))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
