//! Domain types for relpack.
//!
//! Descriptors are transient: they are rebuilt from on-disk state on every
//! run and never cached across packages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Name of a package, taken from its checkout directory name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PackageName(pub String);

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for PackageName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PackageName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl PackageName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

const ANNOUNCEMENT_BASE_URL: &str = "https://www.kde.org/announcements/";

/// Release family; selects the announcement URL written into the changelog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseKind {
    Plasma,
    Frameworks,
    #[default]
    Applications,
    Other,
}

impl ReleaseKind {
    /// All kinds in a stable order.
    pub fn all() -> &'static [ReleaseKind] {
        &[
            ReleaseKind::Plasma,
            ReleaseKind::Frameworks,
            ReleaseKind::Applications,
            ReleaseKind::Other,
        ]
    }

    /// Announcement page for `version`, `None` for [`ReleaseKind::Other`].
    pub fn announcement_url(&self, version: &str) -> Option<String> {
        let page = match self {
            ReleaseKind::Plasma => format!("plasma-{version}.php"),
            ReleaseKind::Frameworks => format!("kde-frameworks-{version}.php"),
            ReleaseKind::Applications => format!("announce-applications-{version}.php"),
            ReleaseKind::Other => return None,
        };
        Some(format!("{ANNOUNCEMENT_BASE_URL}{page}"))
    }
}

impl fmt::Display for ReleaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseKind::Plasma => write!(f, "plasma"),
            ReleaseKind::Frameworks => write!(f, "frameworks"),
            ReleaseKind::Applications => write!(f, "applications"),
            ReleaseKind::Other => write!(f, "other"),
        }
    }
}

impl FromStr for ReleaseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plasma" => Ok(ReleaseKind::Plasma),
            "frameworks" => Ok(ReleaseKind::Frameworks),
            "applications" => Ok(ReleaseKind::Applications),
            "other" => Ok(ReleaseKind::Other),
            other => Err(format!(
                "unknown release kind '{other}'; expected: plasma, frameworks, applications, other"
            )),
        }
    }
}

/// Whether a release only fixes bugs or also ships features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    #[default]
    Bugfix,
    Feature,
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseType::Bugfix => write!(f, "bugfix"),
            ReleaseType::Feature => write!(f, "feature"),
        }
    }
}

impl FromStr for ReleaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bugfix" => Ok(ReleaseType::Bugfix),
            "feature" => Ok(ReleaseType::Feature),
            other => Err(format!(
                "unknown release type '{other}'; expected: bugfix, feature"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Package descriptor
// ---------------------------------------------------------------------------

/// Package metadata read from a spec file at the start of an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    pub name: PackageName,
    /// Current `Version:` value, macros expanded. Treated opaquely.
    pub version: String,
    /// Upstream repository name derived from the first source tarball.
    pub upstream_reponame: String,
    /// Patch file names in declaration order.
    pub patches: Vec<String>,
}

// ---------------------------------------------------------------------------
// Sync outcome
// ---------------------------------------------------------------------------

/// Result of processing one package in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Updated,
    AlreadyCurrent,
    MissingTarball,
    MissingCheckout,
    DownloadFailed,
    /// A hard failure (VCS query, I/O) inside the package update.
    Failed { reason: String },
}

/// Reporting bucket an outcome is counted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OutcomeBucket {
    Updated,
    Skipped,
    Missing,
    Failed,
}

impl SyncOutcome {
    pub fn bucket(&self) -> OutcomeBucket {
        match self {
            SyncOutcome::Updated => OutcomeBucket::Updated,
            SyncOutcome::AlreadyCurrent | SyncOutcome::MissingTarball => OutcomeBucket::Skipped,
            SyncOutcome::MissingCheckout => OutcomeBucket::Missing,
            SyncOutcome::DownloadFailed | SyncOutcome::Failed { .. } => OutcomeBucket::Failed,
        }
    }

    pub fn is_updated(&self) -> bool {
        matches!(self, SyncOutcome::Updated)
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::Updated => write!(f, "updated"),
            SyncOutcome::AlreadyCurrent => write!(f, "skipped (already current)"),
            SyncOutcome::MissingTarball => write!(f, "skipped (no tarball)"),
            SyncOutcome::MissingCheckout => write!(f, "missing"),
            SyncOutcome::DownloadFailed => write!(f, "failed (download)"),
            SyncOutcome::Failed { reason } => write!(f, "failed ({reason})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
