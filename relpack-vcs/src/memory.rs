//! In-process capability implementations.
//!
//! [`MemoryHistory`] models a single linear branch: commits are appended in
//! chronological order and tags or branches point at the newest commit at
//! the time they are created.
//!
//! ```
//! use relpack_vcs::memory::MemoryHistory;
//! use relpack_vcs::CommitHistory;
//!
//! let history = MemoryHistory::new()
//!     .tag("v1.0")
//!     .commit("a1", "Fix crash when opening empty files", "BUG: 12345")
//!     .tag("v1.1");
//! assert_eq!(history.commits_in_range("v1.0", "v1.1").unwrap(), vec!["a1"]);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::VcsError;
use crate::fetch::SourceFetcher;
use crate::history::{CommitHistory, UpstreamRepos};

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct MemoryCommit {
    id: String,
    subject: String,
    body: String,
    merge: bool,
}

/// Scripted commit history.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    commits: Vec<MemoryCommit>,
    /// Ref name → number of commits reachable from it.
    refs: HashMap<String, usize>,
    tags: Vec<String>,
    checkouts: Arc<Mutex<Vec<String>>>,
    failing: bool,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A history whose every query fails like a broken `git` would.
    pub fn failing() -> Self {
        MemoryHistory {
            failing: true,
            ..Self::default()
        }
    }

    pub fn commit(mut self, id: &str, subject: &str, body: &str) -> Self {
        self.push(id, subject, body, false);
        self
    }

    pub fn merge(mut self, id: &str, subject: &str) -> Self {
        self.push(id, subject, "", true);
        self
    }

    /// Tag the newest commit.
    pub fn tag(mut self, name: &str) -> Self {
        self.refs.insert(name.to_string(), self.commits.len());
        self.tags.push(name.to_string());
        self
    }

    /// Point branch `name` at the newest commit.
    pub fn branch(mut self, name: &str) -> Self {
        self.refs.insert(name.to_string(), self.commits.len());
        self
    }

    /// Branches passed to [`CommitHistory::checkout`], in call order.
    /// Shared between clones.
    pub fn checkouts(&self) -> Vec<String> {
        locked(&self.checkouts).clone()
    }

    fn push(&mut self, id: &str, subject: &str, body: &str, merge: bool) {
        self.commits.push(MemoryCommit {
            id: id.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            merge,
        });
    }

    fn check(&self, command: &str) -> Result<(), VcsError> {
        if self.failing {
            return Err(VcsError::CommandFailed {
                command: command.to_string(),
                stderr: "fatal: not a git repository".to_string(),
            });
        }
        Ok(())
    }

    fn resolve(&self, rev: &str) -> Result<usize, VcsError> {
        if let Some(pos) = self.refs.get(rev) {
            return Ok(*pos);
        }
        if rev == "master" || rev == "HEAD" {
            return Ok(self.commits.len());
        }
        self.commits
            .iter()
            .position(|c| c.id == rev)
            .map(|idx| idx + 1)
            .ok_or_else(|| VcsError::UnknownRevision {
                rev: rev.to_string(),
            })
    }

    fn find(&self, commit: &str) -> Result<&MemoryCommit, VcsError> {
        self.commits
            .iter()
            .find(|c| c.id == commit)
            .ok_or_else(|| VcsError::UnknownRevision {
                rev: commit.to_string(),
            })
    }
}

impl CommitHistory for MemoryHistory {
    fn commits_in_range(&self, from: &str, to: &str) -> Result<Vec<String>, VcsError> {
        self.check("git log")?;
        let start = self.resolve(from)?;
        let end = self.resolve(to)?;
        if start >= end {
            return Ok(Vec::new());
        }
        Ok(self.commits[start..end]
            .iter()
            .rev()
            .filter(|c| !c.merge)
            .map(|c| c.id.clone())
            .collect())
    }

    fn subject(&self, commit: &str) -> Result<String, VcsError> {
        self.check("git show")?;
        Ok(self.find(commit)?.subject.clone())
    }

    fn message(&self, commit: &str) -> Result<String, VcsError> {
        self.check("git show")?;
        let c = self.find(commit)?;
        if c.body.is_empty() {
            Ok(c.subject.clone())
        } else {
            Ok(format!("{}\n\n{}", c.subject, c.body))
        }
    }

    fn tag_exists(&self, tag: &str) -> Result<bool, VcsError> {
        self.check("git tag")?;
        Ok(self.tags.iter().any(|t| t == tag))
    }

    fn checkout(&self, branch: &str) -> Result<(), VcsError> {
        self.check("git checkout")?;
        if branch != "master" && !self.refs.contains_key(branch) {
            return Err(VcsError::UnknownRevision {
                rev: branch.to_string(),
            });
        }
        locked(&self.checkouts).push(branch.to_string());
        Ok(())
    }
}

/// Upstream checkouts keyed by reponame.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepos {
    repos: HashMap<String, MemoryHistory>,
}

impl MemoryRepos {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, reponame: &str, history: MemoryHistory) -> Self {
        self.repos.insert(reponame.to_string(), history);
        self
    }
}

impl UpstreamRepos for MemoryRepos {
    fn open(&self, reponame: &str) -> Result<Option<Box<dyn CommitHistory>>, VcsError> {
        Ok(self
            .repos
            .get(reponame)
            .cloned()
            .map(|h| Box::new(h) as Box<dyn CommitHistory>))
    }
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// Records fetch requests; optionally drops a file into the package dir.
#[derive(Debug, Clone, Default)]
pub struct RecordingFetcher {
    fail: bool,
    provides: Option<String>,
    calls: Arc<Mutex<Vec<PathBuf>>>,
}

impl RecordingFetcher {
    /// Succeeds without touching the filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        RecordingFetcher {
            fail: true,
            ..Self::default()
        }
    }

    /// Succeeds and creates an empty `file_name` in the package dir.
    pub fn providing(file_name: &str) -> Self {
        RecordingFetcher {
            provides: Some(file_name.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        locked(&self.calls).clone()
    }
}

impl SourceFetcher for RecordingFetcher {
    fn fetch(&self, package_dir: &Path) -> Result<(), VcsError> {
        locked(&self.calls).push(package_dir.to_path_buf());
        if self.fail {
            return Err(VcsError::CommandFailed {
                command: "osc service localrun download_files".to_string(),
                stderr: "download failed".to_string(),
            });
        }
        if let Some(name) = &self.provides {
            std::fs::write(package_dir.join(name), b"").map_err(|source| VcsError::Spawn {
                command: format!("create {name}"),
                source,
            })?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
