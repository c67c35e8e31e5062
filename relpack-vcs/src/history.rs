//! Capability traits over upstream commit history.

use crate::error::VcsError;

/// Read access to the history of one upstream repository.
pub trait CommitHistory {
    /// Non-merge commits in `(from, to]`, newest first.
    fn commits_in_range(&self, from: &str, to: &str) -> Result<Vec<String>, VcsError>;

    /// One-line subject of `commit`.
    fn subject(&self, commit: &str) -> Result<String, VcsError>;

    /// Full message (subject and body) of `commit`.
    fn message(&self, commit: &str) -> Result<String, VcsError>;

    fn tag_exists(&self, tag: &str) -> Result<bool, VcsError>;

    /// Switch the working tree to `branch`.
    fn checkout(&self, branch: &str) -> Result<(), VcsError>;
}

/// Lookup of upstream checkouts by repository name.
pub trait UpstreamRepos {
    /// `Ok(None)` when no checkout exists for `reponame`.
    fn open(&self, reponame: &str) -> Result<Option<Box<dyn CommitHistory>>, VcsError>;
}
