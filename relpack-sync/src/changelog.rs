//! Changelog recording: find the upstream checkout, pick the branch and
//! the fallback reference, then synthesize the entry.

use relpack_changes::{ChangeRequest, ChangelogEntry, Synthesizer};
use relpack_core::{PackageName, PackageTable};
use relpack_vcs::UpstreamRepos;

use crate::error::SyncError;

/// Where the upstream history of a package comes from.
pub struct ChangeSource<'a> {
    /// `None` when no checkout directory is configured.
    pub repos: Option<&'a dyn UpstreamRepos>,
    pub table: &'a PackageTable,
    /// Branch to check out and to fall back to when the release tag is
    /// missing (`-b/--stable-branch`).
    pub branch: Option<&'a str>,
}

/// Build the `.changes` entry for `package`.
///
/// Without an upstream checkout for `reponame` the result is a dummy entry
/// carrying only the version line. The package table's legacy branch wins
/// over `source.branch` as the fallback reference.
pub fn record_changes(
    source: &ChangeSource<'_>,
    synthesizer: &Synthesizer,
    package: &PackageName,
    reponame: &str,
    mut request: ChangeRequest,
) -> Result<ChangelogEntry, SyncError> {
    let Some(repos) = source.repos else {
        tracing::info!("No checkout directory supplied for {}", reponame);
        return Ok(synthesizer.dummy(&request)?);
    };
    let Some(history) = repos.open(reponame)? else {
        tracing::warn!("Missing checkout for {}, writing a minimal entry", reponame);
        return Ok(synthesizer.dummy(&request)?);
    };

    if let Some(branch) = source.branch.filter(|b| *b != "master") {
        history.checkout(branch)?;
    }

    request.fallback_branch = source
        .table
        .upstream_branch(package)
        .or(source.branch)
        .map(str::to_string);

    Ok(synthesizer.synthesize(history.as_ref(), &request)?)
}
