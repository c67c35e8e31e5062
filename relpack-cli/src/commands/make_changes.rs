//! `relpack make-changes [--version-from V] --version-to V <spec-file>`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use relpack_changes::ChangeRequest;
use relpack_core::spec;
use relpack_sync::{record_changes, writer, ChangeSource};
use relpack_vcs::UpstreamRepos;

use super::{GlobalArgs, ReleaseArgs, Session};

/// Write one changelog entry into the `.changes` file next to a spec.
#[derive(Args, Debug)]
pub struct MakeChangesArgs {
    /// Version to describe changes from (default: the spec's Version).
    #[arg(long, value_name = "VERSION")]
    pub version_from: Option<String>,

    #[command(flatten)]
    pub release: ReleaseArgs,

    /// Spec file of the package; the entry goes to the same path with a
    /// `.changes` extension.
    pub spec_file: PathBuf,
}

impl MakeChangesArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let session = Session::open(global)?;
        let options = session.update_options(&self.release);
        let package = spec::read_with(&self.spec_file, &options.table)
            .with_context(|| format!("cannot read {}", self.spec_file.display()))?;

        let request = ChangeRequest {
            version_from: self.version_from.unwrap_or_else(|| package.version.clone()),
            version_to: self.release.version_to.clone(),
            kind: options.kind,
            release_type: options.release_type,
            fallback_branch: None,
            previous_patches: None,
            current_patches: package.patches.clone(),
            committer: options.committer.clone(),
            timestamp: options.timestamp,
        };
        let source = ChangeSource {
            repos: session.repos.as_ref().map(|r| r as &dyn UpstreamRepos),
            table: &options.table,
            branch: options.upstream_branch.as_deref(),
        };
        let entry = record_changes(
            &source,
            &session.synthesizer,
            &package.name,
            &package.upstream_reponame,
            request,
        )
        .with_context(|| format!("failed to record changes for {}", package.name))?;

        let changes = self.spec_file.with_extension("changes");
        writer::prepend_entry(&changes, &entry.text)
            .with_context(|| format!("failed to write {}", changes.display()))?;

        println!("✓ Wrote {} entry to {}", self.release.version_to, changes.display());
        Ok(())
    }
}
