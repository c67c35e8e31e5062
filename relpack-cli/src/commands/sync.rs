//! `relpack sync-from-unstable-project --unstable-dir U --version-to V <directory>`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use relpack_sync::{pipeline, BatchMode, PackageUpdater};
use relpack_vcs::OscFetcher;

use super::{print_report, GlobalArgs, ReleaseArgs, Session};

/// Copy packaging from an unstable project checkout, then update.
#[derive(Args, Debug)]
pub struct SyncFromUnstableArgs {
    /// Checkout of the unstable project to copy packages from.
    #[arg(long, value_name = "DIR")]
    pub unstable_dir: PathBuf,

    #[command(flatten)]
    pub release: ReleaseArgs,

    /// Directory containing source tarballs.
    #[arg(long, value_name = "DIR")]
    pub tarball_dir: Option<PathBuf>,

    /// Checkout of the project being brought in line.
    pub directory: PathBuf,
}

impl SyncFromUnstableArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let session = Session::open(global)?;
        let mut options = session.update_options(&self.release);
        options.tarball_dir = self.tarball_dir;

        let fetcher = OscFetcher::default();
        let mut updater = PackageUpdater::new(&session.synthesizer, &fetcher);
        if let Some(repos) = &session.repos {
            updater = updater.with_repos(repos);
        }

        let mode = BatchMode::SyncFromUnstable {
            stable_root: self.directory.clone(),
            unstable_root: self.unstable_dir.clone(),
        };
        let report = pipeline::run(&mode, &self.release.version_to, &updater, &options)
            .with_context(|| {
                format!(
                    "cannot sync {} from {}",
                    self.directory.display(),
                    self.unstable_dir.display()
                )
            })?;
        print_report(&report);
        Ok(())
    }
}
