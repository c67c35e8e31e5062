//! `relpack update-packages --version-to V [--tarball-dir D] <directory>`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use relpack_sync::{pipeline, BatchMode, PackageUpdater};
use relpack_vcs::OscFetcher;

use super::{print_report, GlobalArgs, ReleaseArgs, Session};

/// Update every package checkout in a directory.
#[derive(Args, Debug)]
pub struct UpdatePackagesArgs {
    /// Version to update from, instead of each spec's Version.
    #[arg(long, value_name = "VERSION")]
    pub version_from: Option<String>,

    #[command(flatten)]
    pub release: ReleaseArgs,

    /// Directory containing source tarballs. Without it sources are
    /// downloaded with `osc service localrun download_files`.
    #[arg(long, value_name = "DIR")]
    pub tarball_dir: Option<PathBuf>,

    /// Directory with the build service checkout.
    pub directory: PathBuf,
}

impl UpdatePackagesArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let session = Session::open(global)?;
        let mut options = session.update_options(&self.release);
        options.version_from = self.version_from;
        options.tarball_dir = self.tarball_dir;

        let fetcher = OscFetcher::default();
        let mut updater = PackageUpdater::new(&session.synthesizer, &fetcher);
        if let Some(repos) = &session.repos {
            updater = updater.with_repos(repos);
        }

        let mode = BatchMode::Update {
            root: self.directory.clone(),
        };
        let report = pipeline::run(&mode, &self.release.version_to, &updater, &options)
            .with_context(|| format!("cannot process {}", self.directory.display()))?;
        print_report(&report);
        Ok(())
    }
}
