//! Subcommands and the arguments they share.

pub mod make_changes;
pub mod sync;
pub mod update;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;

use relpack_changes::Synthesizer;
use relpack_core::{config, OutcomeBucket, ReleaseKind, ReleaseType, Settings};
use relpack_sync::{BatchReport, UpdateOptions};
use relpack_vcs::GitRepos;

/// Flags accepted before or after any subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Email address of the committer.
    #[arg(short = 'e', long, global = true)]
    pub committer: Option<String>,

    /// Directory containing upstream git checkouts, one per repository.
    #[arg(short = 's', long, global = true, value_name = "DIR")]
    pub checkout_dir: Option<PathBuf>,

    /// Configuration file (default: ~/.config/relpack/config.yaml).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory of .tera files overriding the built-in entry template.
    #[arg(long, global = true, value_name = "DIR")]
    pub template_dir: Option<PathBuf>,

    /// Log per-file actions.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Release description shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct ReleaseArgs {
    /// Version to update to.
    #[arg(long, value_name = "VERSION")]
    pub version_to: String,

    /// Type of release: bugfix | feature.
    #[arg(short = 't', long = "type", value_name = "TYPE", default_value_t = ReleaseType::Bugfix)]
    pub release_type: ReleaseType,

    /// Release family: plasma | frameworks | applications | other.
    #[arg(short = 'k', long, default_value_t = ReleaseKind::Applications)]
    pub kind: ReleaseKind,

    /// Use history from this branch if the release tag is not available.
    #[arg(short = 'b', long = "stable-branch", value_name = "BRANCH")]
    pub stable_branch: Option<String>,
}

/// Resolved configuration plus the collaborators built from it.
pub struct Session {
    pub settings: Settings,
    pub synthesizer: Synthesizer,
    pub repos: Option<GitRepos>,
}

impl Session {
    pub fn open(global: &GlobalArgs) -> Result<Self> {
        let home = config::home()?;
        let cfg = match &global.config {
            Some(path) => config::load_from(path),
            None => config::load_at(&home),
        }
        .context("failed to load configuration")?;
        let settings = Settings::resolve(
            &cfg,
            global.committer.clone(),
            global.checkout_dir.clone(),
            &home,
        )?;
        let synthesizer = Synthesizer::new(global.template_dir.as_deref())
            .context("failed to load changelog templates")?;
        match &settings.checkout_dir {
            Some(dir) if !dir.is_dir() => {
                tracing::warn!("Checkout directory {} does not exist", dir.display())
            }
            Some(dir) => tracing::debug!("Upstream checkouts in {}", dir.display()),
            None => tracing::debug!("No checkout directory, entries will carry no commit list"),
        }
        let repos = settings.checkout_dir.clone().map(GitRepos::new);
        Ok(Session {
            settings,
            synthesizer,
            repos,
        })
    }

    pub fn update_options(&self, release: &ReleaseArgs) -> UpdateOptions {
        UpdateOptions {
            committer: self.settings.committer.clone(),
            kind: release.kind,
            release_type: release.release_type,
            upstream_branch: release.stable_branch.clone(),
            version_from: None,
            previous_patches: None,
            tarball_dir: None,
            timestamp: Utc::now(),
            table: self.settings.table.clone(),
        }
    }
}

pub fn print_report(report: &BatchReport) {
    let clean = report.count(OutcomeBucket::Failed) == 0 && report.count(OutcomeBucket::Missing) == 0;
    let mark = if clean {
        "✓".green().bold()
    } else {
        "!".yellow().bold()
    };
    println!("{mark} {report}");
}
