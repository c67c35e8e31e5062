//! relpack: release packaging automation for RPM package checkouts.
//!
//! # Usage
//!
//! ```text
//! relpack [-e <committer>] [-s <checkout-dir>] make-changes --version-to <v> [--version-from <v>] [-t bugfix|feature] [-k <kind>] [-b <branch>] <spec-file>
//! relpack [-e <committer>] [-s <checkout-dir>] update-packages --version-to <v> [--tarball-dir <dir>] ... <directory>
//! relpack [-e <committer>] [-s <checkout-dir>] sync-from-unstable-project --unstable-dir <dir> --version-to <v> ... <directory>
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    make_changes::MakeChangesArgs, sync::SyncFromUnstableArgs, update::UpdatePackagesArgs,
    GlobalArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "relpack",
    version,
    about = "Bump package versions, stage tarballs and write changelog entries",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write one changelog entry next to a spec file.
    MakeChanges(MakeChangesArgs),

    /// Update every package checkout in a directory to a new version.
    UpdatePackages(UpdatePackagesArgs),

    /// Copy packaging from an unstable project, then update it.
    SyncFromUnstableProject(SyncFromUnstableArgs),
}

fn init_tracing(global: &GlobalArgs) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if global.verbose {
        "debug"
    } else if global.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.global);
    match cli.command {
        Commands::MakeChanges(args) => args.run(&cli.global),
        Commands::UpdatePackages(args) => args.run(&cli.global),
        Commands::SyncFromUnstableProject(args) => args.run(&cli.global),
    }
}
