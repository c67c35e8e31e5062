//! Build-service source download.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::VcsError;

/// Downloads the sources a package's spec declares into its checkout.
pub trait SourceFetcher {
    fn fetch(&self, package_dir: &Path) -> Result<(), VcsError>;
}

/// Runs `osc service localrun download_files` inside the package checkout.
#[derive(Debug, Clone)]
pub struct OscFetcher {
    program: PathBuf,
}

impl Default for OscFetcher {
    fn default() -> Self {
        OscFetcher {
            program: PathBuf::from("osc"),
        }
    }
}

impl OscFetcher {
    /// Use `program` instead of the `osc` found on `PATH`.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        OscFetcher {
            program: program.into(),
        }
    }
}

impl SourceFetcher for OscFetcher {
    fn fetch(&self, package_dir: &Path) -> Result<(), VcsError> {
        let args = ["service", "localrun", "download_files"];
        let command = format!("{} {}", self.program.display(), args.join(" "));
        tracing::info!("Downloading sources in {}", package_dir.display());

        let output = Command::new(&self.program)
            .args(args)
            .current_dir(package_dir)
            .output()
            .map_err(|source| VcsError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(VcsError::CommandFailed {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
