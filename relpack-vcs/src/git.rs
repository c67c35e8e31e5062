//! System git backend.
//!
//! Every query is one `git -C <repo>` subprocess with an isolated
//! environment (only `PATH` and `HOME` are passed through).

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::error::VcsError;
use crate::history::{CommitHistory, UpstreamRepos};

/// History of the git repository at `repo_path`.
#[derive(Debug, Clone)]
pub struct GitHistory {
    repo_path: PathBuf,
}

impl GitHistory {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        GitHistory {
            repo_path: repo_path.into(),
        }
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    fn git_cmd(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.repo_path);

        cmd.env_clear();
        if let Ok(path) = std::env::var("PATH") {
            cmd.env("PATH", path);
        }
        if let Ok(home) = std::env::var("HOME") {
            cmd.env("HOME", home);
        }

        cmd.arg("-c").arg("advice.detachedHead=false");
        cmd.arg("-c").arg("core.quotePath=false");
        cmd
    }

    /// Run `git <args>` and return stdout, failing on a non-zero exit.
    fn run(&self, args: &[&str]) -> Result<String, VcsError> {
        let command = format!("git {}", args.join(" "));
        tracing::debug!("{} (in {})", command, self.repo_path.display());

        let output: Output = self
            .git_cmd()
            .args(args)
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
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl CommitHistory for GitHistory {
    fn commits_in_range(&self, from: &str, to: &str) -> Result<Vec<String>, VcsError> {
        let range = format!("{from}..{to}");
        let stdout = self.run(&["log", "--pretty=format:%H", "--no-merges", &range])?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect())
    }

    fn subject(&self, commit: &str) -> Result<String, VcsError> {
        let stdout = self.run(&["show", "-s", "--pretty=format:%s", commit])?;
        Ok(stdout.trim().to_string())
    }

    fn message(&self, commit: &str) -> Result<String, VcsError> {
        self.run(&["show", "-s", "--pretty=format:%B", commit])
    }

    fn tag_exists(&self, tag: &str) -> Result<bool, VcsError> {
        let stdout = self.run(&["tag", "--list", tag])?;
        Ok(stdout.lines().any(|line| line.trim() == tag))
    }

    fn checkout(&self, branch: &str) -> Result<(), VcsError> {
        self.run(&["checkout", branch]).map(|_| ())
    }
}

/// Upstream checkouts laid out as `<root>/<reponame>`.
#[derive(Debug, Clone)]
pub struct GitRepos {
    root: PathBuf,
}

impl GitRepos {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        GitRepos { root: root.into() }
    }
}

impl UpstreamRepos for GitRepos {
    fn open(&self, reponame: &str) -> Result<Option<Box<dyn CommitHistory>>, VcsError> {
        let path = self.root.join(reponame);
        if !path.is_dir() {
            tracing::debug!("no checkout for {} at {}", reponame, path.display());
            return Ok(None);
        }
        Ok(Some(Box::new(GitHistory::new(path))))
    }
}
