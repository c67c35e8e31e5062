//! User configuration and the per-package override table.
//!
//! # Storage layout
//!
//! ```text
//! ~/.config/relpack/config.yaml
//! ```
//!
//! Every field is optional:
//!
//! ```yaml
//! committer: packager@example.org
//! checkout_dir: ~/src/kde
//! packages:
//!   kdelibs4:
//!     tarball_pattern: "{name}-4.14.*.tar.xz"
//!     upstream_branch: KDE/4.14
//! reponame_folds:
//!   - marker: l10n
//!     canonical: kde-l10n
//! ```
//!
//! # API pattern
//!
//! `load_at(home)` takes an explicit home directory (used in tests with
//! `TempDir`); `load()` derives it from `dirs::home_dir()`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{config_io_err, ConfigError};
use crate::types::PackageName;

const DEFAULT_TARBALL_PATTERN: &str = "{name}-{version}.tar.xz";

// ---------------------------------------------------------------------------
// Package overrides
// ---------------------------------------------------------------------------

/// Per-package exceptions to the default naming rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageOverride {
    /// Tarball glob template; `{name}` is the upstream reponame and
    /// `{version}` the target version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tarball_pattern: Option<String>,
    /// Upstream branch used when the release tag does not exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_branch: Option<String>,
}

/// Reponames containing `marker` are folded into `canonical`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReponameFold {
    pub marker: String,
    pub canonical: String,
}

/// Immutable lookup table of package-identity exceptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageTable {
    packages: BTreeMap<String, PackageOverride>,
    folds: Vec<ReponameFold>,
}

impl Default for PackageTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PackageTable {
    /// An empty table: no exceptions at all.
    pub fn empty() -> Self {
        PackageTable {
            packages: BTreeMap::new(),
            folds: Vec::new(),
        }
    }

    /// The legacy exceptions known to the KDE packaging workflow.
    pub fn builtin() -> Self {
        let mut packages = BTreeMap::new();
        packages.insert(
            "kdelibs4".to_string(),
            PackageOverride {
                tarball_pattern: Some("{name}-4.14.*.tar.xz".to_string()),
                upstream_branch: Some("KDE/4.14".to_string()),
            },
        );
        packages.insert(
            "kde-l10n".to_string(),
            PackageOverride {
                tarball_pattern: Some("{name}-*{version}.tar.xz".to_string()),
                upstream_branch: None,
            },
        );
        PackageTable {
            packages,
            folds: vec![ReponameFold {
                marker: "l10n".to_string(),
                canonical: "kde-l10n".to_string(),
            }],
        }
    }

    /// Layer user entries over this table. Fields set by the user win;
    /// folds are appended after the existing ones.
    pub fn merged(
        mut self,
        packages: &BTreeMap<String, PackageOverride>,
        folds: &[ReponameFold],
    ) -> Self {
        for (name, user) in packages {
            let entry = self.packages.entry(name.clone()).or_default();
            if user.tarball_pattern.is_some() {
                entry.tarball_pattern = user.tarball_pattern.clone();
            }
            if user.upstream_branch.is_some() {
                entry.upstream_branch = user.upstream_branch.clone();
            }
        }
        for fold in folds {
            if !self.folds.contains(fold) {
                self.folds.push(fold.clone());
            }
        }
        self
    }

    pub fn get(&self, package: &PackageName) -> Option<&PackageOverride> {
        self.packages.get(package.as_str())
    }

    /// Glob matching the tarball(s) of `package` at `version`.
    pub fn tarball_pattern(&self, package: &PackageName, reponame: &str, version: &str) -> String {
        let template = self
            .get(package)
            .and_then(|o| o.tarball_pattern.as_deref())
            .unwrap_or(DEFAULT_TARBALL_PATTERN);
        template
            .replace("{name}", reponame)
            .replace("{version}", version)
    }

    /// Legacy branch registered for `package`, if any.
    pub fn upstream_branch(&self, package: &PackageName) -> Option<&str> {
        self.get(package).and_then(|o| o.upstream_branch.as_deref())
    }

    /// Apply the first matching fold, or return `reponame` unchanged.
    pub fn fold_reponame(&self, reponame: &str) -> String {
        self.folds
            .iter()
            .find(|fold| reponame.contains(&fold.marker))
            .map(|fold| fold.canonical.clone())
            .unwrap_or_else(|| reponame.to_string())
    }
}

// ---------------------------------------------------------------------------
// Config file
// ---------------------------------------------------------------------------

/// On-disk configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committer: Option<String>,
    /// Directory holding upstream git checkouts, one per reponame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_dir: Option<PathBuf>,
    #[serde(default)]
    pub packages: BTreeMap<String, PackageOverride>,
    #[serde(default)]
    pub reponame_folds: Vec<ReponameFold>,
}

impl Config {
    /// Built-in table with this file's entries layered on top.
    pub fn package_table(&self) -> PackageTable {
        PackageTable::builtin().merged(&self.packages, &self.reponame_folds)
    }
}

/// `<home>/.config/relpack/config.yaml`. Pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".config").join("relpack").join("config.yaml")
}

/// Load the config file at `path`. A missing file yields the default config.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| config_io_err(path, e))?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load `<home>/.config/relpack/config.yaml`.
pub fn load_at(home: &Path) -> Result<Config, ConfigError> {
    load_from(&config_path_at(home))
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Config, ConfigError> {
    load_at(&home()?)
}

/// Expand a leading `~` against `home`.
pub fn expand_home(path: &Path, home: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}

pub fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Resolved settings
// ---------------------------------------------------------------------------

/// Configuration after merging the command line over the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub committer: String,
    pub checkout_dir: Option<PathBuf>,
    pub table: PackageTable,
}

impl Settings {
    /// Command-line values win over `config`. Fails with
    /// [`ConfigError::MissingCommitter`] when no committer is known.
    pub fn resolve(
        config: &Config,
        committer: Option<String>,
        checkout_dir: Option<PathBuf>,
        home: &Path,
    ) -> Result<Settings, ConfigError> {
        let committer = committer
            .or_else(|| config.committer.clone())
            .filter(|c| !c.trim().is_empty())
            .ok_or(ConfigError::MissingCommitter)?;
        let checkout_dir = checkout_dir
            .or_else(|| config.checkout_dir.clone())
            .map(|dir| expand_home(&dir, home));
        Ok(Settings {
            committer,
            checkout_dir,
            table: config.package_table(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pattern_uses_reponame_and_version() {
        let table = PackageTable::builtin();
        assert_eq!(
            table.tarball_pattern(&PackageName::from("kate"), "kate", "16.12.3"),
            "kate-16.12.3.tar.xz"
        );
    }

    #[test]
    fn kdelibs4_pins_the_minor_series() {
        let table = PackageTable::builtin();
        let pkg = PackageName::from("kdelibs4");
        assert_eq!(
            table.tarball_pattern(&pkg, "kdelibs", "16.12.3"),
            "kdelibs-4.14.*.tar.xz"
        );
        assert_eq!(table.upstream_branch(&pkg), Some("KDE/4.14"));
    }

    #[test]
    fn fold_applies_to_localization_reponames() {
        let table = PackageTable::builtin();
        assert_eq!(table.fold_reponame("kde-l10n-de"), "kde-l10n");
        assert_eq!(table.fold_reponame("okular"), "okular");
        assert_eq!(PackageTable::empty().fold_reponame("kde-l10n-de"), "kde-l10n-de");
    }

    #[test]
    fn user_entries_override_builtin_fields() {
        let mut packages = BTreeMap::new();
        packages.insert(
            "kdelibs4".to_string(),
            PackageOverride {
                tarball_pattern: None,
                upstream_branch: Some("KDE/4.15".to_string()),
            },
        );
        let table = PackageTable::builtin().merged(&packages, &[]);
        let pkg = PackageName::from("kdelibs4");
        assert_eq!(table.upstream_branch(&pkg), Some("KDE/4.15"));
        assert_eq!(
            table.tarball_pattern(&pkg, "kdelibs", "x"),
            "kdelibs-4.14.*.tar.xz",
            "unset user fields keep the builtin value"
        );
    }

    #[test]
    fn expand_home_only_touches_tilde_prefix() {
        let home = Path::new("/home/packager");
        assert_eq!(
            expand_home(Path::new("~/src/kde"), home),
            PathBuf::from("/home/packager/src/kde")
        );
        assert_eq!(expand_home(Path::new("/srv/kde"), home), PathBuf::from("/srv/kde"));
    }

    #[test]
    fn resolve_prefers_command_line() {
        let config = Config {
            committer: Some("file@example.org".to_string()),
            checkout_dir: Some(PathBuf::from("~/src")),
            ..Config::default()
        };
        let home = Path::new("/home/p");
        let settings = Settings::resolve(&config, Some("cli@example.org".to_string()), None, home)
            .expect("resolve");
        assert_eq!(settings.committer, "cli@example.org");
        assert_eq!(settings.checkout_dir, Some(PathBuf::from("/home/p/src")));
    }

    #[test]
    fn resolve_without_committer_fails() {
        let err = Settings::resolve(&Config::default(), None, None, Path::new("/h")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCommitter));
    }
}
