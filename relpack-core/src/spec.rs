//! RPM spec file access.
//!
//! Only the handful of fields relpack needs are understood: `Name:`,
//! `Version:`, `Source*:`, `Patch*:` and `%define` / `%global` macros.
//! Everything after `%changelog` is ignored.
//!
//! [`write_version`] rewrites `Version:` lines only; every other byte of the
//! file is preserved. The rewrite goes through a `.relpack.tmp` sibling and
//! a rename, so a failed write never leaves a truncated spec behind.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::Url;

use crate::config::PackageTable;
use crate::error::{spec_io_err, SpecError};
use crate::types::{PackageDescriptor, PackageName};

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(name|version|source\d*|patch\d*)\s*:\s*(.*?)\s*$").expect("tag regex")
});
static DEFINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^%(?:define|global)\s+([A-Za-z_][A-Za-z0-9_]*)\s+(.*?)\s*$")
        .expect("define regex")
});
static MACRO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%\{(\?)?([A-Za-z_][A-Za-z0-9_]*)\}|%([A-Za-z_][A-Za-z0-9_]*)")
        .expect("macro regex")
});
static VERSION_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(version\s*:\s*).*$").expect("version line regex"));
static VERSION_TAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-%(?:\{version\}|version)[A-Za-z0-9]*\.tar\.xz$").expect("version tail regex")
});

const MAX_EXPANSION_PASSES: usize = 8;

// ---------------------------------------------------------------------------
// Parsed spec
// ---------------------------------------------------------------------------

/// The subset of a spec file relpack reads. Values are stored unexpanded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecFile {
    pub name: String,
    pub version: String,
    pub sources: Vec<String>,
    pub patches: Vec<String>,
    pub macros: HashMap<String, String>,
}

impl SpecFile {
    /// Parse spec `contents`; `path` is only used for error messages.
    pub fn parse(path: &Path, contents: &str) -> Result<SpecFile, SpecError> {
        let mut name = None;
        let mut version = None;
        let mut sources = Vec::new();
        let mut patches = Vec::new();
        let mut macros = HashMap::new();

        for line in contents.lines() {
            let line = line.trim_end();
            if line.starts_with("%changelog") {
                break;
            }
            if line.starts_with('#') {
                continue;
            }
            if let Some(caps) = DEFINE_RE.captures(line) {
                macros.insert(caps[1].to_string(), caps[2].to_string());
                continue;
            }
            let Some(caps) = TAG_RE.captures(line) else {
                continue;
            };
            let tag = caps[1].to_ascii_lowercase();
            let value = caps[2].to_string();
            if value.is_empty() {
                return Err(parse_err(path, format!("empty {} field", &caps[1])));
            }
            match tag.as_str() {
                "name" => {
                    name.get_or_insert(value);
                }
                "version" => {
                    version.get_or_insert(value);
                }
                t if t.starts_with("source") => sources.push(value),
                _ => patches.push(value),
            }
        }

        let name = name.ok_or_else(|| parse_err(path, "missing Name: field"))?;
        let version = version.ok_or_else(|| parse_err(path, "missing Version: field"))?;
        Ok(SpecFile {
            name,
            version,
            sources,
            patches,
            macros,
        })
    }

    /// Expand `%{macro}`, `%{?macro}` and `%macro` references.
    ///
    /// Unknown macros are left in place, unknown conditional ones vanish.
    pub fn expand(&self, value: &str) -> String {
        let mut current = value.to_string();
        for _ in 0..MAX_EXPANSION_PASSES {
            let next = MACRO_RE
                .replace_all(&current, |caps: &Captures| {
                    let (conditional, key) = match (caps.get(2), caps.get(3)) {
                        (Some(key), _) => (caps.get(1).is_some(), key.as_str()),
                        (None, Some(key)) => (false, key.as_str()),
                        (None, None) => return caps[0].to_string(),
                    };
                    match self.lookup(key) {
                        Some(v) => v.to_string(),
                        None if conditional => String::new(),
                        None => caps[0].to_string(),
                    }
                })
                .into_owned();
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    fn lookup(&self, key: &str) -> Option<&str> {
        match key {
            "name" => Some(self.name.as_str()),
            "version" => Some(self.version.as_str()),
            _ => self.macros.get(key).map(String::as_str),
        }
    }

    /// Upstream repository name derived from the first declared source.
    pub fn upstream_reponame(&self, table: &PackageTable) -> Option<String> {
        let source = self.sources.first()?;

        // Take the last path segment of URL sources. The raw string is split
        // because the URL parser percent-encodes macro braces.
        let mut reponame = if Url::parse(source).is_ok() {
            source
                .split(['?', '#'])
                .next()
                .and_then(|s| s.rsplit('/').next())
                .unwrap_or(source.as_str())
                .to_string()
        } else {
            source.clone()
        };

        reponame = VERSION_TAIL_RE.replace(&reponame, "").into_owned();
        reponame = self.expand(&reponame);

        let version = self.expand(&self.version);
        let literal_tail = format!(r"-{}[A-Za-z0-9]*\.tar\.xz$", regex::escape(&version));
        if let Ok(re) = Regex::new(&literal_tail) {
            reponame = re.replace(&reponame, "").into_owned();
        }

        Some(table.fold_reponame(&reponame))
    }
}

fn parse_err(path: &Path, message: impl Into<String>) -> SpecError {
    SpecError::Parse {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

/// `<package_dir>/<package_dir name>.spec`. Pure, no I/O.
pub fn spec_path(package_dir: &Path) -> PathBuf {
    let name = package_name(package_dir);
    package_dir.join(format!("{}.spec", name.0))
}

/// Package name of a checkout directory.
pub fn package_name(package_dir: &Path) -> PackageName {
    PackageName::from(
        package_dir
            .file_name()
            .unwrap_or(package_dir.as_os_str())
            .to_string_lossy()
            .into_owned(),
    )
}

/// Read the descriptor using the built-in [`PackageTable`].
pub fn read(path: &Path) -> Result<PackageDescriptor, SpecError> {
    read_with(path, &PackageTable::builtin())
}

/// Read the descriptor of the spec file at `path`.
///
/// The package name is the file stem (`kate.spec` → `kate`). Fails with
/// [`SpecError::Parse`] if the file lacks `Name:`, `Version:` or a source.
pub fn read_with(path: &Path, table: &PackageTable) -> Result<PackageDescriptor, SpecError> {
    let contents = std::fs::read_to_string(path).map_err(|e| spec_io_err(path, e))?;
    let spec = SpecFile::parse(path, &contents)?;
    let upstream_reponame = spec
        .upstream_reponame(table)
        .ok_or_else(|| parse_err(path, "no Source field declared"))?;

    let name = PackageName::from(
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| spec.expand(&spec.name)),
    );

    Ok(PackageDescriptor {
        name,
        version: spec.expand(&spec.version),
        upstream_reponame,
        patches: spec.patches.iter().map(|p| spec.expand(p)).collect(),
    })
}

// ---------------------------------------------------------------------------
// Write
// ---------------------------------------------------------------------------

/// A spec file with its `Version:` lines rewritten in memory.
///
/// Built by [`prepare_version`]; nothing touches the disk until
/// [`VersionRewrite::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRewrite {
    path: PathBuf,
    contents: String,
}

impl VersionRewrite {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Replace the spec file through a `.relpack.tmp` sibling, keeping the
    /// original file's permissions.
    pub fn commit(self) -> Result<(), SpecError> {
        let path = self.path.as_path();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = path.with_file_name(format!("{file_name}.relpack.tmp"));
        std::fs::write(&tmp, &self.contents).map_err(|e| spec_io_err(&tmp, e))?;
        let result = std::fs::metadata(path)
            .and_then(|meta| std::fs::set_permissions(&tmp, meta.permissions()))
            .and_then(|()| std::fs::rename(&tmp, path));
        if let Err(e) = result {
            let _ = std::fs::remove_file(&tmp);
            return Err(spec_io_err(path, e));
        }
        Ok(())
    }
}

/// Compute the spec at `path` with every `Version:` value set to
/// `new_version`. The tag is matched case-insensitively, with or without
/// spaces around the colon, like [`SpecFile::parse`] does.
///
/// Fails with [`SpecError::MissingVersion`] if no line matches. Line
/// endings and all other lines are preserved byte for byte.
pub fn prepare_version(path: &Path, new_version: &str) -> Result<VersionRewrite, SpecError> {
    let contents = std::fs::read_to_string(path).map_err(|e| spec_io_err(path, e))?;

    let mut rewritten = String::with_capacity(contents.len() + new_version.len());
    let mut changed = 0usize;
    for line in contents.split_inclusive('\n') {
        let (body, ending) = split_line_ending(line);
        match VERSION_LINE_RE.captures(body) {
            Some(caps) => {
                rewritten.push_str(&caps[1]);
                rewritten.push_str(new_version);
                rewritten.push_str(ending);
                changed += 1;
            }
            None => rewritten.push_str(line),
        }
    }

    if changed == 0 {
        return Err(SpecError::MissingVersion {
            path: path.to_path_buf(),
        });
    }
    Ok(VersionRewrite {
        path: path.to_path_buf(),
        contents: rewritten,
    })
}

/// Rewrite the value of every `Version:` line to `new_version`.
pub fn write_version(path: &Path, new_version: &str) -> Result<(), SpecError> {
    prepare_version(path, new_version)?.commit()
}

fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
