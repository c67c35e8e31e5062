//! Spec descriptor read / version rewrite integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use relpack_core::{
    spec::{self, SpecFile},
    PackageTable, SpecError,
};
use rstest::rstest;
use tempfile::TempDir;

const KATE_SPEC: &str = "\
#
# spec file for package kate
#
%define _tar_path 16.12
Name:           kate
Version:        16.12.2
Release:        0
Summary:        Advanced Text Editor
License:        GPL-2.0+
Url:            http://www.kde.org
Source0:        %{name}-%{version}.tar.xz
Patch0:         fix-crash-on-close.patch
Patch1:        0001-Use-system-ctags.patch   
BuildRequires:  extra-cmake-modules

%description
Kate is a multi-document editor.

%changelog
";

fn write_spec(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(format!("{name}.spec"));
    fs::write(&path, contents).expect("write spec");
    path
}

// ---------------------------------------------------------------------------
// 1. Read
// ---------------------------------------------------------------------------

#[test]
fn read_returns_version_patches_and_reponame() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_spec(&dir, "kate", KATE_SPEC);

    let desc = spec::read(&path).expect("read");
    assert_eq!(desc.name.as_str(), "kate");
    assert_eq!(desc.version, "16.12.2");
    assert_eq!(desc.upstream_reponame, "kate");
    assert_eq!(
        desc.patches,
        vec!["fix-crash-on-close.patch", "0001-Use-system-ctags.patch"]
    );
}

#[rstest]
#[case("Source0: %{name}-%{version}.tar.xz", "kio")]
#[case("Source: %name-%version.tar.xz", "kio")]
#[case("Source0: %{name}-%{version}a.tar.xz", "kio")]
#[case("Source0: kio-extras-%{version}.tar.xz", "kio-extras")]
#[case("Source0: kio-5.31.0.tar.xz", "kio")]
#[case(
    "Source0: http://download.kde.org/stable/frameworks/%{_tar_path}/%{name}-%{version}.tar.xz",
    "kio"
)]
#[case("Source0: https://download.kde.org/stable/kio-5.31.0.tar.xz", "kio")]
fn reponame_resolution(#[case] source_line: &str, #[case] expected: &str) {
    let contents = format!(
        "%define _tar_path 5.31\nName: kio\nVersion: 5.31.0\n{source_line}\nSource1: baselibs.conf\n"
    );
    let spec = SpecFile::parse(Path::new("kio.spec"), &contents).expect("parse");
    assert_eq!(
        spec.upstream_reponame(&PackageTable::builtin()).as_deref(),
        Some(expected)
    );
}

#[test]
fn localization_reponames_fold_to_canonical_name() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_spec(
        &dir,
        "kde-l10n",
        "Name: kde-l10n\nVersion: 16.12.2\nSource0: kde-l10n-ca-%{version}.tar.xz\n",
    );
    let desc = spec::read(&path).expect("read");
    assert_eq!(desc.upstream_reponame, "kde-l10n");

    let unfolded = spec::read_with(&path, &PackageTable::empty()).expect("read");
    assert_eq!(unfolded.upstream_reponame, "kde-l10n-ca");
}

#[rstest]
#[case("", "missing Name")]
#[case("Name: a\nSource: a.tar.xz\n", "missing Version")]
#[case("Version: 1\nSource: a.tar.xz\n", "missing Name")]
#[case("Name: a\nVersion: 1\n", "no Source")]
#[case("Name: a\nVersion:\nSource: a.tar.xz\n", "empty Version")]
fn malformed_spec_is_a_parse_error(#[case] contents: &str, #[case] needle: &str) {
    let dir = TempDir::new().expect("tempdir");
    let path = write_spec(&dir, "broken", contents);

    let err = spec::read(&path).unwrap_err();
    assert!(matches!(err, SpecError::Parse { .. }), "got: {err}");
    let msg = err.to_string();
    assert!(msg.contains(needle), "expected '{needle}' in: {msg}");
    assert!(msg.contains("broken.spec"), "must name the file, got: {msg}");
}

#[test]
fn read_missing_file_is_io_error() {
    let dir = TempDir::new().expect("tempdir");
    let err = spec::read(&dir.path().join("nope.spec")).unwrap_err();
    assert!(matches!(err, SpecError::Io { .. }), "got: {err}");
}

#[test]
fn spec_path_follows_directory_name() {
    assert_eq!(
        spec::spec_path(Path::new("/obs/KDE:Applications/okular")),
        PathBuf::from("/obs/KDE:Applications/okular/okular.spec")
    );
}

// ---------------------------------------------------------------------------
// 2. Version rewrite
// ---------------------------------------------------------------------------

#[test]
fn write_version_round_trips_and_preserves_other_lines() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_spec(&dir, "kate", KATE_SPEC);

    spec::write_version(&path, "16.12.3").expect("write_version");

    let desc = spec::read(&path).expect("read back");
    assert_eq!(desc.version, "16.12.3");

    let after = fs::read_to_string(&path).expect("read after");
    let before_lines: Vec<&str> = KATE_SPEC.split_inclusive('\n').collect();
    let after_lines: Vec<&str> = after.split_inclusive('\n').collect();
    assert_eq!(before_lines.len(), after_lines.len());

    let changed: Vec<usize> = before_lines
        .iter()
        .zip(&after_lines)
        .enumerate()
        .filter(|(_, (b, a))| b != a)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(changed.len(), 1, "exactly one line may change");
    assert_eq!(after_lines[changed[0]], "Version:        16.12.3\n");
}

#[test]
fn write_version_keeps_crlf_and_trailing_whitespace() {
    let dir = TempDir::new().expect("tempdir");
    let contents = "Name: a  \r\nVersion: 1.0\r\nSource: a-%{version}.tar.xz\t\r\n";
    let path = write_spec(&dir, "a", contents);

    spec::write_version(&path, "2.0").expect("write_version");

    let after = fs::read_to_string(&path).expect("read");
    assert_eq!(
        after,
        "Name: a  \r\nVersion: 2.0\r\nSource: a-%{version}.tar.xz\t\r\n"
    );
}

#[test]
fn write_version_without_version_field_fails_and_leaves_file() {
    let dir = TempDir::new().expect("tempdir");
    let contents = "Name: a\nSource: a.tar.xz\n";
    let path = write_spec(&dir, "a", contents);

    let err = spec::write_version(&path, "2.0").unwrap_err();
    assert!(matches!(err, SpecError::MissingVersion { .. }), "got: {err}");
    assert_eq!(fs::read_to_string(&path).expect("read"), contents);
}

#[test]
fn write_version_cleans_up_tmp_file() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_spec(&dir, "kate", KATE_SPEC);
    spec::write_version(&path, "17.04.0").expect("write_version");
    assert!(!dir.path().join("kate.spec.relpack.tmp").exists());
}

#[test]
fn indented_version_is_not_rewritten() {
    let dir = TempDir::new().expect("tempdir");
    let contents = "Name: a\nVersion: 1\nSource: a.tar.xz\n%description\n  Version: is mentioned here\n";
    let path = write_spec(&dir, "a", contents);
    spec::write_version(&path, "2").expect("write_version");
    let after = fs::read_to_string(&path).expect("read");
    assert!(after.contains("  Version: is mentioned here\n"));
    assert!(after.contains("\nVersion: 2\n"));
}

#[rstest]
#[case("Version:16.12.2\n", "Version:16.12.3\n")]
#[case("version: 16.12.2\n", "version: 16.12.3\n")]
#[case("VERSION :\t16.12.2\n", "VERSION :\t16.12.3\n")]
fn any_version_tag_the_reader_accepts_is_rewritten(#[case] line: &str, #[case] expected: &str) {
    let dir = TempDir::new().expect("tempdir");
    let contents = format!("Name: kate\n{line}Source: kate-%{{version}}.tar.xz\n");
    let path = write_spec(&dir, "kate", &contents);
    assert_eq!(spec::read(&path).expect("read").version, "16.12.2");

    spec::write_version(&path, "16.12.3").expect("write_version");

    let after = fs::read_to_string(&path).expect("read after");
    assert_eq!(after, format!("Name: kate\n{expected}Source: kate-%{{version}}.tar.xz\n"));
    assert_eq!(spec::read(&path).expect("read back").version, "16.12.3");
}

#[test]
fn prepare_version_leaves_disk_untouched_until_commit() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_spec(&dir, "kate", KATE_SPEC);

    let rewrite = spec::prepare_version(&path, "16.12.3").expect("prepare");
    assert_eq!(fs::read_to_string(&path).expect("read"), KATE_SPEC);
    assert!(rewrite.contents().contains("Version:        16.12.3\n"));
    assert_eq!(rewrite.path(), path.as_path());

    rewrite.commit().expect("commit");
    assert_eq!(spec::read(&path).expect("read back").version, "16.12.3");
}

#[test]
#[cfg(unix)]
fn write_version_keeps_file_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().expect("tempdir");
    let path = write_spec(&dir, "kate", KATE_SPEC);
    fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).expect("chmod");

    spec::write_version(&path, "16.12.3").expect("write_version");

    let mode = fs::metadata(&path).expect("metadata").permissions().mode() & 0o777;
    assert_eq!(mode, 0o640);
}
