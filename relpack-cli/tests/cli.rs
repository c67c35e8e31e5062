use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn relpack_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("relpack"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env_remove("RUST_LOG");
    cmd
}

fn write_package(root: &Path, name: &str, version: &str) {
    let dir = root.join(name);
    fs::create_dir_all(&dir).expect("create package dir");
    fs::write(
        dir.join(format!("{name}.spec")),
        format!("Name:           {name}\nVersion:        {version}\nRelease:        0\nSource:         {name}-%{{version}}.tar.xz\n"),
    )
    .expect("write spec");
}

fn write_tarball(dir: &Path, name: &str, version: &str) {
    fs::create_dir_all(dir).expect("create tarball dir");
    fs::write(dir.join(format!("{name}-{version}.tar.xz")), b"tarball").expect("write tarball");
}

#[test]
fn missing_committer_is_rejected() {
    let home = TempDir::new().unwrap();
    let obs = TempDir::new().unwrap();

    relpack_cmd(home.path())
        .args(["update-packages", "--version-to", "16.12.3"])
        .arg(obs.path())
        .assert()
        .failure()
        .stderr(contains("you must specify one committer"));
}

#[test]
fn update_packages_stages_tarball_and_bumps_version() {
    let home = TempDir::new().unwrap();
    let obs = TempDir::new().unwrap();
    let tarballs = TempDir::new().unwrap();
    write_package(obs.path(), "kate", "16.12.2");
    write_tarball(tarballs.path(), "kate", "16.12.3");

    relpack_cmd(home.path())
        .args(["-e", "packager@example.org", "update-packages"])
        .args(["--version-to", "16.12.3", "--tarball-dir"])
        .arg(tarballs.path())
        .arg(obs.path())
        .assert()
        .success()
        .stdout(contains("Processed 1 packages: updated 1"));

    let pkg = obs.path().join("kate");
    let spec = fs::read_to_string(pkg.join("kate.spec")).unwrap();
    assert!(spec.contains("Version:        16.12.3\n"), "spec: {spec}");
    assert!(pkg.join("kate-16.12.3.tar.xz").exists());
    assert!(tarballs.path().join("done").join("kate-16.12.3.tar.xz").exists());

    let changes = fs::read_to_string(pkg.join("kate.changes")).unwrap();
    assert!(changes.contains("packager@example.org"), "changes: {changes}");
    assert!(changes.contains("- Update to 16.12.3"), "changes: {changes}");
}

#[test]
fn committer_is_read_from_config_file() {
    let home = TempDir::new().unwrap();
    let config_dir = home.path().join(".config").join("relpack");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.yaml"), "committer: file@example.org\n").unwrap();

    let obs = TempDir::new().unwrap();
    let tarballs = TempDir::new().unwrap();
    write_package(obs.path(), "okular", "16.12.2");
    write_tarball(tarballs.path(), "okular", "16.12.3");

    relpack_cmd(home.path())
        .args(["update-packages", "--version-to", "16.12.3", "--tarball-dir"])
        .arg(tarballs.path())
        .arg(obs.path())
        .assert()
        .success();

    let changes = fs::read_to_string(obs.path().join("okular").join("okular.changes")).unwrap();
    assert!(changes.contains("file@example.org"), "changes: {changes}");
}

#[test]
fn malformed_config_fails_before_touching_packages() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("relpack.yaml");
    fs::write(&config, "committer: [unterminated\n").unwrap();

    let obs = TempDir::new().unwrap();
    write_package(obs.path(), "kate", "16.12.2");

    relpack_cmd(home.path())
        .arg("--config")
        .arg(&config)
        .args(["update-packages", "--version-to", "16.12.3"])
        .arg(obs.path())
        .assert()
        .failure()
        .stderr(contains("failed to load configuration"));

    let spec = fs::read_to_string(obs.path().join("kate").join("kate.spec")).unwrap();
    assert!(spec.contains("16.12.2"));
}

#[test]
fn make_changes_prepends_entry_next_to_spec() {
    let home = TempDir::new().unwrap();
    let obs = TempDir::new().unwrap();
    write_package(obs.path(), "kate", "16.12.2");
    let pkg = obs.path().join("kate");
    fs::write(pkg.join("kate.changes"), "older entry\n").unwrap();

    relpack_cmd(home.path())
        .args(["-e", "packager@example.org", "make-changes"])
        .args(["--version-to", "16.12.3", "-k", "plasma"])
        .arg(pkg.join("kate.spec"))
        .assert()
        .success()
        .stdout(contains("Wrote 16.12.3 entry"));

    let changes = fs::read_to_string(pkg.join("kate.changes")).unwrap();
    assert!(changes.starts_with("-------"), "changes: {changes}");
    assert!(changes.contains("- Update to 16.12.3"));
    assert!(changes.trim_end().ends_with("older entry"));

    let spec = fs::read_to_string(pkg.join("kate.spec")).unwrap();
    assert!(spec.contains("16.12.2"), "make-changes never bumps the spec");
}

#[test]
fn unknown_release_kind_is_a_usage_error() {
    let home = TempDir::new().unwrap();
    relpack_cmd(home.path())
        .args(["-e", "p@example.org", "make-changes", "--version-to", "1.0", "-k", "kde"])
        .arg("kate.spec")
        .assert()
        .failure()
        .stderr(contains("unknown release kind"));
}

#[test]
fn sync_from_unstable_reports_missing_packages() {
    let home = TempDir::new().unwrap();
    let stable = TempDir::new().unwrap();
    let unstable = TempDir::new().unwrap();
    let tarballs = TempDir::new().unwrap();
    write_package(stable.path(), "kate", "16.12.1");
    write_package(stable.path(), "okular", "16.12.1");
    write_package(unstable.path(), "kate", "16.12.2");
    write_tarball(tarballs.path(), "kate", "16.12.3");

    relpack_cmd(home.path())
        .args(["-e", "packager@example.org", "sync-from-unstable-project"])
        .arg("--unstable-dir")
        .arg(unstable.path())
        .args(["--version-to", "16.12.3", "--tarball-dir"])
        .arg(tarballs.path())
        .arg(stable.path())
        .assert()
        .success()
        .stdout(contains("updated 1"))
        .stdout(contains("Missing packages:\n- okular"));

    let spec = fs::read_to_string(stable.path().join("kate").join("kate.spec")).unwrap();
    assert!(spec.contains("16.12.3"));
}
