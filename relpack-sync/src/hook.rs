//! Package-local post-update hook.

use std::path::Path;
use std::process::Command;

/// Script run after a successful update, relative to the package dir.
pub const PRE_CHECKIN_HOOK: &str = "pre_checkin.sh";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookStatus {
    NotPresent,
    /// Exit status zero; `stdout` is what the script printed.
    Succeeded { stdout: String },
    /// Spawn failure or non-zero exit. Never fatal.
    Failed { reason: String },
}

/// Run `sh ./pre_checkin.sh` in `package_dir` if the script exists.
pub fn run_pre_checkin(package_dir: &Path) -> HookStatus {
    if !package_dir.join(PRE_CHECKIN_HOOK).is_file() {
        return HookStatus::NotPresent;
    }
    tracing::debug!("running {} in {}", PRE_CHECKIN_HOOK, package_dir.display());

    let status = match Command::new("sh")
        .arg(format!("./{PRE_CHECKIN_HOOK}"))
        .current_dir(package_dir)
        .output()
    {
        Ok(output) => {
            let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
            for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
                tracing::info!("{}: {}", PRE_CHECKIN_HOOK, line);
            }
            if output.status.success() {
                HookStatus::Succeeded { stdout }
            } else {
                HookStatus::Failed {
                    reason: format!(
                        "{} ({})",
                        output.status,
                        String::from_utf8_lossy(&output.stderr).trim()
                    ),
                }
            }
        }
        Err(e) => HookStatus::Failed {
            reason: e.to_string(),
        },
    };
    if let HookStatus::Failed { reason } = &status {
        tracing::warn!(
            "{} failed in {}: {}",
            PRE_CHECKIN_HOOK,
            package_dir.display(),
            reason
        );
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn absent_hook_is_not_run() {
        let dir = TempDir::new().unwrap();
        assert_eq!(run_pre_checkin(dir.path()), HookStatus::NotPresent);
    }

    #[test]
    #[cfg(unix)]
    fn hook_runs_in_package_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(PRE_CHECKIN_HOOK), "touch ran\n").unwrap();
        assert!(matches!(run_pre_checkin(dir.path()), HookStatus::Succeeded { .. }));
        assert!(dir.path().join("ran").exists());
    }

    #[test]
    #[cfg(unix)]
    fn hook_output_is_kept() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(PRE_CHECKIN_HOOK),
            "echo formatted kate.spec\necho sorted patches\n",
        )
        .unwrap();
        assert_eq!(
            run_pre_checkin(dir.path()),
            HookStatus::Succeeded {
                stdout: "formatted kate.spec\nsorted patches\n".to_string()
            }
        );
    }

    #[test]
    #[cfg(unix)]
    fn failing_hook_is_reported_not_fatal() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(PRE_CHECKIN_HOOK), "echo broken >&2\nexit 3\n").unwrap();
        match run_pre_checkin(dir.path()) {
            HookStatus::Failed { reason } => assert!(reason.contains("broken")),
            other => panic!("expected Failed, got {other:?}"),
        }
    }
}
