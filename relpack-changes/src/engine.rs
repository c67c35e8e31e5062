//! Tera rendering of `.changes` entries.
//!
//! The entry template is embedded; a user template directory may override
//! it by providing `changes/entry.tera`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tera::Tera;

use crate::context::EntryContext;
use crate::error::{io_err, ChangesError};

/// Name of the entry template.
pub const ENTRY_TEMPLATE: &str = "changes/entry.tera";

const TPLS: &[(&str, &str)] = &[(
    ENTRY_TEMPLATE,
    include_str!("templates/changes/entry.tera"),
)];

// ---------------------------------------------------------------------------
// Template loading helpers
// ---------------------------------------------------------------------------

fn normalize_template_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").to_lowercase()
}

fn collect_template_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), ChangesError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let meta = entry.metadata().map_err(|e| io_err(&path, e))?;
        if meta.is_dir() {
            collect_template_files(&path, out)?;
        } else if meta.is_file() && path.extension().and_then(|s| s.to_str()) == Some("tera") {
            out.push(path);
        }
    }
    Ok(())
}

fn load_user_templates(dir: &Path) -> Result<Vec<(String, String)>, ChangesError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut files = Vec::new();
    collect_template_files(dir, &mut files)?;
    files
        .into_iter()
        .map(|path| {
            let rel = path.strip_prefix(dir).unwrap_or(path.as_path());
            let name = normalize_template_name(rel);
            let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
            Ok((name, contents))
        })
        .collect()
}

fn build_tera(user_template_dir: Option<&Path>) -> Result<Tera, ChangesError> {
    let mut templates: HashMap<String, String> = TPLS
        .iter()
        .map(|(name, content)| (normalize_template_name(Path::new(name)), content.to_string()))
        .collect();
    if let Some(dir) = user_template_dir {
        for (name, content) in load_user_templates(dir)? {
            tracing::debug!("Using user template {}", name);
            templates.insert(name, content);
        }
    }

    let mut tera = Tera::default();
    tera.add_raw_templates(templates)?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Embedded templates plus optional user overrides.
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    pub fn new(user_template_dir: Option<&Path>) -> Result<Self, ChangesError> {
        Ok(TemplateEngine {
            tera: build_tera(user_template_dir)?,
        })
    }

    /// Render one entry. Line endings are normalised to `\n` and trailing
    /// whitespace is dropped; the result does not end in a newline.
    pub fn render_entry(&self, ctx: &EntryContext) -> Result<String, ChangesError> {
        let rendered = self.tera.render(ENTRY_TEMPLATE, &ctx.to_tera_context()?)?;
        Ok(rendered.replace("\r\n", "\n").trim_end().to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SectionCtx;
    use chrono::{TimeZone, Utc};
    use relpack_core::{ReleaseKind, ReleaseType};
    use tempfile::TempDir;

    fn ctx() -> EntryContext {
        let ts = Utc.with_ymd_and_hms(2017, 3, 9, 7, 5, 1).unwrap();
        EntryContext::release(
            ts,
            "packager@example.org",
            "16.12.3",
            ReleaseKind::Applications,
            ReleaseType::Bugfix,
        )
    }

    #[test]
    fn renders_full_entry() {
        let engine = TemplateEngine::new(None).unwrap();
        let mut ctx = ctx();
        ctx.sections.push(SectionCtx::new(
            "- Changes since 16.12.2:",
            vec!["Fix crash when saving (kde#12345)".to_string()],
        ));
        let text = engine.render_entry(&ctx).unwrap();
        let expected = "\
-------------------------------------------------------------------
Thu Mar 09 07:05:01 UTC 2017 - packager@example.org

- Update to 16.12.3
  * New bugfix release
  * For more details please see:
  * https://www.kde.org/announcements/announce-applications-16.12.3.php
- Changes since 16.12.2:
  * Fix crash when saving (kde#12345)";
        assert_eq!(text, expected);
    }

    #[test]
    fn dummy_entry_has_only_update_line() {
        let engine = TemplateEngine::new(None).unwrap();
        let ts = Utc.with_ymd_and_hms(2017, 3, 9, 7, 5, 1).unwrap();
        let text = engine
            .render_entry(&EntryContext::dummy(ts, "p@example.org", "5.9.4"))
            .unwrap();
        assert!(text.ends_with("\n\n- Update to 5.9.4"), "got:\n{text}");
        assert!(!text.contains("release"));
    }

    #[test]
    fn user_template_overrides_embedded_one() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("changes")).unwrap();
        std::fs::write(
            dir.path().join("changes").join("Entry.tera"),
            "{{ committer }} updated to {{ version_to }}\r\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("changes").join("notes.txt"), "ignored").unwrap();

        let engine = TemplateEngine::new(Some(dir.path())).unwrap();
        let text = engine.render_entry(&ctx()).unwrap();
        assert_eq!(text, "packager@example.org updated to 16.12.3");
    }

    #[test]
    fn missing_user_dir_falls_back_to_embedded() {
        let dir = TempDir::new().unwrap();
        let engine = TemplateEngine::new(Some(&dir.path().join("absent"))).unwrap();
        assert!(engine.render_entry(&ctx()).unwrap().starts_with("-----"));
    }
}
