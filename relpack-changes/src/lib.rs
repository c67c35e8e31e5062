//! # relpack-changes
//!
//! Synthesizes `.changes` entries from upstream commit history and renders
//! them through an embedded Tera template.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use relpack_changes::{ChangeRequest, Synthesizer};
//! use relpack_core::{ReleaseKind, ReleaseType};
//! use relpack_vcs::GitHistory;
//!
//! fn kate_entry() -> Result<String, relpack_changes::ChangesError> {
//!     let synth = Synthesizer::new(None)?;
//!     let request = ChangeRequest {
//!         version_from: "16.12.2".into(),
//!         version_to: "16.12.3".into(),
//!         kind: ReleaseKind::Applications,
//!         release_type: ReleaseType::Bugfix,
//!         fallback_branch: None,
//!         previous_patches: None,
//!         current_patches: vec![],
//!         committer: "packager@example.org".into(),
//!         timestamp: Utc::now(),
//!     };
//!     let entry = synth.synthesize(&GitHistory::new("/src/kde/kate"), &request)?;
//!     Ok(entry.text)
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod synth;

pub use context::{EntryContext, SectionCtx};
pub use engine::TemplateEngine;
pub use error::ChangesError;
pub use synth::{ChangeRequest, ChangelogEntry, PatchDrift, Synthesizer};
