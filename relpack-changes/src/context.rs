//! Template context: the serializable payload of one `.changes` entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use relpack_core::{ReleaseKind, ReleaseType};

use crate::error::ChangesError;

/// Header date format of `.changes` entries.
pub const DATE_FORMAT: &str = "%a %b %d %H:%M:%S UTC %Y";

/// Rendering payload for `changes/entry.tera`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryContext {
    pub date: String,
    pub committer: String,
    pub version_to: String,
    /// `bugfix` / `feature`; absent in dummy entries.
    pub release_type: Option<String>,
    pub announcement_url: Option<String>,
    /// Commit and patch sections, in display order.
    pub sections: Vec<SectionCtx>,
}

/// A `- heading` line followed by `  * item` bullets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionCtx {
    pub heading: String,
    pub items: Vec<String>,
}

impl SectionCtx {
    pub fn new(heading: impl Into<String>, items: Vec<String>) -> Self {
        SectionCtx {
            heading: heading.into(),
            items,
        }
    }
}

impl EntryContext {
    /// Full release header, no sections yet.
    pub fn release(
        timestamp: DateTime<Utc>,
        committer: &str,
        version_to: &str,
        kind: ReleaseKind,
        release_type: ReleaseType,
    ) -> Self {
        EntryContext {
            date: timestamp.format(DATE_FORMAT).to_string(),
            committer: committer.to_string(),
            version_to: version_to.to_string(),
            release_type: Some(release_type.to_string()),
            announcement_url: kind.announcement_url(version_to),
            sections: Vec::new(),
        }
    }

    /// `- Update to {version}` and nothing else.
    pub fn dummy(timestamp: DateTime<Utc>, committer: &str, version_to: &str) -> Self {
        EntryContext {
            date: timestamp.format(DATE_FORMAT).to_string(),
            committer: committer.to_string(),
            version_to: version_to.to_string(),
            release_type: None,
            announcement_url: None,
            sections: Vec::new(),
        }
    }

    pub fn to_tera_context(&self) -> Result<tera::Context, ChangesError> {
        tera::Context::from_serialize(self).map_err(ChangesError::from)
    }
}
