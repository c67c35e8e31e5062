//! # relpack-vcs
//!
//! Narrow capabilities relpack needs from external tools:
//!
//! - [`CommitHistory`]: list commits in a range, read subjects and
//!   messages, look up tags, switch branches (system `git` in [`git`])
//! - [`UpstreamRepos`]: open the upstream checkout of a reponame
//! - [`SourceFetcher`]: download package sources from the build service
//!   (`osc` in [`fetch`])
//!
//! [`memory`] holds in-process implementations used by tests.

pub mod error;
pub mod fetch;
pub mod git;
pub mod history;
pub mod memory;

pub use error::VcsError;
pub use fetch::{OscFetcher, SourceFetcher};
pub use git::{GitHistory, GitRepos};
pub use history::{CommitHistory, UpstreamRepos};
pub use memory::{MemoryHistory, MemoryRepos, RecordingFetcher};
