//! VCS client seam.
//!
//! gitvers never touches repository internals itself; every primitive goes
//! through [`VcsClient`]. [`git::GitCli`] drives the `git` binary, and
//! [`crate::fakes::FakeVcs`] stands in for it in tests.

pub mod git;

use std::path::Path;

use async_trait::async_trait;

use crate::config::RemoteUrl;
use crate::error::Result;
use crate::history::CommitRecord;

/// Primitive VCS operations against a working copy.
///
/// Every method blocks its caller until the underlying operation finishes.
/// Errors carry the failing [`crate::error::VcsStep`] and a diagnostic that
/// has been scrubbed of the credential.
#[async_trait]
pub trait VcsClient: Send + Sync {
    /// Clone `url` into `path`, which must not exist yet.
    async fn clone_repo(&self, url: &RemoteUrl, path: &Path) -> Result<()>;

    /// Initialise a repository at `path`; no-op if already initialised.
    async fn init(&self, path: &Path) -> Result<()>;

    /// Whether `path` holds VCS metadata.
    async fn is_tracked(&self, path: &Path) -> bool;

    /// Stage every pending change.
    async fn stage_all(&self, path: &Path) -> Result<()>;

    /// Commit staged changes. Fails with `GitversError::NothingToCommit`
    /// when nothing is staged.
    async fn commit(&self, path: &Path, message: &str) -> Result<()>;

    /// (Re)point remote `name` at `url`.
    async fn set_remote(&self, path: &Path, name: &str, url: &str) -> Result<()>;

    /// Push every local branch.
    async fn push_all(&self, path: &Path, url: &RemoteUrl) -> Result<()>;

    /// Number of commits reachable from HEAD.
    async fn commit_count(&self, path: &Path) -> Result<u64>;

    /// History reachable from HEAD, newest first.
    async fn log(&self, path: &Path) -> Result<Vec<CommitRecord>>;

    /// Check out an existing branch or commit.
    async fn checkout(&self, path: &Path, reference: &str) -> Result<()>;

    /// Create branch `name` at HEAD and check it out.
    async fn create_branch(&self, path: &Path, name: &str) -> Result<()>;

    /// Move the current branch to `reference`, discarding local changes.
    async fn hard_reset(&self, path: &Path, reference: &str) -> Result<()>;

    /// Force-push `branch`, overwriting the remote branch.
    async fn force_push(&self, path: &Path, url: &RemoteUrl, branch: &str) -> Result<()>;
}
