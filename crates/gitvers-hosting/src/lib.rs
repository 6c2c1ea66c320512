//! gitvers-hosting: hosting service integration
//!
//! Provides:
//! - The [`HostingClient`] trait the gitvers core talks to
//! - [`GitHubClient`], a GitHub REST implementation
//! - [`Lookup`], a typed found / not-found / error result that keeps the
//!   core independent of any hosting library's error model
//! - In-memory fakes for tests in [`fakes`]

pub mod error;
pub mod fakes;
pub mod github;

pub use error::HostingError;
pub use github::GitHubClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result type for hosting operations
pub type Result<T> = std::result::Result<T, HostingError>;

/// Outcome of a lookup against the hosting service.
#[derive(Debug)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    Error(HostingError),
}

impl<T> Lookup<T> {
    /// Collapse into a `Result`, with not-found as `Ok(None)`.
    pub fn into_result(self) -> Result<Option<T>> {
        match self {
            Lookup::Found(value) => Ok(Some(value)),
            Lookup::NotFound => Ok(None),
            Lookup::Error(err) => Err(err),
        }
    }
}

/// A repository as reported by the hosting service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoInfo {
    pub name: String,
    pub full_name: String,
    pub clone_url: String,
    pub private: bool,
}

/// A commit as listed by the hosting service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCommit {
    /// Full 40-char commit hash
    pub sha: String,
    /// Full commit message, possibly multi-line
    pub message: String,
    pub committed_at: Option<DateTime<Utc>>,
}

impl RemoteCommit {
    /// The subject line of the message.
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// Remote repository management.
///
/// Implementations must never include the credential in returned errors.
#[async_trait]
pub trait HostingClient: Send + Sync {
    /// Login of the account the credential belongs to.
    async fn current_login(&self) -> Result<String>;

    /// Look up `owner/name`.
    async fn find_repository(&self, owner: &str, name: &str) -> Lookup<RepoInfo>;

    /// Create a private repository owned by the authenticated account.
    async fn create_repository(&self, name: &str) -> Result<RepoInfo>;

    /// Commits of the default branch, newest first.
    async fn list_commits(&self, owner: &str, name: &str) -> Lookup<Vec<RemoteCommit>>;

    /// Whether `owner/name` exists.
    async fn exists(&self, owner: &str, name: &str) -> Result<bool> {
        Ok(self.find_repository(owner, name).await.into_result()?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_into_result() {
        assert_eq!(Lookup::Found(3).into_result().unwrap(), Some(3));
        assert_eq!(Lookup::<u8>::NotFound.into_result().unwrap(), None);
        assert!(Lookup::<u8>::Error(HostingError::Unauthorized)
            .into_result()
            .is_err());
    }

    #[test]
    fn remote_commit_subject_is_first_line() {
        let commit = RemoteCommit {
            sha: "abc1234def5678abc1234def5678abc1234def56".to_string(),
            message: "Version 3: initial\n\nbody text".to_string(),
            committed_at: None,
        };
        assert_eq!(commit.subject(), "Version 3: initial");
    }
}
