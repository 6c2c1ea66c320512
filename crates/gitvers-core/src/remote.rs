//! Remote bootstrap: make sure the hosted repository exists and clone it.

use std::path::Path;

use gitvers_hosting::{HostingClient, Lookup};
use serde::Serialize;
use tracing::info;

use crate::config::GitversConfig;
use crate::error::{GitversError, Result};
use crate::obs;
use crate::vcs::VcsClient;

/// Outcome of [`ensure_remote_repository`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RemoteStatus {
    AlreadyExists { url: String },
    Created { url: String },
}

impl RemoteStatus {
    pub fn url(&self) -> &str {
        match self {
            RemoteStatus::AlreadyExists { url } | RemoteStatus::Created { url } => url,
        }
    }
}

/// Outcome of [`clone_latest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloneOutcome {
    Cloned,
    AlreadyPresent,
}

/// Fill in the repository owner from the credential when it is not set.
pub async fn resolve_owner(
    config: GitversConfig,
    hosting: &dyn HostingClient,
) -> Result<GitversConfig> {
    if config.owner.is_some() {
        return Ok(config);
    }
    let login = hosting.current_login().await?;
    Ok(config.with_owner(&login))
}

/// Create the private repository unless it already exists.
pub async fn ensure_remote_repository(
    config: &GitversConfig,
    hosting: &dyn HostingClient,
) -> Result<RemoteStatus> {
    let url = config.repo_url()?;
    let owner = config
        .owner
        .as_deref()
        .ok_or_else(|| GitversError::Config("repository owner is not known".to_string()))?;

    match hosting.find_repository(owner, &config.repo_name).await {
        Lookup::Found(_) => {
            info!(repo = %config.repo_name, "Repository already exists");
            Ok(RemoteStatus::AlreadyExists { url })
        }
        Lookup::NotFound => {
            hosting.create_repository(&config.repo_name).await?;
            obs::emit_remote_created(&url);
            Ok(RemoteStatus::Created { url })
        }
        Lookup::Error(e) => Err(e.into()),
    }
}

/// Clone the remote into `path` unless something is already there.
pub async fn clone_latest(
    config: &GitversConfig,
    vcs: &dyn VcsClient,
    path: &Path,
) -> Result<CloneOutcome> {
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        info!(path = %path.display(), "Directory already exists, not cloning");
        return Ok(CloneOutcome::AlreadyPresent);
    }
    vcs.clone_repo(&config.remote_url()?, path).await?;
    Ok(CloneOutcome::Cloned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeVcs, VcsCall};
    use gitvers_hosting::fakes::{FakeHosting, HostingCall};

    fn config() -> GitversConfig {
        GitversConfig::new("tok", "site").with_owner("octo")
    }

    #[tokio::test]
    async fn creates_missing_repository() {
        let hosting = FakeHosting::new("octo");
        let status = ensure_remote_repository(&config(), &hosting).await.unwrap();
        assert_eq!(
            status,
            RemoteStatus::Created {
                url: "https://github.com/octo/site.git".to_string()
            }
        );
        assert!(hosting
            .calls()
            .contains(&HostingCall::CreateRepository("site".to_string())));
    }

    #[tokio::test]
    async fn existing_repository_is_left_alone() {
        let hosting = FakeHosting::new("octo").with_repository("site", Vec::new());
        let status = ensure_remote_repository(&config(), &hosting).await.unwrap();
        assert!(matches!(status, RemoteStatus::AlreadyExists { .. }));
        assert!(!hosting
            .calls()
            .iter()
            .any(|c| matches!(c, HostingCall::CreateRepository(_))));
    }

    #[tokio::test]
    async fn rejected_credential_is_authentication_error() {
        let hosting = FakeHosting::new("octo").rejecting_credential();
        let err = ensure_remote_repository(&config(), &hosting)
            .await
            .unwrap_err();
        assert!(matches!(err, GitversError::Authentication(_)));
    }

    #[tokio::test]
    async fn owner_comes_from_login() {
        let hosting = FakeHosting::new("octo");
        let config = resolve_owner(GitversConfig::new("tok", "site"), &hosting)
            .await
            .unwrap();
        assert_eq!(config.owner.as_deref(), Some("octo"));
    }

    #[tokio::test]
    async fn owner_is_resolved_alongside_remote_override() {
        let hosting = FakeHosting::new("octo");
        let config = GitversConfig::new("tok", "site").with_remote_url("/srv/site.git");
        let config = resolve_owner(config, &hosting).await.unwrap();
        assert_eq!(config.owner.as_deref(), Some("octo"));
        assert_eq!(config.repo_url().unwrap(), "/srv/site.git");
    }

    #[tokio::test]
    async fn clone_latest_skips_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let vcs = FakeVcs::new().with_published_versions(1);

        let outcome = clone_latest(&config(), &vcs, dir.path()).await.unwrap();
        assert_eq!(outcome, CloneOutcome::AlreadyPresent);
        assert!(vcs.calls().is_empty());

        let target = dir.path().join("site");
        let outcome = clone_latest(&config(), &vcs, &target).await.unwrap();
        assert_eq!(outcome, CloneOutcome::Cloned);
        assert!(matches!(vcs.calls()[0], VcsCall::Clone { .. }));
    }
}
