//! Publish workflow: tag the next version number and push it.

use std::path::Path;

use gitvers_hosting::HostingClient;
use serde::Serialize;
use tracing::info;

use crate::config::GitversConfig;
use crate::error::{GitversError, Result};
use crate::history::VersionTag;
use crate::obs;
use crate::vcs::VcsClient;
use crate::version_store::VersionStore;

/// Result of a publish call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PublishOutcome {
    /// A new commit was created and pushed.
    Published { version: u64, message: String },
    /// Nothing was staged; the remote was not touched.
    NothingToCommit,
}

/// Commits a working copy as the next version and pushes it.
pub struct PublishWorkflow<'a> {
    config: &'a GitversConfig,
    vcs: &'a dyn VcsClient,
    store: VersionStore<'a>,
}

impl<'a> PublishWorkflow<'a> {
    pub fn new(
        config: &'a GitversConfig,
        vcs: &'a dyn VcsClient,
        hosting: &'a dyn HostingClient,
    ) -> Self {
        Self {
            config,
            vcs,
            store: VersionStore::new(config, vcs, hosting),
        }
    }

    /// Commit everything under `path` as `Version {N}: {message}` and push
    /// all branches.
    ///
    /// An empty commit is reported as [`PublishOutcome::NothingToCommit`]
    /// and stops before the remote is touched.
    pub async fn publish(&self, path: &Path, message: &str) -> Result<PublishOutcome> {
        tokio::fs::metadata(path)
            .await
            .map_err(|e| GitversError::filesystem(path, e))?;
        let remote = self.config.remote_url()?;

        self.vcs.init(path).await?;
        self.vcs.stage_all(path).await?;

        let version = self.store.next_version_number(path).await;
        let full_message = VersionTag::format_message(version, message);

        match self.vcs.commit(path, &full_message).await {
            Ok(()) => obs::emit_publish_committed(version, &full_message),
            Err(GitversError::NothingToCommit) => {
                obs::emit_publish_nothing_to_commit(path);
                return Ok(PublishOutcome::NothingToCommit);
            }
            Err(e) => return Err(e),
        }

        self.vcs
            .set_remote(path, &self.config.remote_name, remote.plain())
            .await?;
        self.vcs.push_all(path, &remote).await?;
        obs::emit_publish_pushed(version, remote.plain());
        info!("Published {full_message}");

        Ok(PublishOutcome::Published {
            version,
            message: full_message,
        })
    }
}
