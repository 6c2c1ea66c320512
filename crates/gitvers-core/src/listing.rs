//! History listing for display.

use std::fmt;
use std::path::Path;

use gitvers_hosting::HostingClient;
use serde::Serialize;

use crate::config::GitversConfig;
use crate::error::Result;
use crate::history::{CommitRecord, HistorySource};
use crate::vcs::VcsClient;
use crate::version_store::VersionStore;

/// Length of hashes shown for remote listings.
const SHORT_HASH: usize = 7;

/// Commits newest first, with where they came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryListing {
    pub source: HistorySource,
    pub entries: Vec<CommitRecord>,
}

impl HistoryListing {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for HistoryListing {
    /// One `{hash} - {message}` line per commit.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}

/// List the working copy's history, or the remote's when `path` is not a
/// tracked working copy.
pub async fn list_history(
    config: &GitversConfig,
    vcs: &dyn VcsClient,
    hosting: &dyn HostingClient,
    path: &Path,
) -> Result<HistoryListing> {
    let (source, mut entries) = VersionStore::new(config, vcs, hosting)
        .history(path)
        .await?;
    if source == HistorySource::Remote {
        for entry in &mut entries {
            entry.hash.truncate(SHORT_HASH);
        }
    }
    Ok(HistoryListing { source, entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FakeVcs;
    use gitvers_hosting::fakes::FakeHosting;
    use gitvers_hosting::RemoteCommit;

    fn config() -> GitversConfig {
        GitversConfig::new("tok", "site").with_owner("octo")
    }

    #[tokio::test]
    async fn tracked_path_lists_local_log() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        let config = config();
        let hosting = FakeHosting::new("octo");
        let vcs = FakeVcs::new().with_published_versions(2);

        let listing = list_history(&config, &vcs, &hosting, dir.path())
            .await
            .unwrap();

        assert_eq!(listing.source, HistorySource::Local);
        assert_eq!(listing.entries.len(), 2);
        assert_eq!(listing.entries[0].hash.len(), 40);
        let rendered = listing.to_string();
        assert!(rendered.contains(" - Version 2: change 2\n"));
        assert!(hosting.calls().is_empty());
    }

    #[tokio::test]
    async fn untracked_path_lists_remote_with_short_hashes() {
        let dir = tempfile::tempdir().unwrap();
        let config = config();
        let hosting = FakeHosting::new("octo").with_repository(
            "site",
            vec![RemoteCommit {
                sha: "abc1234def5678abc1234def5678abc1234def56".to_string(),
                message: "Version 3: initial".to_string(),
                committed_at: None,
            }],
        );
        let vcs = FakeVcs::new();

        let listing = list_history(&config, &vcs, &hosting, dir.path())
            .await
            .unwrap();

        assert_eq!(listing.source, HistorySource::Remote);
        assert_eq!(listing.to_string(), "abc1234 - Version 3: initial\n");
    }

    #[tokio::test]
    async fn missing_remote_is_empty_listing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config();
        let hosting = FakeHosting::new("octo");
        let vcs = FakeVcs::new();

        let listing = list_history(&config, &vcs, &hosting, dir.path())
            .await
            .unwrap();
        assert!(listing.is_empty());
    }
}
