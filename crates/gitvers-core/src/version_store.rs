//! Version numbers derived from commit history.
//!
//! Nothing is stored: the next number is the commit count plus one, and a
//! number is resolved by scanning history (newest first) for the first
//! message tagged `Version {N}:`.

use std::path::Path;

use gitvers_hosting::{HostingClient, Lookup};
use serde::Serialize;
use tracing::debug;

use crate::config::GitversConfig;
use crate::error::{GitversError, Result};
use crate::history::{CommitRecord, HistorySource, VersionTag};
use crate::vcs::VcsClient;

/// What a version identifier resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    /// A version number found in history
    Version { number: u64, hash: String },
    /// A literal commit reference, passed through unverified
    Reference { reference: String },
}

impl Resolution {
    /// The commit reference to hand to the VCS.
    pub fn commit(&self) -> &str {
        match self {
            Resolution::Version { hash, .. } => hash,
            Resolution::Reference { reference } => reference,
        }
    }

    pub fn version(&self) -> Option<u64> {
        match self {
            Resolution::Version { number, .. } => Some(*number),
            Resolution::Reference { .. } => None,
        }
    }
}

/// Whether `identifier` names a version number rather than a commit.
pub fn is_version_number(identifier: &str) -> bool {
    !identifier.is_empty() && identifier.bytes().all(|b| b.is_ascii_digit())
}

/// Find the newest commit tagged with `number`.
pub fn find_version<'h>(history: &'h [CommitRecord], number: u64) -> Option<&'h CommitRecord> {
    history
        .iter()
        .find(|commit| VersionTag::matches(&commit.message, number))
}

/// Derives and resolves version numbers.
pub struct VersionStore<'a> {
    config: &'a GitversConfig,
    vcs: &'a dyn VcsClient,
    hosting: &'a dyn HostingClient,
}

impl<'a> VersionStore<'a> {
    pub fn new(
        config: &'a GitversConfig,
        vcs: &'a dyn VcsClient,
        hosting: &'a dyn HostingClient,
    ) -> Self {
        Self {
            config,
            vcs,
            hosting,
        }
    }

    /// Commit count plus one, or 1 when the count cannot be taken.
    pub async fn next_version_number(&self, path: &Path) -> u64 {
        match self.vcs.commit_count(path).await {
            Ok(count) => count + 1,
            Err(e) => {
                debug!(error = %e, "No commit count, starting at version 1");
                1
            }
        }
    }

    /// History newest first, from the working copy when it is tracked and
    /// from the hosting service otherwise.
    pub async fn history(&self, path: &Path) -> Result<(HistorySource, Vec<CommitRecord>)> {
        if self.vcs.is_tracked(path).await {
            return Ok((HistorySource::Local, self.vcs.log(path).await?));
        }

        let owner = self
            .config
            .owner
            .as_deref()
            .ok_or_else(|| GitversError::Config("repository owner is not known".to_string()))?;
        let commits = match self
            .hosting
            .list_commits(owner, &self.config.repo_name)
            .await
        {
            Lookup::Found(commits) => commits,
            Lookup::NotFound => Vec::new(),
            Lookup::Error(e) => return Err(e.into()),
        };
        let records = commits
            .into_iter()
            .map(|c| CommitRecord::new(c.sha.clone(), c.subject()))
            .collect();
        Ok((HistorySource::Remote, records))
    }

    /// Resolve a version number or pass a commit reference through.
    ///
    /// Only purely numeric identifiers consult history. When several
    /// commits carry the same number the newest one wins.
    pub async fn resolve(&self, path: &Path, identifier: &str) -> Result<Resolution> {
        if !is_version_number(identifier) {
            return Ok(Resolution::Reference {
                reference: identifier.to_string(),
            });
        }
        // Too large for any published version.
        let Ok(number) = identifier.parse::<u64>() else {
            return Err(GitversError::VersionNotFound(identifier.to_string()));
        };

        let (source, history) = self.history(path).await?;
        match find_version(&history, number) {
            Some(commit) => {
                debug!(version = number, hash = %commit.hash, ?source, "Resolved version");
                Ok(Resolution::Version {
                    number,
                    hash: commit.hash.clone(),
                })
            }
            None => Err(GitversError::VersionNotFound(identifier.to_string())),
        }
    }
}
