//! Restore coordinator: roll a working copy and its remote branch back to
//! a version number or commit.
//!
//! Restore is an explicit state machine:
//!
//! ```text
//! ResolveIdentifier → BackupExisting → EnsureWorkingCopy → VerifyTracked
//!     → SwitchBranch → HardReset → ForcePublish → Done
//! ```
//!
//! Any state may move to `Failed`. Resolution runs first, so an unknown
//! version never touches the filesystem. Once the backup has been taken it
//! is never moved back automatically; a failed restore leaves the prior
//! working copy in the backup sibling for manual recovery.

use std::fmt;
use std::path::{Path, PathBuf};

use gitvers_hosting::HostingClient;
use serde::Serialize;
use tracing::{debug, info, Instrument};

use crate::config::{GitversConfig, RemoteUrl};
use crate::error::{GitversError, Result};
use crate::obs;
use crate::vcs::VcsClient;
use crate::version_store::{Resolution, VersionStore};

/// The non-terminal states, used to label transitions and failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RestoreStage {
    ResolveIdentifier,
    BackupExisting,
    EnsureWorkingCopy,
    VerifyTracked,
    SwitchBranch,
    HardReset,
    ForcePublish,
}

impl fmt::Display for RestoreStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Side effects accumulated so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestoreEffects {
    /// Where the prior working copy was moved
    pub backup: Option<PathBuf>,
    pub cloned: bool,
    pub branch_switched: bool,
    pub reset_applied: bool,
    pub pushed: bool,
}

impl RestoreEffects {
    /// Whether anything on disk or on the remote has changed.
    pub fn any(&self) -> bool {
        self.backup.is_some()
            || self.cloned
            || self.branch_switched
            || self.reset_applied
            || self.pushed
    }
}

/// Successful restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    /// Identifier as given by the caller
    pub identifier: String,
    pub resolution: Resolution,
    pub branch: String,
    pub effects: RestoreEffects,
}

impl RestoreReport {
    pub fn commit(&self) -> &str {
        self.resolution.commit()
    }
}

/// Failed restore: the stage that failed, why, and what had already
/// happened.
#[derive(Debug, thiserror::Error)]
#[error("restore failed during {stage}: {error}")]
pub struct RestoreFailure {
    pub stage: RestoreStage,
    #[source]
    pub error: GitversError,
    pub effects: RestoreEffects,
}

/// Resolved target carried through the states after resolution.
#[derive(Debug, Clone)]
pub struct RestoreTarget {
    pub resolution: Resolution,
    pub remote: RemoteUrl,
}

/// One state of the restore machine.
#[derive(Debug)]
pub enum RestoreState {
    ResolveIdentifier,
    BackupExisting(RestoreTarget),
    EnsureWorkingCopy(RestoreTarget),
    VerifyTracked(RestoreTarget),
    SwitchBranch(RestoreTarget),
    HardReset(RestoreTarget),
    ForcePublish(RestoreTarget),
    Done(RestoreReport),
    Failed(RestoreFailure),
}

impl RestoreState {
    pub fn stage(&self) -> Option<RestoreStage> {
        match self {
            RestoreState::ResolveIdentifier => Some(RestoreStage::ResolveIdentifier),
            RestoreState::BackupExisting(_) => Some(RestoreStage::BackupExisting),
            RestoreState::EnsureWorkingCopy(_) => Some(RestoreStage::EnsureWorkingCopy),
            RestoreState::VerifyTracked(_) => Some(RestoreStage::VerifyTracked),
            RestoreState::SwitchBranch(_) => Some(RestoreStage::SwitchBranch),
            RestoreState::HardReset(_) => Some(RestoreStage::HardReset),
            RestoreState::ForcePublish(_) => Some(RestoreStage::ForcePublish),
            RestoreState::Done(_) | RestoreState::Failed(_) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.stage().is_none()
    }

    fn name(&self) -> &'static str {
        match self {
            RestoreState::ResolveIdentifier => "ResolveIdentifier",
            RestoreState::BackupExisting(_) => "BackupExisting",
            RestoreState::EnsureWorkingCopy(_) => "EnsureWorkingCopy",
            RestoreState::VerifyTracked(_) => "VerifyTracked",
            RestoreState::SwitchBranch(_) => "SwitchBranch",
            RestoreState::HardReset(_) => "HardReset",
            RestoreState::ForcePublish(_) => "ForcePublish",
            RestoreState::Done(_) => "Done",
            RestoreState::Failed(_) => "Failed",
        }
    }
}

/// `path` with the backup suffix appended to its final component.
pub fn backup_path(path: &Path, suffix: &str) -> Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        GitversError::filesystem(
            path,
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "path has no final component to back up",
            ),
        )
    })?;
    let mut backup_name = name.to_os_string();
    backup_name.push(suffix);
    Ok(path.with_file_name(backup_name))
}

async fn exists(path: &Path) -> bool {
    tokio::fs::symlink_metadata(path).await.is_ok()
}

/// Builds restore runs for one configuration.
pub struct RestoreCoordinator<'a> {
    config: &'a GitversConfig,
    vcs: &'a dyn VcsClient,
    store: VersionStore<'a>,
}

impl<'a> RestoreCoordinator<'a> {
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

    /// Start a restore of `path` to `identifier` without running it.
    pub fn start(&self, path: &Path, identifier: &str) -> RestoreRun<'_, 'a> {
        RestoreRun {
            coordinator: self,
            path: path.to_path_buf(),
            identifier: identifier.to_string(),
            effects: RestoreEffects::default(),
            state: RestoreState::ResolveIdentifier,
        }
    }

    /// Run a restore to completion.
    pub async fn restore(
        &self,
        path: &Path,
        identifier: &str,
    ) -> std::result::Result<RestoreReport, RestoreFailure> {
        self.start(path, identifier)
            .run()
            .instrument(obs::restore_span(path, identifier))
            .await
    }
}

/// A single restore call, advanced one state at a time.
pub struct RestoreRun<'c, 'a> {
    coordinator: &'c RestoreCoordinator<'a>,
    path: PathBuf,
    identifier: String,
    effects: RestoreEffects,
    state: RestoreState,
}

impl RestoreRun<'_, '_> {
    pub fn state(&self) -> &RestoreState {
        &self.state
    }

    pub fn effects(&self) -> &RestoreEffects {
        &self.effects
    }

    /// Run the transition for the current state. Terminal states are left
    /// as they are.
    pub async fn advance(&mut self) -> &RestoreState {
        let Some(stage) = self.state.stage() else {
            return &self.state;
        };
        let current = std::mem::replace(&mut self.state, RestoreState::ResolveIdentifier);
        let next = match self.step(current).await {
            Ok(next) => next,
            Err(error) => {
                obs::emit_restore_failed(stage, &error, self.effects.backup.as_deref());
                RestoreState::Failed(RestoreFailure {
                    stage,
                    error,
                    effects: self.effects.clone(),
                })
            }
        };
        obs::emit_restore_transition(stage, next.name());
        self.state = next;
        &self.state
    }

    /// Advance until `Done` or `Failed`.
    pub async fn run(mut self) -> std::result::Result<RestoreReport, RestoreFailure> {
        loop {
            self.advance().await;
            match std::mem::replace(&mut self.state, RestoreState::ResolveIdentifier) {
                RestoreState::Done(report) => return Ok(report),
                RestoreState::Failed(failure) => return Err(failure),
                pending => self.state = pending,
            }
        }
    }

    async fn step(&mut self, state: RestoreState) -> Result<RestoreState> {
        let config = self.coordinator.config;
        let vcs = self.coordinator.vcs;

        match state {
            RestoreState::ResolveIdentifier => {
                let resolution = self
                    .coordinator
                    .store
                    .resolve(&self.path, &self.identifier)
                    .await?;
                let remote = config.remote_url()?;
                info!(commit = %resolution.commit(), "Resolved restore target");
                Ok(RestoreState::BackupExisting(RestoreTarget { resolution, remote }))
            }

            RestoreState::BackupExisting(target) => {
                if !exists(&self.path).await {
                    info!(path = %self.path.display(), "No working copy, it will be cloned");
                    return Ok(RestoreState::EnsureWorkingCopy(target));
                }
                if self.path.file_name().is_none() {
                    // `.` or `..`: name the directory itself, not the cwd entry.
                    self.path = tokio::fs::canonicalize(&self.path)
                        .await
                        .map_err(|e| GitversError::filesystem(&self.path, e))?;
                }
                let backup = backup_path(&self.path, &config.backup_suffix)?;
                if exists(&backup).await {
                    debug!(backup = %backup.display(), "Removing stale backup");
                    remove_any(&backup).await?;
                }
                tokio::fs::rename(&self.path, &backup)
                    .await
                    .map_err(|e| GitversError::filesystem(&self.path, e))?;
                info!(backup = %backup.display(), "Moved working copy aside");
                self.effects.backup = Some(backup);
                Ok(RestoreState::EnsureWorkingCopy(target))
            }

            RestoreState::EnsureWorkingCopy(target) => {
                if !exists(&self.path).await {
                    vcs.clone_repo(&target.remote, &self.path).await?;
                    self.effects.cloned = true;
                }
                Ok(RestoreState::VerifyTracked(target))
            }

            RestoreState::VerifyTracked(target) => {
                if !vcs.is_tracked(&self.path).await {
                    return Err(GitversError::NotAGitRepo(self.path.clone()));
                }
                Ok(RestoreState::SwitchBranch(target))
            }

            RestoreState::SwitchBranch(target) => {
                if let Err(e) = vcs.checkout(&self.path, &config.branch).await {
                    debug!(error = %e, branch = %config.branch, "Checkout failed, creating branch");
                    vcs.create_branch(&self.path, &config.branch).await?;
                }
                self.effects.branch_switched = true;
                Ok(RestoreState::HardReset(target))
            }

            RestoreState::HardReset(target) => {
                vcs.hard_reset(&self.path, target.resolution.commit())
                    .await?;
                self.effects.reset_applied = true;
                Ok(RestoreState::ForcePublish(target))
            }

            RestoreState::ForcePublish(target) => {
                vcs.force_push(&self.path, &target.remote, &config.branch)
                    .await?;
                self.effects.pushed = true;
                obs::emit_restore_completed(target.resolution.commit(), &config.branch);
                Ok(RestoreState::Done(RestoreReport {
                    identifier: self.identifier.clone(),
                    resolution: target.resolution,
                    branch: config.branch.clone(),
                    effects: self.effects.clone(),
                }))
            }

            terminal @ (RestoreState::Done(_) | RestoreState::Failed(_)) => Ok(terminal),
        }
    }
}

async fn remove_any(path: &Path) -> Result<()> {
    let metadata = tokio::fs::symlink_metadata(path)
        .await
        .map_err(|e| GitversError::filesystem(path, e))?;
    let removed = if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };
    removed.map_err(|e| GitversError::filesystem(path, e))
}
