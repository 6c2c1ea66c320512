//! gitvers Core Library
//!
//! Sequential version numbers layered on git and a hosting service:
//! publish a directory as `Version N`, list versions, and restore a
//! working copy and its remote branch to any earlier version.

pub mod config;
pub mod error;
pub mod fakes;
pub mod history;
pub mod listing;
pub mod obs;
pub mod publish;
pub mod remote;
pub mod restore;
pub mod telemetry;
pub mod vcs;
pub mod version_store;

pub use config::{GitversConfig, Identity, RemoteUrl, Secret};
pub use error::{GitversError, Result, VcsStep};
pub use history::{
    CommitRecord, DelimitedLogDecoder, HistoryDecoder, HistorySource, VersionTag,
};
pub use listing::{list_history, HistoryListing};
pub use publish::{PublishOutcome, PublishWorkflow};
pub use remote::{clone_latest, ensure_remote_repository, resolve_owner, CloneOutcome, RemoteStatus};
pub use restore::{
    backup_path, RestoreCoordinator, RestoreEffects, RestoreFailure, RestoreReport, RestoreRun,
    RestoreStage, RestoreState,
};
pub use telemetry::init_tracing;
pub use vcs::git::GitCli;
pub use vcs::VcsClient;
pub use version_store::{Resolution, VersionStore};

pub use gitvers_hosting::{GitHubClient, HostingClient, HostingError, Lookup};

/// gitvers version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
