//! Error taxonomy for gitvers operations.

use std::fmt;
use std::path::PathBuf;

use gitvers_hosting::HostingError;

/// The VCS operation that was running when a process failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsStep {
    Clone,
    Init,
    StageAll,
    Commit,
    SetRemote,
    PushAll,
    CommitCount,
    Log,
    Checkout,
    CreateBranch,
    HardReset,
    ForcePush,
}

impl fmt::Display for VcsStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VcsStep::Clone => "clone",
            VcsStep::Init => "init",
            VcsStep::StageAll => "add",
            VcsStep::Commit => "commit",
            VcsStep::SetRemote => "remote",
            VcsStep::PushAll => "push --all",
            VcsStep::CommitCount => "rev-list --count",
            VcsStep::Log => "log",
            VcsStep::Checkout => "checkout",
            VcsStep::CreateBranch => "checkout -b",
            VcsStep::HardReset => "reset --hard",
            VcsStep::ForcePush => "push --force",
        };
        f.write_str(name)
    }
}

/// gitvers errors.
///
/// Diagnostics carried here have already been scrubbed of the credential.
#[derive(Debug, thiserror::Error)]
pub enum GitversError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("no commit tagged as version {0}")]
    VersionNotFound(String),

    #[error("nothing to commit")]
    NothingToCommit,

    #[error("git {step} failed: {diagnostic}")]
    VcsProcess { step: VcsStep, diagnostic: String },

    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a git repository: {}", .0.display())]
    NotAGitRepo(PathBuf),

    #[error("hosting error: {0}")]
    Hosting(HostingError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl GitversError {
    pub(crate) fn vcs(step: VcsStep, diagnostic: impl Into<String>) -> Self {
        GitversError::VcsProcess {
            step,
            diagnostic: diagnostic.into(),
        }
    }

    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GitversError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

impl From<HostingError> for GitversError {
    fn from(err: HostingError) -> Self {
        match err {
            HostingError::Unauthorized => {
                GitversError::Authentication("hosting service rejected the token".to_string())
            }
            other => GitversError::Hosting(other),
        }
    }
}

/// Result type for gitvers operations.
pub type Result<T> = std::result::Result<T, GitversError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vcs_process_error_names_step() {
        let err = GitversError::vcs(VcsStep::HardReset, "unknown revision");
        let msg = err.to_string();
        assert!(msg.contains("reset --hard"));
        assert!(msg.contains("unknown revision"));
    }

    #[test]
    fn unauthorized_hosting_maps_to_authentication() {
        let err: GitversError = HostingError::Unauthorized.into();
        assert!(matches!(err, GitversError::Authentication(_)));

        let err: GitversError = HostingError::Transport("timed out".to_string()).into();
        assert!(matches!(err, GitversError::Hosting(_)));
    }

    #[test]
    fn filesystem_error_names_path() {
        let err = GitversError::filesystem(
            "/tmp/site.bak",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/tmp/site.bak"));
    }
}
