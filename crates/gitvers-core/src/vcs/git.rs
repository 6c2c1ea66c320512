//! `git` command-line implementation of [`VcsClient`].

use std::path::Path;
use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::VcsClient;
use crate::config::{GitversConfig, Identity, RemoteUrl};
use crate::error::{GitversError, Result, VcsStep};
use crate::history::{CommitRecord, DelimitedLogDecoder, HistoryDecoder};

/// Phrases git prints when a commit has nothing staged.
const NOTHING_TO_COMMIT: &[&str] = &[
    "nothing to commit",
    "nothing added to commit",
    "no changes added to commit",
];

/// Phrases git prints when the remote rejects the credential.
const AUTH_FAILURE: &[&str] = &[
    "Authentication failed",
    "could not read Username",
    "could not read Password",
    "Invalid username or password",
    "terminal prompts disabled",
    "The requested URL returned error: 401",
    "The requested URL returned error: 403",
];

/// Runs the `git` binary as a child process.
pub struct GitCli {
    committer: Option<Identity>,
    decoder: Box<dyn HistoryDecoder>,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCli {
    pub fn new() -> Self {
        GitCli {
            committer: None,
            decoder: Box::new(DelimitedLogDecoder),
        }
    }

    /// Client using the committer identity from `config`.
    pub fn from_config(config: &GitversConfig) -> Self {
        GitCli {
            committer: config.committer.clone(),
            ..Self::new()
        }
    }

    pub fn with_committer(mut self, identity: Identity) -> Self {
        self.committer = Some(identity);
        self
    }

    pub fn with_decoder(mut self, decoder: impl HistoryDecoder + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    /// Run git and hand back the raw output, failing only if it could not
    /// be spawned.
    async fn output(&self, step: VcsStep, dir: Option<&Path>, args: &[&str]) -> Result<Output> {
        let mut cmd = Command::new("git");
        // Failures are classified by message text, so git must speak English.
        cmd.args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("LC_ALL", "C")
            .env("LANGUAGE", "C");
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        debug!(%step, "Running git");
        cmd.output()
            .await
            .map_err(|e| GitversError::vcs(step, format!("failed to run git: {e}")))
    }

    /// Run git and fail on a non-zero exit, scrubbing the diagnostic with
    /// `remote` when the command carried a credential.
    async fn run(
        &self,
        step: VcsStep,
        dir: Option<&Path>,
        args: &[&str],
        remote: Option<&RemoteUrl>,
    ) -> Result<String> {
        let output = self.output(step, dir, args).await?;
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }
        Err(classify_failure(step, &output, remote))
    }
}

/// Map a failed git invocation to an error, never leaking the credential.
fn classify_failure(step: VcsStep, output: &Output, remote: Option<&RemoteUrl>) -> GitversError {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let raw = if stderr.trim().is_empty() {
        stdout.trim()
    } else {
        stderr.trim()
    };
    let diagnostic = match remote {
        Some(remote) => remote.redact(raw),
        None => raw.to_string(),
    };

    if AUTH_FAILURE.iter().any(|p| diagnostic.contains(p)) {
        return GitversError::Authentication(diagnostic);
    }
    GitversError::vcs(step, diagnostic)
}

fn path_arg(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| {
        GitversError::Config(format!("path is not valid UTF-8: {}", path.display()))
    })
}

#[async_trait]
impl VcsClient for GitCli {
    async fn clone_repo(&self, url: &RemoteUrl, path: &Path) -> Result<()> {
        info!(remote = %url, path = %path.display(), "Cloning repository");
        let auth = url.authenticated();
        self.run(
            VcsStep::Clone,
            None,
            &["clone", auth.as_str(), path_arg(path)?],
            Some(url),
        )
        .await?;
        // Keep the token out of .git/config.
        if auth != url.plain() {
            self.run(
                VcsStep::SetRemote,
                Some(path),
                &["remote", "set-url", "origin", url.plain()],
                Some(url),
            )
            .await?;
        }
        Ok(())
    }

    async fn init(&self, path: &Path) -> Result<()> {
        if self.is_tracked(path).await {
            debug!(path = %path.display(), "Repository already initialised");
            return Ok(());
        }
        self.run(VcsStep::Init, Some(path), &["init"], None).await?;
        info!(path = %path.display(), "Initialised repository");
        Ok(())
    }

    async fn is_tracked(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path.join(".git"))
            .await
            .unwrap_or(false)
    }

    async fn stage_all(&self, path: &Path) -> Result<()> {
        self.run(VcsStep::StageAll, Some(path), &["add", "."], None)
            .await
            .map(|_| ())
    }

    async fn commit(&self, path: &Path, message: &str) -> Result<()> {
        let mut args: Vec<String> = Vec::new();
        if let Some(identity) = &self.committer {
            args.push("-c".to_string());
            args.push(format!("user.name={}", identity.name));
            args.push("-c".to_string());
            args.push(format!("user.email={}", identity.email));
        }
        args.extend(["commit".to_string(), "-m".to_string(), message.to_string()]);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        let output = self.output(VcsStep::Commit, Some(path), &args).await?;
        if output.status.success() {
            return Ok(());
        }
        let combined = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        if NOTHING_TO_COMMIT.iter().any(|p| combined.contains(p)) {
            return Err(GitversError::NothingToCommit);
        }
        Err(classify_failure(VcsStep::Commit, &output, None))
    }

    async fn set_remote(&self, path: &Path, name: &str, url: &str) -> Result<()> {
        // Removing a remote that does not exist fails; that is fine.
        let _ = self
            .output(VcsStep::SetRemote, Some(path), &["remote", "remove", name])
            .await?;
        self.run(
            VcsStep::SetRemote,
            Some(path),
            &["remote", "add", name, url],
            None,
        )
        .await
        .map(|_| ())
    }

    async fn push_all(&self, path: &Path, url: &RemoteUrl) -> Result<()> {
        let auth = url.authenticated();
        self.run(
            VcsStep::PushAll,
            Some(path),
            &["push", auth.as_str(), "--all"],
            Some(url),
        )
        .await
        .map(|_| ())
    }

    async fn commit_count(&self, path: &Path) -> Result<u64> {
        let out = self
            .run(
                VcsStep::CommitCount,
                Some(path),
                &["rev-list", "--count", "HEAD"],
                None,
            )
            .await?;
        out.trim().parse::<u64>().map_err(|e| {
            GitversError::vcs(
                VcsStep::CommitCount,
                format!("unexpected output {:?}: {e}", out.trim()),
            )
        })
    }

    async fn log(&self, path: &Path) -> Result<Vec<CommitRecord>> {
        let format = format!("--pretty=format:{}", self.decoder.pretty_format());
        let output = self
            .output(VcsStep::Log, Some(path), &["log", format.as_str()])
            .await?;
        if output.status.success() {
            return Ok(self
                .decoder
                .decode(&String::from_utf8_lossy(&output.stdout)));
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("does not have any commits yet") {
            return Ok(Vec::new());
        }
        Err(classify_failure(VcsStep::Log, &output, None))
    }

    async fn checkout(&self, path: &Path, reference: &str) -> Result<()> {
        self.run(VcsStep::Checkout, Some(path), &["checkout", reference], None)
            .await?;
        info!(reference, "Checked out");
        Ok(())
    }

    async fn create_branch(&self, path: &Path, name: &str) -> Result<()> {
        self.run(
            VcsStep::CreateBranch,
            Some(path),
            &["checkout", "-b", name],
            None,
        )
        .await?;
        info!(branch = name, "Created and checked out branch");
        Ok(())
    }

    async fn hard_reset(&self, path: &Path, reference: &str) -> Result<()> {
        self.run(
            VcsStep::HardReset,
            Some(path),
            &["reset", "--hard", reference],
            None,
        )
        .await?;
        info!(reference, "Branch hard-reset");
        Ok(())
    }

    async fn force_push(&self, path: &Path, url: &RemoteUrl, branch: &str) -> Result<()> {
        let auth = url.authenticated();
        self.run(
            VcsStep::ForcePush,
            Some(path),
            &["push", auth.as_str(), branch, "--force"],
            Some(url),
        )
        .await?;
        info!(branch, remote = %url, "Force-pushed branch");
        Ok(())
    }
}
