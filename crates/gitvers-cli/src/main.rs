//! gitvers - numbered versions for a directory of artifacts
//!
//! The `gitvers` command pushes a directory to a hosted git repository as
//! `Version 1`, `Version 2`, ... and rolls it back by number.
//!
//! ## Commands
//!
//! - `create`: Create the private hosted repository if it does not exist
//! - `clone`: Clone the latest version into a directory
//! - `push`: Commit the directory as the next version and push it
//! - `log`: Show version history (local, or remote when not cloned)
//! - `restore`: Reset the directory and the remote branch to a version

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gitvers_core::config::{DEFAULT_API_URL, DEFAULT_BRANCH, DEFAULT_HOST};
use gitvers_core::{
    clone_latest, ensure_remote_repository, list_history, resolve_owner, CloneOutcome,
    GitCli, GitHubClient, GitversConfig, PublishOutcome, PublishWorkflow, RemoteStatus,
    RestoreCoordinator,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "gitvers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Numbered versions on top of git and GitHub", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON log lines and JSON command output
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    repo: RepoArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Repository and credential settings.
#[derive(Args, Debug)]
struct RepoArgs {
    /// Hosting token (falls back to GITHUB_TOKEN)
    #[arg(long, global = true, env = "GITVERS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Repository name
    #[arg(long, global = true, env = "GITVERS_REPO")]
    repo: Option<String>,

    /// Repository owner (default: the token's login)
    #[arg(long, global = true, env = "GITVERS_OWNER")]
    owner: Option<String>,

    /// Web host used to build the clone URL
    #[arg(long, global = true, env = "GITVERS_HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// Hosting REST API base URL
    #[arg(long, global = true, env = "GITVERS_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Integration branch restored and force-pushed
    #[arg(long, global = true, env = "GITVERS_BRANCH", default_value = DEFAULT_BRANCH)]
    branch: String,

    /// Use this remote URL instead of {host}/{owner}/{repo}.git
    #[arg(long, global = true, env = "GITVERS_REMOTE_URL")]
    remote_url: Option<String>,

    /// Committer name
    #[arg(long, global = true, env = "GITVERS_GIT_NAME")]
    git_name: Option<String>,

    /// Committer email
    #[arg(long, global = true, env = "GITVERS_GIT_EMAIL")]
    git_email: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the private hosted repository if it does not exist
    Create,

    /// Clone the latest version into a directory that does not exist yet
    Clone {
        /// Target directory
        path: PathBuf,
    },

    /// Commit the directory as the next version and push it
    Push {
        /// Directory to publish
        path: PathBuf,

        /// Version message
        #[arg(short, long)]
        message: String,
    },

    /// Show version history
    Log {
        /// Working copy (remote history is shown when it is not cloned)
        path: PathBuf,
    },

    /// Reset the directory and the remote branch to a version
    Restore {
        /// Working copy to restore
        path: PathBuf,

        /// Version number or commit hash
        version: String,
    },
}

impl RepoArgs {
    fn into_config(self) -> Result<GitversConfig> {
        let token = match self.token {
            Some(token) => token,
            None => std::env::var("GITHUB_TOKEN")
                .context("No token given: pass --token or set GITVERS_TOKEN")?,
        };
        let repo = self
            .repo
            .context("No repository given: pass --repo or set GITVERS_REPO")?;

        let mut config = GitversConfig::new(&token, &repo)
            .with_host(&self.host)
            .with_api_url(&self.api_url)
            .with_branch(&self.branch);
        if let Some(owner) = self.owner {
            config = config.with_owner(&owner);
        }
        if let Some(url) = self.remote_url {
            config = config.with_remote_url(&url);
        }
        match (self.git_name, self.git_email) {
            (Some(name), Some(email)) => config = config.with_committer(&name, &email),
            (None, None) => {}
            _ => anyhow::bail!("--git-name and --git-email must be given together"),
        }
        Ok(config)
    }
}

impl Commands {
    /// Whether the command needs the repository owner, either to build the
    /// remote URL or to query the hosting service.
    fn needs_owner(&self, remote_override: bool) -> bool {
        match self {
            Commands::Create => true,
            Commands::Log { path } => !path.join(".git").exists(),
            Commands::Restore { path, .. } => !path.join(".git").exists() || !remote_override,
            Commands::Clone { .. } | Commands::Push { .. } => !remote_override,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    gitvers_core::init_tracing(cli.verbose, cli.json);

    let config = cli.repo.into_config()?;
    let hosting = GitHubClient::new(&config.api_url, config.token.expose())
        .context("Failed to create hosting client")?;
    let config = if cli.command.needs_owner(config.remote_override.is_some()) {
        resolve_owner(config, &hosting)
            .await
            .context("Failed to determine repository owner")?
    } else {
        config
    };
    let vcs = GitCli::from_config(&config);
    let ctx = Ctx {
        config: &config,
        vcs: &vcs,
        hosting: &hosting,
        json: cli.json,
    };

    match cli.command {
        Commands::Create => cmd_create(&ctx).await,
        Commands::Clone { path } => cmd_clone(&ctx, &path).await,
        Commands::Push { path, message } => cmd_push(&ctx, &path, &message).await,
        Commands::Log { path } => cmd_log(&ctx, &path).await,
        Commands::Restore { path, version } => cmd_restore(&ctx, &path, &version).await,
    }
}

/// Everything a command needs.
struct Ctx<'a> {
    config: &'a GitversConfig,
    vcs: &'a GitCli,
    hosting: &'a GitHubClient,
    json: bool,
}

impl Ctx<'_> {
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }
}

/// Create the hosted repository
async fn cmd_create(ctx: &Ctx<'_>) -> Result<()> {
    let status = ensure_remote_repository(ctx.config, ctx.hosting)
        .await
        .context("Failed to create repository")?;
    ctx.emit(&status, || match &status {
        RemoteStatus::AlreadyExists { url } => format!("Repository already exists: {url}"),
        RemoteStatus::Created { url } => format!("Created private repository: {url}"),
    })
}

/// Clone the latest version
async fn cmd_clone(ctx: &Ctx<'_>, path: &Path) -> Result<()> {
    let outcome = clone_latest(ctx.config, ctx.vcs, path)
        .await
        .context(format!("Failed to clone into {:?}", path))?;
    ctx.emit(&outcome, || match outcome {
        CloneOutcome::Cloned => format!("Cloned into {}", path.display()),
        CloneOutcome::AlreadyPresent => format!("{} already exists", path.display()),
    })
}

/// Publish the next version
async fn cmd_push(ctx: &Ctx<'_>, path: &Path, message: &str) -> Result<()> {
    let outcome = PublishWorkflow::new(ctx.config, ctx.vcs, ctx.hosting)
        .publish(path, message)
        .await
        .context(format!("Failed to publish {:?}", path))?;
    ctx.emit(&outcome, || match &outcome {
        PublishOutcome::Published { message, .. } => format!("Pushed: {message}"),
        PublishOutcome::NothingToCommit => "Nothing to commit".to_string(),
    })
}

/// Show history
async fn cmd_log(ctx: &Ctx<'_>, path: &Path) -> Result<()> {
    let listing = list_history(ctx.config, ctx.vcs, ctx.hosting, path)
        .await
        .context("Failed to read history")?;

    if ctx.json {
        println!("{}", serde_json::to_string(&listing)?);
    } else if listing.is_empty() {
        println!("No commits found");
    } else {
        print!("{listing}");
    }
    Ok(())
}

/// Restore a version
async fn cmd_restore(ctx: &Ctx<'_>, path: &Path, version: &str) -> Result<()> {
    let coordinator = RestoreCoordinator::new(ctx.config, ctx.vcs, ctx.hosting);
    match coordinator.restore(path, version).await {
        Ok(report) => ctx.emit(&report, || {
            format!(
                "Restored {} ({}) and force-pushed '{}'",
                version,
                report.commit(),
                report.branch
            )
        }),
        Err(failure) => {
            if let Some(backup) = &failure.effects.backup {
                eprintln!(
                    "Previous working copy kept at {}; move it back to recover",
                    backup.display()
                );
            }
            Err(failure).context(format!("Failed to restore {version}"))
        }
    }
}
