//! Immutable configuration shared by every gitvers component.

use std::fmt;

use crate::error::{GitversError, Result};

/// Default web host used to build clone URLs.
pub const DEFAULT_HOST: &str = "https://github.com";
/// Default hosting REST base URL.
pub const DEFAULT_API_URL: &str = gitvers_hosting::github::DEFAULT_API_URL;
/// Default integration branch restored and force-pushed.
pub const DEFAULT_BRANCH: &str = "master";
/// Default suffix of the backup sibling.
pub const DEFAULT_BACKUP_SUFFIX: &str = ".bak";
/// Default remote name.
pub const DEFAULT_REMOTE: &str = "origin";

/// Credential that never renders itself.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    /// The raw value. Only hand this to code that talks to the remote.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Replace every occurrence of the secret in `text` with `***`.
    pub fn redact(&self, text: &str) -> String {
        if self.0.is_empty() {
            return text.to_string();
        }
        text.replace(&self.0, "***")
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Committer identity passed to `git commit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

/// A remote URL together with the credential used to reach it.
///
/// `Display` shows the plain URL; [`RemoteUrl::authenticated`] embeds the
/// token into `https://` URLs and must only be handed to `git`.
#[derive(Debug, Clone)]
pub struct RemoteUrl {
    plain: String,
    token: Secret,
}

impl RemoteUrl {
    pub fn new(plain: impl Into<String>, token: Secret) -> Self {
        RemoteUrl {
            plain: plain.into(),
            token,
        }
    }

    pub fn plain(&self) -> &str {
        &self.plain
    }

    /// `https://host/...` becomes `https://{token}@host/...`; any other
    /// scheme is returned as is.
    pub fn authenticated(&self) -> String {
        match self.plain.strip_prefix("https://") {
            Some(rest) if !self.token.expose().is_empty() => {
                format!("https://{}@{}", self.token.expose(), rest)
            }
            _ => self.plain.clone(),
        }
    }

    /// Scrub the credential out of text captured from a child process.
    pub fn redact(&self, text: &str) -> String {
        self.token.redact(text)
    }
}

impl fmt::Display for RemoteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.plain)
    }
}

/// gitvers configuration.
///
/// Built once, then passed by reference to each component.
#[derive(Debug, Clone)]
pub struct GitversConfig {
    /// Hosting credential
    pub token: Secret,
    /// Repository name on the hosting service
    pub repo_name: String,
    /// Repository owner; resolved from the credential when `None`
    pub owner: Option<String>,
    /// Web host used for clone URLs
    pub host: String,
    /// Hosting REST base URL
    pub api_url: String,
    /// Integration branch
    pub branch: String,
    /// Suffix appended to the working copy path for backups
    pub backup_suffix: String,
    /// Remote name re-pointed on publish
    pub remote_name: String,
    /// Optional committer identity
    pub committer: Option<Identity>,
    /// Explicit remote URL, bypassing `host`/`owner`/`repo_name`
    pub remote_override: Option<String>,
}

impl GitversConfig {
    /// Create a config for `repo_name` with default settings.
    pub fn new(token: &str, repo_name: &str) -> Self {
        GitversConfig {
            token: Secret::new(token),
            repo_name: repo_name.to_string(),
            owner: None,
            host: DEFAULT_HOST.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            remote_name: DEFAULT_REMOTE.to_string(),
            committer: None,
            remote_override: None,
        }
    }

    /// Read configuration from environment variables.
    ///
    /// `GITVERS_TOKEN` (or `GITHUB_TOKEN`) and `GITVERS_REPO` are required.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("GITVERS_TOKEN")
            .or_else(|_| std::env::var("GITHUB_TOKEN"))
            .map_err(|_| GitversError::Config("GITVERS_TOKEN is not set".to_string()))?;
        let repo = std::env::var("GITVERS_REPO")
            .map_err(|_| GitversError::Config("GITVERS_REPO is not set".to_string()))?;

        let mut config = GitversConfig::new(&token, &repo);
        if let Ok(owner) = std::env::var("GITVERS_OWNER") {
            config = config.with_owner(&owner);
        }
        if let Ok(host) = std::env::var("GITVERS_HOST") {
            config = config.with_host(&host);
        }
        if let Ok(api_url) = std::env::var("GITVERS_API_URL") {
            config = config.with_api_url(&api_url);
        }
        if let Ok(branch) = std::env::var("GITVERS_BRANCH") {
            config = config.with_branch(&branch);
        }
        if let (Ok(name), Ok(email)) = (
            std::env::var("GITVERS_GIT_NAME"),
            std::env::var("GITVERS_GIT_EMAIL"),
        ) {
            config = config.with_committer(&name, &email);
        }
        Ok(config)
    }

    pub fn with_owner(mut self, owner: &str) -> Self {
        self.owner = Some(owner.to_string());
        self
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.to_string();
        self
    }

    pub fn with_branch(mut self, branch: &str) -> Self {
        self.branch = branch.to_string();
        self
    }

    pub fn with_backup_suffix(mut self, suffix: &str) -> Self {
        self.backup_suffix = suffix.to_string();
        self
    }

    pub fn with_committer(mut self, name: &str, email: &str) -> Self {
        self.committer = Some(Identity {
            name: name.to_string(),
            email: email.to_string(),
        });
        self
    }

    /// Use `url` as the remote verbatim (e.g. a local bare repository).
    pub fn with_remote_url(mut self, url: &str) -> Self {
        self.remote_override = Some(url.to_string());
        self
    }

    /// `{host}/{owner}/{repo_name}.git`, or the explicit override.
    pub fn repo_url(&self) -> Result<String> {
        if let Some(url) = &self.remote_override {
            return Ok(url.clone());
        }
        let owner = self.owner.as_deref().ok_or_else(|| {
            GitversError::Config("repository owner is not known".to_string())
        })?;
        Ok(format!("{}/{}/{}.git", self.host, owner, self.repo_name))
    }

    pub fn remote_url(&self) -> Result<RemoteUrl> {
        Ok(RemoteUrl::new(self.repo_url()?, self.token.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authenticated_url_embeds_token() {
        let url = RemoteUrl::new("https://github.com/octo/site.git", Secret::new("tok"));
        assert_eq!(url.authenticated(), "https://tok@github.com/octo/site.git");
        assert_eq!(url.to_string(), "https://github.com/octo/site.git");
    }

    #[test]
    fn non_https_url_is_untouched() {
        let url = RemoteUrl::new("/srv/git/site.git", Secret::new("tok"));
        assert_eq!(url.authenticated(), "/srv/git/site.git");
    }

    #[test]
    fn redact_scrubs_token() {
        let url = RemoteUrl::new("https://github.com/octo/site.git", Secret::new("tok123"));
        let stderr = "fatal: unable to access 'https://tok123@github.com/octo/site.git/'";
        let scrubbed = url.redact(stderr);
        assert!(!scrubbed.contains("tok123"));
        assert!(scrubbed.contains("https://***@github.com"));
    }

    #[test]
    fn secret_debug_and_display_hide_value() {
        let secret = Secret::new("ghp_abc");
        assert_eq!(format!("{secret}"), "***");
        assert!(!format!("{secret:?}").contains("ghp_abc"));

        let config = GitversConfig::new("ghp_abc", "site");
        assert!(!format!("{config:?}").contains("ghp_abc"));
    }

    #[test]
    fn repo_url_needs_owner() {
        let config = GitversConfig::new("tok", "site");
        assert!(config.repo_url().is_err());

        let config = config.with_owner("octo");
        assert_eq!(config.repo_url().unwrap(), "https://github.com/octo/site.git");
    }

    #[test]
    fn remote_override_wins() {
        let config = GitversConfig::new("tok", "site").with_remote_url("/tmp/remote.git");
        assert_eq!(config.repo_url().unwrap(), "/tmp/remote.git");
    }
}
