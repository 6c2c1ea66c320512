//! GitHub REST client
//!
//! Talks to the v3 REST API with a bearer token. Only the handful of
//! endpoints gitvers needs are covered.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::HostingError;
use crate::{HostingClient, Lookup, RemoteCommit, RepoInfo, Result};

/// Default REST base URL
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Page size used when listing commits
const PER_PAGE: usize = 100;

/// GitHub client for repository and commit queries
pub struct GitHubClient {
    api_url: String,
    token: String,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.api_url)
            .field("token", &"***")
            .finish()
    }
}

#[derive(Deserialize)]
struct UserResponse {
    login: String,
}

#[derive(Deserialize)]
struct CommitResponse {
    sha: String,
    commit: CommitDetail,
}

#[derive(Deserialize)]
struct CommitDetail {
    message: String,
    committer: Option<CommitSignature>,
}

#[derive(Deserialize)]
struct CommitSignature {
    date: Option<DateTime<Utc>>,
}

impl From<CommitResponse> for RemoteCommit {
    fn from(c: CommitResponse) -> Self {
        RemoteCommit {
            sha: c.sha,
            message: c.commit.message,
            committed_at: c.commit.committer.and_then(|s| s.date),
        }
    }
}

impl GitHubClient {
    /// Create a new client against `api_url` (no trailing slash needed).
    pub fn new(api_url: &str, token: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("gitvers/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(GitHubClient {
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            http_client,
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http_client
            .get(format!("{}{}", self.api_url, path))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
    }

    /// Turn a non-success response into an error.
    async fn error_for(response: Response) -> HostingError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED => HostingError::Unauthorized,
            StatusCode::FORBIDDEN => HostingError::Forbidden(body),
            _ => HostingError::Http {
                status: status.as_u16(),
                body,
            },
        }
    }

    async fn fetch_commit_page(&self, owner: &str, name: &str, page: usize) -> Lookup<Vec<RemoteCommit>> {
        let response = match self
            .get(&format!("/repos/{owner}/{name}/commits"))
            .query(&[("per_page", PER_PAGE), ("page", page)])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return Lookup::Error(e.into()),
        };

        match response.status() {
            StatusCode::NOT_FOUND => Lookup::NotFound,
            // An empty repository answers 409 "Git Repository is empty."
            StatusCode::CONFLICT => Lookup::Found(Vec::new()),
            s if s.is_success() => match response.json::<Vec<CommitResponse>>().await {
                Ok(commits) => Lookup::Found(commits.into_iter().map(Into::into).collect()),
                Err(e) => Lookup::Error(e.into()),
            },
            _ => Lookup::Error(Self::error_for(response).await),
        }
    }
}

#[async_trait]
impl HostingClient for GitHubClient {
    async fn current_login(&self) -> Result<String> {
        let response = self.get("/user").send().await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }
        let user: UserResponse = response.json().await?;
        debug!(login = %user.login, "Resolved authenticated login");
        Ok(user.login)
    }

    async fn find_repository(&self, owner: &str, name: &str) -> Lookup<RepoInfo> {
        let response = match self.get(&format!("/repos/{owner}/{name}")).send().await {
            Ok(r) => r,
            Err(e) => return Lookup::Error(e.into()),
        };

        match response.status() {
            StatusCode::NOT_FOUND => Lookup::NotFound,
            s if s.is_success() => match response.json::<RepoInfo>().await {
                Ok(repo) => Lookup::Found(repo),
                Err(e) => Lookup::Error(e.into()),
            },
            _ => Lookup::Error(Self::error_for(response).await),
        }
    }

    async fn create_repository(&self, name: &str) -> Result<RepoInfo> {
        let response = self
            .http_client
            .post(format!("{}/user/repos", self.api_url))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .json(&serde_json::json!({ "name": name, "private": true }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }
        let repo: RepoInfo = response.json().await?;
        info!(repo = %repo.full_name, "Created private repository");
        Ok(repo)
    }

    async fn list_commits(&self, owner: &str, name: &str) -> Lookup<Vec<RemoteCommit>> {
        let mut all = Vec::new();
        let mut page = 1;
        loop {
            match self.fetch_commit_page(owner, name, page).await {
                Lookup::Found(batch) => {
                    let last = batch.len() < PER_PAGE;
                    all.extend(batch);
                    if last {
                        break;
                    }
                    page += 1;
                }
                Lookup::NotFound if page == 1 => return Lookup::NotFound,
                Lookup::NotFound => break,
                Lookup::Error(e) => return Lookup::Error(e),
            }
        }
        debug!(owner, name, count = all.len(), "Listed remote commits");
        Lookup::Found(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_token() {
        let client = GitHubClient::new("https://api.example.com/", "ghp_secret").unwrap();
        let rendered = format!("{:?}", client);
        assert!(!rendered.contains("ghp_secret"));
        assert!(rendered.contains("https://api.example.com"));
    }

    #[test]
    fn commit_response_maps_to_remote_commit() {
        let raw = r#"{
            "sha": "abc1234def5678abc1234def5678abc1234def56",
            "commit": {
                "message": "Version 2: docs",
                "committer": { "date": "2024-01-01T00:00:00Z" }
            }
        }"#;
        let parsed: CommitResponse = serde_json::from_str(raw).unwrap();
        let commit: RemoteCommit = parsed.into();
        assert_eq!(commit.message, "Version 2: docs");
        assert!(commit.committed_at.is_some());
    }
}
