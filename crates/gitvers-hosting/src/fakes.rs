//! In-memory hosting fake (testing only)
//!
//! `FakeHosting` keeps repositories and their commit lists in a map and
//! records every call, so callers can assert which remote operations ran.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::HostingError;
use crate::{HostingClient, Lookup, RemoteCommit, RepoInfo, Result};

/// Calls observed by [`FakeHosting`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostingCall {
    CurrentLogin,
    FindRepository(String),
    CreateRepository(String),
    ListCommits(String),
}

#[derive(Debug, Default)]
struct FakeState {
    repos: HashMap<String, (RepoInfo, Vec<RemoteCommit>)>,
    calls: Vec<HostingCall>,
    reject_credential: bool,
}

/// In-memory hosting service owned by a single login.
#[derive(Debug)]
pub struct FakeHosting {
    login: String,
    state: Mutex<FakeState>,
}

impl FakeHosting {
    pub fn new(login: &str) -> Self {
        Self {
            login: login.to_string(),
            state: Mutex::new(FakeState::default()),
        }
    }

    /// Pre-populate a repository with commits (newest first).
    pub fn with_repository(self, name: &str, commits: Vec<RemoteCommit>) -> Self {
        let info = self.repo_info(name);
        self.state
            .lock()
            .unwrap()
            .repos
            .insert(name.to_string(), (info, commits));
        self
    }

    /// Make every call fail with `HostingError::Unauthorized`.
    pub fn rejecting_credential(self) -> Self {
        self.state.lock().unwrap().reject_credential = true;
        self
    }

    pub fn calls(&self) -> Vec<HostingCall> {
        self.state.lock().unwrap().calls.clone()
    }

    fn repo_info(&self, name: &str) -> RepoInfo {
        RepoInfo {
            name: name.to_string(),
            full_name: format!("{}/{}", self.login, name),
            clone_url: format!("https://github.com/{}/{}.git", self.login, name),
            private: true,
        }
    }

    fn record(&self, call: HostingCall) -> std::result::Result<(), HostingError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.reject_credential {
            return Err(HostingError::Unauthorized);
        }
        Ok(())
    }
}

#[async_trait]
impl HostingClient for FakeHosting {
    async fn current_login(&self) -> Result<String> {
        self.record(HostingCall::CurrentLogin)?;
        Ok(self.login.clone())
    }

    async fn find_repository(&self, owner: &str, name: &str) -> Lookup<RepoInfo> {
        if let Err(e) = self.record(HostingCall::FindRepository(name.to_string())) {
            return Lookup::Error(e);
        }
        if owner != self.login {
            return Lookup::NotFound;
        }
        match self.state.lock().unwrap().repos.get(name) {
            Some((info, _)) => Lookup::Found(info.clone()),
            None => Lookup::NotFound,
        }
    }

    async fn create_repository(&self, name: &str) -> Result<RepoInfo> {
        self.record(HostingCall::CreateRepository(name.to_string()))?;
        let info = self.repo_info(name);
        let mut state = self.state.lock().unwrap();
        if state.repos.contains_key(name) {
            return Err(HostingError::Http {
                status: 422,
                body: "name already exists on this account".to_string(),
            });
        }
        state
            .repos
            .insert(name.to_string(), (info.clone(), Vec::new()));
        Ok(info)
    }

    async fn list_commits(&self, owner: &str, name: &str) -> Lookup<Vec<RemoteCommit>> {
        if let Err(e) = self.record(HostingCall::ListCommits(name.to_string())) {
            return Lookup::Error(e);
        }
        if owner != self.login {
            return Lookup::NotFound;
        }
        match self.state.lock().unwrap().repos.get(name) {
            Some((_, commits)) => Lookup::Found(commits.clone()),
            None => Lookup::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_find() {
        let hosting = FakeHosting::new("octo");
        assert!(!hosting.exists("octo", "site").await.unwrap());

        let info = hosting.create_repository("site").await.unwrap();
        assert_eq!(info.full_name, "octo/site");
        assert!(info.private);
        assert!(hosting.exists("octo", "site").await.unwrap());
    }

    #[tokio::test]
    async fn rejected_credential_surfaces_as_error() {
        let hosting = FakeHosting::new("octo").rejecting_credential();
        match hosting.find_repository("octo", "site").await {
            Lookup::Error(e) => assert!(e.is_authentication()),
            other => panic!("expected error, got {other:?}"),
        }
    }
}
