//! In-memory VCS fake (testing only)
//!
//! `FakeVcs` models a single remote plus the working copies cloned from it.
//! Commit history is kept in memory; the working-copy directories and their
//! `.git` markers are real, so backup handling can be observed on disk.
//! Every call is recorded so tests can assert which operations ran.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::RemoteUrl;
use crate::error::{GitversError, Result, VcsStep};
use crate::history::CommitRecord;
use crate::vcs::VcsClient;

/// Calls observed by [`FakeVcs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsCall {
    Clone { url: String, path: PathBuf },
    Init(PathBuf),
    StageAll(PathBuf),
    Commit(String),
    SetRemote { name: String, url: String },
    PushAll(String),
    CommitCount(PathBuf),
    Log(PathBuf),
    Checkout(String),
    CreateBranch(String),
    HardReset(String),
    ForcePush { url: String, branch: String },
}

impl VcsCall {
    /// Whether the call changes local or remote state.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, VcsCall::CommitCount(_) | VcsCall::Log(_))
    }
}

#[derive(Debug, Default)]
struct FakeState {
    /// Local history, newest first.
    local: Vec<CommitRecord>,
    /// Remote branch tips.
    remote_tips: HashMap<String, String>,
    /// Commits known to the remote, newest first.
    remote: Vec<CommitRecord>,
    branches: BTreeSet<String>,
    current_branch: Option<String>,
    pending_changes: bool,
    failing: Vec<VcsStep>,
    calls: Vec<VcsCall>,
    next_hash: u64,
}

/// In-memory stand-in for [`crate::vcs::git::GitCli`].
#[derive(Debug, Default)]
pub struct FakeVcs {
    state: Mutex<FakeState>,
}

impl FakeVcs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed local and remote history with `count` published versions
    /// on branch `master`. Returns the fake with history newest first.
    pub fn with_published_versions(self, count: u64) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for n in 1..=count {
                let hash = state.fresh_hash();
                let record = CommitRecord::new(hash, format!("Version {n}: change {n}"));
                state.local.insert(0, record.clone());
                state.remote.insert(0, record);
            }
            if let Some(tip) = state.local.first().map(|c| c.hash.clone()) {
                state.remote_tips.insert("master".to_string(), tip);
            }
            state.branches.insert("master".to_string());
            state.current_branch = Some("master".to_string());
        }
        self
    }

    /// Replace the history with explicit records (newest first).
    pub fn with_history(self, history: Vec<CommitRecord>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.local = history.clone();
            if let Some(tip) = history.first().map(|c| c.hash.clone()) {
                state.remote_tips.insert("master".to_string(), tip);
            }
            state.remote = history;
            state.branches.insert("master".to_string());
            state.current_branch = Some("master".to_string());
        }
        self
    }

    /// Whether the next `stage_all` finds something to stage.
    pub fn with_pending_changes(self, pending: bool) -> Self {
        self.state.lock().unwrap().pending_changes = pending;
        self
    }

    /// Make every invocation of `step` fail.
    pub fn failing_on(self, step: VcsStep) -> Self {
        self.state.lock().unwrap().failing.push(step);
        self
    }

    pub fn calls(&self) -> Vec<VcsCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn mutations(&self) -> Vec<VcsCall> {
        self.calls().into_iter().filter(VcsCall::is_mutation).collect()
    }

    pub fn local_history(&self) -> Vec<CommitRecord> {
        self.state.lock().unwrap().local.clone()
    }

    pub fn remote_history(&self) -> Vec<CommitRecord> {
        self.state.lock().unwrap().remote.clone()
    }

    pub fn remote_tip(&self, branch: &str) -> Option<String> {
        self.state.lock().unwrap().remote_tips.get(branch).cloned()
    }

    fn enter(&self, call: VcsCall, step: VcsStep) -> Result<std::sync::MutexGuard<'_, FakeState>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.failing.contains(&step) {
            return Err(GitversError::vcs(step, format!("injected {step} failure")));
        }
        Ok(state)
    }
}

impl FakeState {
    fn fresh_hash(&mut self) -> String {
        self.next_hash += 1;
        format!("c0ffee{:034x}", self.next_hash)
    }
}

#[async_trait]
impl VcsClient for FakeVcs {
    async fn clone_repo(&self, url: &RemoteUrl, path: &Path) -> Result<()> {
        {
            let mut state = self.enter(
                VcsCall::Clone {
                    url: url.plain().to_string(),
                    path: path.to_path_buf(),
                },
                VcsStep::Clone,
            )?;
            state.local = state.remote.clone();
            state.branches = state.remote_tips.keys().cloned().collect();
            state.current_branch = state.branches.iter().next().cloned();
        }
        std::fs::create_dir_all(path.join(".git"))
            .map_err(|e| GitversError::vcs(VcsStep::Clone, e.to_string()))
    }

    async fn init(&self, path: &Path) -> Result<()> {
        drop(self.enter(VcsCall::Init(path.to_path_buf()), VcsStep::Init)?);
        std::fs::create_dir_all(path.join(".git"))
            .map_err(|e| GitversError::vcs(VcsStep::Init, e.to_string()))
    }

    async fn is_tracked(&self, path: &Path) -> bool {
        path.join(".git").is_dir()
    }

    async fn stage_all(&self, path: &Path) -> Result<()> {
        drop(self.enter(VcsCall::StageAll(path.to_path_buf()), VcsStep::StageAll)?);
        Ok(())
    }

    async fn commit(&self, _path: &Path, message: &str) -> Result<()> {
        let mut state = self.enter(VcsCall::Commit(message.to_string()), VcsStep::Commit)?;
        if !state.pending_changes {
            return Err(GitversError::NothingToCommit);
        }
        state.pending_changes = false;
        let hash = state.fresh_hash();
        state.local.insert(0, CommitRecord::new(hash, message));
        if state.current_branch.is_none() {
            state.branches.insert("master".to_string());
            state.current_branch = Some("master".to_string());
        }
        Ok(())
    }

    async fn set_remote(&self, _path: &Path, name: &str, url: &str) -> Result<()> {
        drop(self.enter(
            VcsCall::SetRemote {
                name: name.to_string(),
                url: url.to_string(),
            },
            VcsStep::SetRemote,
        )?);
        Ok(())
    }

    async fn push_all(&self, _path: &Path, url: &RemoteUrl) -> Result<()> {
        let mut state = self.enter(VcsCall::PushAll(url.plain().to_string()), VcsStep::PushAll)?;
        for commit in state.local.clone().into_iter().rev() {
            if !state.remote.iter().any(|c| c.hash == commit.hash) {
                state.remote.insert(0, commit);
            }
        }
        if let (Some(branch), Some(tip)) = (
            state.current_branch.clone(),
            state.local.first().map(|c| c.hash.clone()),
        ) {
            state.remote_tips.insert(branch, tip);
        }
        Ok(())
    }

    async fn commit_count(&self, path: &Path) -> Result<u64> {
        let state = self.enter(VcsCall::CommitCount(path.to_path_buf()), VcsStep::CommitCount)?;
        if state.local.is_empty() {
            return Err(GitversError::vcs(
                VcsStep::CommitCount,
                "ambiguous argument 'HEAD': unknown revision",
            ));
        }
        Ok(state.local.len() as u64)
    }

    async fn log(&self, path: &Path) -> Result<Vec<CommitRecord>> {
        let state = self.enter(VcsCall::Log(path.to_path_buf()), VcsStep::Log)?;
        Ok(state.local.clone())
    }

    async fn checkout(&self, _path: &Path, reference: &str) -> Result<()> {
        let mut state = self.enter(VcsCall::Checkout(reference.to_string()), VcsStep::Checkout)?;
        if !state.branches.contains(reference) {
            return Err(GitversError::vcs(
                VcsStep::Checkout,
                format!("pathspec '{reference}' did not match any file(s) known to git"),
            ));
        }
        state.current_branch = Some(reference.to_string());
        Ok(())
    }

    async fn create_branch(&self, _path: &Path, name: &str) -> Result<()> {
        let mut state = self.enter(VcsCall::CreateBranch(name.to_string()), VcsStep::CreateBranch)?;
        if !state.branches.insert(name.to_string()) {
            return Err(GitversError::vcs(
                VcsStep::CreateBranch,
                format!("a branch named '{name}' already exists"),
            ));
        }
        state.current_branch = Some(name.to_string());
        Ok(())
    }

    async fn hard_reset(&self, _path: &Path, reference: &str) -> Result<()> {
        let mut state = self.enter(VcsCall::HardReset(reference.to_string()), VcsStep::HardReset)?;
        let Some(pos) = state.local.iter().position(|c| c.hash == reference) else {
            return Err(GitversError::vcs(
                VcsStep::HardReset,
                format!("ambiguous argument '{reference}': unknown revision"),
            ));
        };
        state.local = state.local.split_off(pos);
        Ok(())
    }

    async fn force_push(&self, _path: &Path, url: &RemoteUrl, branch: &str) -> Result<()> {
        let mut state = self.enter(
            VcsCall::ForcePush {
                url: url.plain().to_string(),
                branch: branch.to_string(),
            },
            VcsStep::ForcePush,
        )?;
        if let Some(tip) = state.local.first().map(|c| c.hash.clone()) {
            state.remote_tips.insert(branch.to_string(), tip);
        }
        Ok(())
    }
}
