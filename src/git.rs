use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use crate::error::{Result, SyncError};
use crate::runner::ProcessRunner;

/// The version-control operations submodule synchronization relies on
///
/// The orchestration logic only ever talks to this trait, so it can be driven
/// by [`GitClient`] in production and by a fake in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VersionControlClient: Send + Sync {
    /// Commit currently checked out in `dir`
    async fn resolve_head(&self, dir: &Path) -> Result<String>;

    /// Refresh remote-tracking refs
    async fn fetch(&self, dir: &Path) -> Result<()>;

    /// Branch the remote designates as its default, via its symbolic HEAD
    async fn resolve_default_branch(&self, dir: &Path) -> Result<String>;

    /// Commit at the tip of the remote-tracking `branch`
    async fn resolve_remote_tip(&self, dir: &Path, branch: &str) -> Result<String>;

    async fn checkout(&self, dir: &Path, branch: &str) -> Result<()>;

    async fn pull(&self, dir: &Path, branch: &str) -> Result<()>;

    async fn stage_all(&self, dir: &Path) -> Result<()>;

    async fn commit(&self, dir: &Path, message: &str) -> Result<()>;

    async fn push(&self, dir: &Path, branch: &str) -> Result<()>;

    /// Initialize and update every submodule, recursively
    async fn init_submodules_recursive(&self, dir: &Path) -> Result<()>;
}

/// [`VersionControlClient`] backed by the system `git` binary
#[derive(Debug, Clone)]
pub struct GitClient {
    runner: ProcessRunner,
    binary: String,
    remote: String,
}

impl GitClient {
    pub fn new(runner: ProcessRunner) -> Self {
        Self {
            runner,
            binary: "git".to_string(),
            remote: "origin".to_string(),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    async fn git(&self, dir: &Path, args: &[&str]) -> Result<String> {
        let mut command = Vec::with_capacity(args.len() + 1);
        command.push(self.binary.as_str());
        command.extend_from_slice(args);
        self.runner.run_checked(&command, dir).await
    }

    fn remote_branch(&self, branch: &str) -> String {
        format!("{}/{}", self.remote, branch)
    }
}

/// Strip `refs/remotes/<remote>/` from a symbolic ref target
pub(crate) fn branch_from_symbolic_ref(symbolic_ref: &str, remote: &str) -> Option<String> {
    let symbolic_ref = symbolic_ref.trim();
    let prefix = format!("refs/remotes/{}/", remote);
    let branch = match symbolic_ref.strip_prefix(&prefix) {
        Some(branch) => branch,
        None => symbolic_ref.rsplit('/').next()?,
    };
    if branch.is_empty() {
        None
    } else {
        Some(branch.to_string())
    }
}

#[async_trait]
impl VersionControlClient for GitClient {
    async fn resolve_head(&self, dir: &Path) -> Result<String> {
        self.git(dir, &["rev-parse", "HEAD"]).await
    }

    async fn fetch(&self, dir: &Path) -> Result<()> {
        self.git(dir, &["fetch", self.remote.as_str()]).await.map(|_| ())
    }

    async fn resolve_default_branch(&self, dir: &Path) -> Result<String> {
        let head_ref = format!("refs/remotes/{}/HEAD", self.remote);
        let target = self.git(dir, &["symbolic-ref", head_ref.as_str()]).await?;
        debug!("{} points at {}", head_ref, target);

        branch_from_symbolic_ref(&target, &self.remote).ok_or_else(|| {
            SyncError::UnresolvableStatus {
                path: dir.to_path_buf(),
                reason: format!("unexpected symbolic ref target: {}", target),
            }
        })
    }

    async fn resolve_remote_tip(&self, dir: &Path, branch: &str) -> Result<String> {
        let remote_branch = self.remote_branch(branch);
        self.git(dir, &["rev-parse", remote_branch.as_str()]).await
    }

    async fn checkout(&self, dir: &Path, branch: &str) -> Result<()> {
        self.git(dir, &["checkout", branch]).await.map(|_| ())
    }

    async fn pull(&self, dir: &Path, branch: &str) -> Result<()> {
        self.git(dir, &["pull", self.remote.as_str(), branch]).await.map(|_| ())
    }

    async fn stage_all(&self, dir: &Path) -> Result<()> {
        self.git(dir, &["add", "."]).await.map(|_| ())
    }

    async fn commit(&self, dir: &Path, message: &str) -> Result<()> {
        self.git(dir, &["commit", "-m", message]).await.map(|_| ())
    }

    async fn push(&self, dir: &Path, branch: &str) -> Result<()> {
        self.git(dir, &["push", self.remote.as_str(), branch]).await.map(|_| ())
    }

    async fn init_submodules_recursive(&self, dir: &Path) -> Result<()> {
        self.git(dir, &["submodule", "update", "--init", "--recursive"])
            .await
            .map(|_| ())
    }
}
