//! Submodule status inspection
//!
//! Classifies one submodule against its remote. Failures early in the
//! pipeline (missing directory, unresolvable HEAD, failed fetch) produce a
//! terminal state; failures late in the pipeline (default branch, remote tip)
//! degrade to a conservative answer and are flagged as such on the status.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::git::VersionControlClient;

/// Branch assumed when the remote's default branch cannot be resolved
pub const FALLBACK_BRANCH: &str = "main";

/// Synchronization state of a submodule relative to its remote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmoduleState {
    /// Working directory does not exist
    Missing,
    /// Current commit could not be resolved
    Error,
    /// Remote refresh failed; only the current commit is known
    FetchFailed,
    UpToDate,
    NeedsUpdate,
}

impl SubmoduleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmoduleState::Missing => "missing",
            SubmoduleState::Error => "error",
            SubmoduleState::FetchFailed => "fetch-failed",
            SubmoduleState::UpToDate => "up-to-date",
            SubmoduleState::NeedsUpdate => "needs-update",
        }
    }
}

impl fmt::Display for SubmoduleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compare the checked-out commit with the remote tip
pub fn classify(current_commit: &str, latest_commit: &str) -> SubmoduleState {
    if current_commit == latest_commit {
        SubmoduleState::UpToDate
    } else {
        SubmoduleState::NeedsUpdate
    }
}

/// Result of inspecting one submodule; computed fresh on every call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmoduleStatus {
    pub state: SubmoduleState,
    pub current_commit: String,
    pub latest_commit: String,
    pub default_branch: String,
    /// The default branch is [`FALLBACK_BRANCH`], not what the remote reported
    pub branch_guessed: bool,
    /// The remote tip could not be resolved and was taken to be the current commit
    pub tip_assumed: bool,
}

impl SubmoduleStatus {
    fn terminal(state: SubmoduleState, current_commit: String) -> Self {
        Self {
            state,
            current_commit,
            latest_commit: String::new(),
            default_branch: String::new(),
            branch_guessed: false,
            tip_assumed: false,
        }
    }

    pub fn missing() -> Self {
        Self::terminal(SubmoduleState::Missing, String::new())
    }

    pub fn error() -> Self {
        Self::terminal(SubmoduleState::Error, String::new())
    }

    pub fn fetch_failed(current_commit: impl Into<String>) -> Self {
        Self::terminal(SubmoduleState::FetchFailed, current_commit.into())
    }

    /// Up to date only because the remote tip was unknown
    pub fn is_degraded(&self) -> bool {
        self.tip_assumed
    }

    pub fn short_current(&self) -> &str {
        short_sha(&self.current_commit)
    }

    pub fn short_latest(&self) -> &str {
        short_sha(&self.latest_commit)
    }
}

pub(crate) fn short_sha(sha: &str) -> &str {
    sha.get(..8).unwrap_or(sha)
}

/// Determines the synchronization state of submodules under one repository root
#[derive(Clone)]
pub struct StatusInspector {
    vcs: Arc<dyn VersionControlClient>,
    repo_root: PathBuf,
    fallback_branch: String,
}

impl StatusInspector {
    pub fn new(vcs: Arc<dyn VersionControlClient>, repo_root: impl Into<PathBuf>) -> Self {
        Self {
            vcs,
            repo_root: repo_root.into(),
            fallback_branch: FALLBACK_BRANCH.to_string(),
        }
    }

    pub fn with_fallback_branch(mut self, branch: impl Into<String>) -> Self {
        self.fallback_branch = branch.into();
        self
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Inspect the submodule at `submodule_path` (relative to the repository root)
    pub async fn inspect(&self, submodule_path: &str) -> SubmoduleStatus {
        let dir = self.repo_root.join(submodule_path);

        if !dir.exists() {
            debug!("{} does not exist", dir.display());
            return SubmoduleStatus::missing();
        }

        let current_commit = match self.vcs.resolve_head(&dir).await {
            Ok(commit) => commit,
            Err(e) => {
                warn!("Cannot resolve current commit of {}: {}", submodule_path, e);
                return SubmoduleStatus::error();
            }
        };

        if let Err(e) = self.vcs.fetch(&dir).await {
            warn!("Failed to fetch latest changes for {}: {}", submodule_path, e);
            return SubmoduleStatus::fetch_failed(current_commit);
        }

        let (default_branch, branch_guessed) = match self.vcs.resolve_default_branch(&dir).await {
            Ok(branch) => (branch, false),
            Err(e) => {
                warn!(
                    "Cannot resolve default branch of {} ({}), assuming {}",
                    submodule_path, e, self.fallback_branch
                );
                (self.fallback_branch.clone(), true)
            }
        };

        let (latest_commit, tip_assumed) =
            match self.vcs.resolve_remote_tip(&dir, &default_branch).await {
                Ok(commit) => (commit, false),
                Err(e) => {
                    warn!(
                        "Cannot resolve remote tip of {} for {} ({}), treating it as up to date",
                        default_branch, submodule_path, e
                    );
                    (current_commit.clone(), true)
                }
            };

        let state = classify(&current_commit, &latest_commit);
        debug!(
            "{}: {} (current {}, latest {} on {})",
            submodule_path,
            state,
            short_sha(&current_commit),
            short_sha(&latest_commit),
            default_branch
        );

        SubmoduleStatus {
            state,
            current_commit,
            latest_commit,
            default_branch,
            branch_guessed,
            tip_assumed,
        }
    }

    /// Check whether a submodule now sits at the tip recorded in `status`
    ///
    /// Resolves HEAD only; no second fetch is made.
    pub async fn confirm(&self, submodule_path: &str, status: &SubmoduleStatus) -> SubmoduleState {
        let dir = self.repo_root.join(submodule_path);
        if !dir.exists() {
            return SubmoduleState::Missing;
        }
        match self.vcs.resolve_head(&dir).await {
            Ok(head) => classify(&head, &status.latest_commit),
            Err(e) => {
                warn!("Cannot resolve current commit of {}: {}", submodule_path, e);
                SubmoduleState::Error
            }
        }
    }
}
