//! Recording submodule updates in the parent repository

use chrono::{DateTime, Local};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use crate::git::VersionControlClient;

/// Branch pushed to the remote when publishing
pub const DEFAULT_PUSH_BRANCH: &str = "main";

/// Build the commit message listing every updated submodule
pub fn commit_message(updated: &[String], timestamp: DateTime<Local>) -> String {
    let bullets = updated
        .iter()
        .map(|name| format!("• {}", name))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "🔄 Update submodules\n\nUpdated submodules:\n{}\n\nAuto-updated on {}",
        bullets,
        timestamp.format("%Y-%m-%d %H:%M:%S %Z")
    )
}

/// Commits and pushes the aggregated result of a run
#[derive(Clone)]
pub struct ChangePublisher {
    vcs: Arc<dyn VersionControlClient>,
    repo_root: PathBuf,
    push_branch: String,
}

impl ChangePublisher {
    pub fn new(vcs: Arc<dyn VersionControlClient>, repo_root: impl Into<PathBuf>) -> Self {
        Self {
            vcs,
            repo_root: repo_root.into(),
            push_branch: DEFAULT_PUSH_BRANCH.to_string(),
        }
    }

    pub fn with_push_branch(mut self, branch: impl Into<String>) -> Self {
        self.push_branch = branch.into();
        self
    }

    /// Stage everything and commit one change naming `updated`
    ///
    /// An empty list is a successful no-op.
    pub async fn commit(&self, updated: &[String]) -> bool {
        if updated.is_empty() {
            info!("No submodules were updated, nothing to commit");
            return true;
        }

        if let Err(e) = self.vcs.stage_all(&self.repo_root).await {
            error!("Failed to add changes: {}", e.detail());
            return false;
        }

        let message = commit_message(updated, Local::now());
        if let Err(e) = self.vcs.commit(&self.repo_root, &message).await {
            error!("Failed to commit changes: {}", e.detail());
            return false;
        }

        info!("Successfully committed submodule updates");
        true
    }

    /// Push the configured branch to the remote
    pub async fn push(&self) -> bool {
        if let Err(e) = self.vcs.push(&self.repo_root, &self.push_branch).await {
            error!("Failed to push changes: {}", e.detail());
            return false;
        }

        info!("Successfully pushed changes to remote");
        true
    }
}
