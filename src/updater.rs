//! Advancing a single submodule to its remote default branch

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::SyncError;
use crate::git::VersionControlClient;
use crate::status::{StatusInspector, SubmoduleState, SubmoduleStatus};

/// What happened to one submodule during an update attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Already at the remote tip; nothing was run
    AlreadyCurrent { status: SubmoduleStatus },
    /// Checked out and pulled the default branch
    Advanced { status: SubmoduleStatus },
    /// Inspection ended in a state that cannot be advanced
    Skipped { state: SubmoduleState },
    /// A precondition, checkout, or pull failed
    Failed { reason: String },
}

impl UpdateOutcome {
    /// The submodule ended in an up-to-date-with-remote state
    pub fn succeeded(&self) -> bool {
        matches!(
            self,
            UpdateOutcome::AlreadyCurrent { .. } | UpdateOutcome::Advanced { .. }
        )
    }

    /// Status the outcome was decided on, when inspection got that far
    pub fn status(&self) -> Option<&SubmoduleStatus> {
        match self {
            UpdateOutcome::AlreadyCurrent { status } | UpdateOutcome::Advanced { status } => {
                Some(status)
            }
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UpdateOutcome::AlreadyCurrent { .. } => "already current",
            UpdateOutcome::Advanced { .. } => "updated",
            UpdateOutcome::Skipped { .. } => "skipped",
            UpdateOutcome::Failed { .. } => "failed",
        }
    }
}

/// Moves submodules classified as behind onto their remote default branch tip
///
/// There is no rollback: a checkout that succeeds followed by a failing pull
/// leaves the submodule on the checked-out branch.
#[derive(Clone)]
pub struct SubmoduleUpdater {
    vcs: Arc<dyn VersionControlClient>,
    inspector: StatusInspector,
    repo_root: PathBuf,
}

impl SubmoduleUpdater {
    pub fn new(vcs: Arc<dyn VersionControlClient>, inspector: StatusInspector) -> Self {
        let repo_root = inspector.repo_root().to_path_buf();
        Self {
            vcs,
            inspector,
            repo_root,
        }
    }

    /// Update the submodule `name` at `path`; true when it ends up at the remote tip
    pub async fn update(&self, name: &str, path: &str) -> bool {
        self.update_with_outcome(name, path).await.succeeded()
    }

    /// Inspect and, if behind, advance the submodule
    pub async fn update_with_outcome(&self, name: &str, path: &str) -> UpdateOutcome {
        info!("Updating submodule: {}", name);
        let dir = self.repo_root.join(path);

        if !dir.exists() {
            let err = SyncError::MissingSubmoduleDirectory(PathBuf::from(path));
            error!("{}", err);
            return UpdateOutcome::Failed {
                reason: err.to_string(),
            };
        }

        let status = self.inspector.inspect(path).await;

        match status.state {
            SubmoduleState::UpToDate => {
                if status.is_degraded() {
                    info!(
                        "Submodule {} assumed up-to-date (remote tip of {} unresolved)",
                        name, status.default_branch
                    );
                } else {
                    info!("Submodule {} is already up-to-date", name);
                }
                return UpdateOutcome::AlreadyCurrent { status };
            }
            SubmoduleState::NeedsUpdate => {}
            state => {
                error!("Submodule {} has status: {}", name, state);
                return UpdateOutcome::Skipped { state };
            }
        }

        let branch = status.default_branch.as_str();

        if let Err(e) = self.vcs.checkout(&dir, branch).await {
            let reason = format!("failed to checkout {}: {}", branch, e);
            error!("Failed to checkout {} for {}: {}", branch, name, e);
            return UpdateOutcome::Failed { reason };
        }

        if let Err(e) = self.vcs.pull(&dir, branch).await {
            let reason = format!("failed to pull {}: {}", branch, e);
            error!("Failed to pull latest changes for {}: {}", name, e);
            return UpdateOutcome::Failed { reason };
        }

        info!(
            "Successfully updated {} from {} to {}",
            name,
            status.short_current(),
            status.short_latest()
        );
        UpdateOutcome::Advanced { status }
    }
}
