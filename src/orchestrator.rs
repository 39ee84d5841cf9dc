//! Orchestrator - sequences one submodule refresh run
//!
//! Parses the declarations, initializes submodules, advances each one in
//! declaration order, and publishes every successful advance as a single
//! commit. Failures that make the whole run meaningless (no declarations,
//! init failure) abort it; failures of one submodule only exclude that
//! submodule from the commit.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::declarations::{parse_declarations, Submodule};
use crate::git::VersionControlClient;
use crate::publisher::ChangePublisher;
use crate::status::{StatusInspector, SubmoduleState, SubmoduleStatus};
use crate::updater::{SubmoduleUpdater, UpdateOutcome};

/// Per-submodule line of a run summary
#[derive(Debug, Clone)]
pub struct SubmoduleReport {
    pub name: String,
    pub path: String,
    pub outcome: UpdateOutcome,
}

/// Results from a complete run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub success: bool,
    /// Set when the run stopped before processing submodules
    pub aborted: Option<String>,
    pub reports: Vec<SubmoduleReport>,
    /// Submodules advanced during this run, in declaration order
    ///
    /// Submodules that were already at their remote tip are not listed.
    pub updated: Vec<String>,
    pub committed: bool,
    pub pushed: bool,
    pub duration: Duration,
}

impl RunSummary {
    fn aborted(reason: impl Into<String>, started: Instant) -> Self {
        Self {
            success: false,
            aborted: Some(reason.into()),
            duration: started.elapsed(),
            ..Default::default()
        }
    }

    pub fn already_current(&self) -> usize {
        self.count(|o| matches!(o, UpdateOutcome::AlreadyCurrent { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, UpdateOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, UpdateOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&UpdateOutcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Inspection-only view of one submodule
#[derive(Debug, Clone)]
pub struct PlannedUpdate {
    pub submodule: Submodule,
    pub status: SubmoduleStatus,
}

/// Runs submodule refreshes against one parent repository
pub struct Orchestrator {
    vcs: Arc<dyn VersionControlClient>,
    repo_root: PathBuf,
    declaration_path: PathBuf,
    inspector: StatusInspector,
    updater: SubmoduleUpdater,
    publisher: ChangePublisher,
    verify_after_update: bool,
}

impl Orchestrator {
    pub fn new(vcs: Arc<dyn VersionControlClient>, repo_root: &Path, config: &Config) -> Self {
        let inspector = StatusInspector::new(vcs.clone(), repo_root)
            .with_fallback_branch(config.fallback_branch.clone());
        let updater = SubmoduleUpdater::new(vcs.clone(), inspector.clone());
        let publisher =
            ChangePublisher::new(vcs.clone(), repo_root).with_push_branch(config.push_branch.clone());

        Self {
            vcs,
            repo_root: repo_root.to_path_buf(),
            declaration_path: config.declaration_path(repo_root),
            inspector,
            updater,
            publisher,
            verify_after_update: config.verify_after_update,
        }
    }

    /// Refresh every submodule; true when the run (and push, if requested) succeeded
    pub async fn run(&self, auto_push: bool) -> bool {
        self.execute(auto_push).await.success
    }

    /// Refresh every submodule and report what happened to each
    pub async fn execute(&self, auto_push: bool) -> RunSummary {
        let started = Instant::now();
        info!("Starting submodule update process in {}", self.repo_root.display());

        let declarations = parse_declarations(&self.declaration_path);
        if declarations.is_empty() {
            error!("No submodules found");
            return RunSummary::aborted("no submodules declared", started);
        }

        if let Err(e) = self.vcs.init_submodules_recursive(&self.repo_root).await {
            error!("Failed to initialize submodules: {}", e);
            return RunSummary::aborted(format!("submodule init failed: {}", e), started);
        }

        let mut reports = Vec::with_capacity(declarations.len());
        let mut updated = Vec::new();

        for submodule in &declarations {
            let mut outcome = self
                .updater
                .update_with_outcome(&submodule.name, &submodule.path)
                .await;

            if let UpdateOutcome::Advanced { status } = &outcome {
                if self.confirm(submodule, status).await {
                    updated.push(submodule.name.clone());
                } else {
                    outcome = UpdateOutcome::Failed {
                        reason: format!("not at {} after update", status.short_latest()),
                    };
                }
            }

            reports.push(SubmoduleReport {
                name: submodule.name.clone(),
                path: submodule.path.clone(),
                outcome,
            });
        }

        let mut summary = RunSummary {
            reports,
            ..Default::default()
        };

        if updated.is_empty() {
            info!("No submodules needed updating");
            summary.success = true;
        } else {
            info!("Updated submodules: {:?}", updated);
            summary.committed = self.publisher.commit(&updated).await;
            summary.success = if !summary.committed {
                false
            } else if auto_push {
                summary.pushed = self.publisher.push().await;
                summary.pushed
            } else {
                true
            };
        }

        summary.updated = updated;
        summary.duration = started.elapsed();
        info!(
            "Run finished in {:.2}s: {} updated, {} already current, {} skipped, {} failed",
            summary.duration.as_secs_f64(),
            summary.updated.len(),
            summary.already_current(),
            summary.skipped(),
            summary.failed()
        );
        summary
    }

    /// Inspect every declared submodule without changing anything
    ///
    /// Returns `None` when no submodules are declared.
    pub async fn plan(&self) -> Option<Vec<PlannedUpdate>> {
        let declarations = parse_declarations(&self.declaration_path);
        if declarations.is_empty() {
            error!("No submodules found");
            return None;
        }

        let mut planned = Vec::with_capacity(declarations.len());
        for submodule in &declarations {
            let status = self.inspector.inspect(&submodule.path).await;
            planned.push(PlannedUpdate {
                submodule: submodule.clone(),
                status,
            });
        }
        Some(planned)
    }

    async fn confirm(&self, submodule: &Submodule, status: &SubmoduleStatus) -> bool {
        if !self.verify_after_update {
            return true;
        }
        match self.inspector.confirm(&submodule.path, status).await {
            SubmoduleState::UpToDate => true,
            state => {
                warn!(
                    "Submodule {} is {} after update, expected {}",
                    submodule.name,
                    state,
                    status.short_latest()
                );
                false
            }
        }
    }
}
