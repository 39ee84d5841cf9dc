//! subsentry - Unattended Git Submodule Refresh
//!
//! subsentry keeps the submodules of a repository on the tip of their upstream
//! default branches and records every refresh in a single commit, optionally
//! pushed.
//!
//! ## Core Features
//!
//! - **Declaration Parsing**: Reads `.gitmodules` stanzas in declaration order
//! - **Status Classification**: Missing, error, fetch-failed, up-to-date, or behind
//! - **Partial-Failure Tolerance**: One broken submodule never blocks the others
//! - **Single Commit**: All successful updates land in one commit, optionally pushed
//!
//! ## Modules
//!
//! - [`orchestrator`]: Run sequencing and summary
//! - [`status`]: Per-submodule classification against the remote
//! - [`git`]: Version-control capability trait and the `git` implementation

pub mod config;
pub mod declarations;
pub mod error;
pub mod git;
pub mod logging;
pub mod orchestrator;
pub mod publisher;
pub mod runner;
pub mod status;
pub mod updater;

pub use config::Config;
pub use declarations::{parse_declarations, Declarations, Submodule};
pub use error::SyncError;
pub use git::{GitClient, VersionControlClient};
pub use orchestrator::{Orchestrator, RunSummary};
pub use publisher::ChangePublisher;
pub use runner::{CommandResult, ProcessRunner};
pub use status::{StatusInspector, SubmoduleState, SubmoduleStatus};
pub use updater::{SubmoduleUpdater, UpdateOutcome};
