use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::instrument::WithSubscriber;
use tracing::{error, info};

use subsentry::logging::{self, LogSettings};
use subsentry::orchestrator::PlannedUpdate;
use subsentry::{
    Config, GitClient, Orchestrator, ProcessRunner, RunSummary, SubmoduleState, UpdateOutcome,
};

/// Exit status when the run is interrupted from the terminal
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(name = "subsentry")]
#[command(about = "Update git submodules to their upstream default branches")]
#[command(version)]
struct Cli {
    /// Automatically push changes to remote
    #[arg(long)]
    auto_push: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Path to the repository (default: current directory)
    #[arg(long, default_value = ".")]
    repo_path: String,

    /// Configuration file path (defaults to .subsentry.yml in the repository)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Inspect submodules and report what would be updated, without changing anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let repo_root = resolve_repo_path(&cli.repo_path)?;
    let config = Config::load_for_repo(&repo_root, cli.config.as_deref())?;

    let sink = logging::init(&LogSettings {
        verbose: cli.verbose,
        log_dir: config.log_dir_path(&repo_root),
    })?;
    let log_file = sink.log_file.clone();

    let work = async move {
        info!("Logging initialized. Log file: {}", log_file.display());
        info!("Starting subsentry v{}", env!("CARGO_PKG_VERSION"));

        let vcs = GitClient::new(ProcessRunner::new(config.command_timeout()))
            .with_binary(config.git_binary.clone())
            .with_remote(config.remote.clone());
        let orchestrator = Orchestrator::new(Arc::new(vcs), &repo_root, &config);

        tokio::select! {
            code = execute(&orchestrator, cli.auto_push, cli.dry_run) => code,
            _ = tokio::signal::ctrl_c() => {
                info!("Update process interrupted by user");
                ExitCode::from(EXIT_INTERRUPTED)
            }
        }
    };

    Ok(work.with_subscriber(sink.dispatch).await)
}

async fn execute(orchestrator: &Orchestrator, auto_push: bool, dry_run: bool) -> ExitCode {
    if dry_run {
        return match orchestrator.plan().await {
            Some(planned) => {
                print_plan(&planned);
                ExitCode::SUCCESS
            }
            None => ExitCode::FAILURE,
        };
    }

    let summary = orchestrator.execute(auto_push).await;
    print_summary(&summary);

    if summary.success {
        ExitCode::SUCCESS
    } else {
        if let Some(reason) = &summary.aborted {
            error!("Run aborted: {}", reason);
        }
        ExitCode::FAILURE
    }
}

/// Expand `~`/`$VAR`, normalise, and anchor the repository path at the current directory
fn resolve_repo_path(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw).context("Failed to expand repository path")?;
    let path = Path::new(expanded.as_ref());
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("Failed to determine current directory")?
            .join(path)
    };
    let cleaned = path_clean::clean(absolute);

    if !cleaned.is_dir() {
        anyhow::bail!("Repository path is not a directory: {}", cleaned.display());
    }
    Ok(cleaned)
}

fn print_plan(planned: &[PlannedUpdate]) {
    println!("\n🔍 Dry run - submodule status");
    for item in planned {
        let status = &item.status;
        let detail = match status.state {
            SubmoduleState::NeedsUpdate => format!(
                "{} -> {} on {}",
                status.short_current(),
                status.short_latest(),
                status.default_branch
            ),
            SubmoduleState::UpToDate if status.is_degraded() => {
                format!("{} (remote tip unresolved)", status.short_current())
            }
            SubmoduleState::UpToDate => status.short_current().to_string(),
            _ => String::new(),
        };
        println!(
            "   {:<14} {} ({}) {}",
            status.state.as_str(),
            item.submodule.name,
            item.submodule.path,
            detail
        );
    }
}

fn print_summary(summary: &RunSummary) {
    println!("\n📊 Submodule update summary");
    for report in &summary.reports {
        let icon = match &report.outcome {
            UpdateOutcome::Advanced { .. } => "🔄",
            UpdateOutcome::AlreadyCurrent { .. } => "✅",
            UpdateOutcome::Skipped { .. } => "⏭️ ",
            UpdateOutcome::Failed { .. } => "❌",
        };
        match &report.outcome {
            UpdateOutcome::Skipped { state } => {
                println!("   {} {}: {} ({})", icon, report.name, report.outcome.label(), state)
            }
            UpdateOutcome::Failed { reason } => {
                println!("   {} {}: {} ({})", icon, report.name, report.outcome.label(), reason)
            }
            outcome => println!("   {} {}: {}", icon, report.name, outcome.label()),
        }
    }

    println!("   🔄 Updated: {}", summary.updated.len());
    println!("   ✅ Already current: {}", summary.already_current());
    println!("   ⏭️  Skipped: {}", summary.skipped());
    println!("   ❌ Failed: {}", summary.failed());
    if summary.committed {
        println!("   📝 Committed{}", if summary.pushed { " and pushed" } else { "" });
    }
    println!("   ⏱️  Duration: {:.2}s", summary.duration.as_secs_f64());
}
