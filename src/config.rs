use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the per-repository configuration file
pub const CONFIG_FILE_NAME: &str = ".subsentry.yml";

/// Main configuration structure for subsentry
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Config {
    /// Declaration file, relative to the repository root
    #[serde(default = "default_declaration_file")]
    pub declaration_file: String,

    /// Remote every submodule is synchronized against
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Branch assumed when a remote does not advertise its default branch
    #[serde(default = "default_branch")]
    pub fallback_branch: String,

    /// Branch of the parent repository pushed after committing
    #[serde(default = "default_branch")]
    pub push_branch: String,

    /// Timeout for git operations in seconds
    #[serde(default = "default_timeout")]
    pub command_timeout: u64,

    /// Directory for per-run log files, relative to the repository root
    ///
    /// Update commits stage the whole working tree, so a log directory inside
    /// the repository is committed along with the submodule pointers unless it
    /// is listed in `.gitignore`.
    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Version-control binary to invoke
    #[serde(default = "default_git_binary")]
    pub git_binary: String,

    /// Re-check HEAD against the remote tip after advancing a submodule
    #[serde(default = "default_true")]
    pub verify_after_update: bool,
}

// Default value functions
fn default_declaration_file() -> String {
    ".gitmodules".to_string()
}
fn default_remote() -> String {
    "origin".to_string()
}
fn default_branch() -> String {
    "main".to_string()
}
fn default_timeout() -> u64 {
    300
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_git_binary() -> String {
    "git".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            declaration_file: default_declaration_file(),
            remote: default_remote(),
            fallback_branch: default_branch(),
            push_branch: default_branch(),
            command_timeout: default_timeout(),
            log_dir: default_log_dir(),
            git_binary: default_git_binary(),
            verify_after_update: default_true(),
        }
    }
}

impl Config {
    /// Load `explicit` if given, else `<repo_root>/.subsentry.yml` if present, else defaults
    pub fn load_for_repo(repo_root: &Path, explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = Self::repo_config_path(repo_root);
                if path.exists() {
                    Self::load(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {:?}", path))?;

        Ok(config)
    }

    pub fn repo_config_path(repo_root: &Path) -> PathBuf {
        repo_root.join(CONFIG_FILE_NAME)
    }

    pub fn validate(&self) -> Result<()> {
        if self.command_timeout == 0 {
            anyhow::bail!("command_timeout must be greater than zero");
        }
        for (field, value) in [
            ("declaration_file", &self.declaration_file),
            ("remote", &self.remote),
            ("fallback_branch", &self.fallback_branch),
            ("push_branch", &self.push_branch),
            ("git_binary", &self.git_binary),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("{} must not be empty", field);
            }
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout)
    }

    pub fn declaration_path(&self, repo_root: &Path) -> PathBuf {
        repo_root.join(&self.declaration_file)
    }

    pub fn log_dir_path(&self, repo_root: &Path) -> PathBuf {
        repo_root.join(&self.log_dir)
    }
}
