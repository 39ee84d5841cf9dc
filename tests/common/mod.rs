//! Common test utilities and helpers for subsentry tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use subsentry::error::{Result, SyncError};
use subsentry::VersionControlClient;
use tempfile::TempDir;

/// Parent repository laid out on disk: a declaration file plus submodule directories
pub struct TestRepo {
    pub temp_dir: TempDir,
}

impl TestRepo {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a `.gitmodules` declaring `(name, path)` pairs and create each directory
    pub fn with_submodules(self, submodules: &[(&str, &str)]) -> Self {
        let mut content = String::new();
        for (name, path) in submodules {
            content.push_str(&format!(
                "[submodule \"{}\"]\n\tpath = {}\n\turl = https://example.com/{}.git\n",
                name, path, name
            ));
            std::fs::create_dir_all(self.root().join(path)).expect("Failed to create submodule dir");
        }
        std::fs::write(self.root().join(".gitmodules"), content)
            .expect("Failed to write .gitmodules");
        self
    }

    pub fn remove_dir(&self, path: &str) {
        std::fs::remove_dir_all(self.root().join(path)).expect("Failed to remove dir");
    }
}

#[derive(Default)]
struct Script {
    heads: HashMap<String, String>,
    tips: HashMap<String, String>,
    branches: HashMap<String, String>,
    failing: HashSet<String>,
}

/// Scripted version-control client that records every call
///
/// Submodules are keyed by their path relative to the repository root. A
/// successful pull moves HEAD to the scripted tip.
pub struct FakeVcs {
    root: PathBuf,
    script: Mutex<Script>,
    calls: Mutex<Vec<String>>,
    commit_messages: Mutex<Vec<String>>,
}

impl FakeVcs {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            script: Mutex::new(Script::default()),
            calls: Mutex::new(Vec::new()),
            commit_messages: Mutex::new(Vec::new()),
        }
    }

    /// Script a submodule at `current` whose remote `main` is at `tip`
    pub fn submodule(self, path: &str, current: &str, tip: &str) -> Self {
        {
            let mut script = self.script.lock().unwrap();
            script.heads.insert(path.to_string(), current.to_string());
            script.tips.insert(path.to_string(), tip.to_string());
            script.branches.insert(path.to_string(), "main".to_string());
        }
        self
    }

    pub fn default_branch(self, path: &str, branch: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .branches
            .insert(path.to_string(), branch.to_string());
        self
    }

    /// Make `operation` fail, for one submodule path or for the root ("")
    pub fn failing(self, operation: &str, path: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .failing
            .insert(format!("{} {}", operation, path));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, operation: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(&format!("{} ", operation)) || c == operation)
            .collect()
    }

    pub fn commit_messages(&self) -> Vec<String> {
        self.commit_messages.lock().unwrap().clone()
    }

    fn key(&self, dir: &Path) -> String {
        dir.strip_prefix(&self.root)
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|_| dir.to_string_lossy().to_string())
    }

    fn record(&self, operation: &str, dir: &Path) -> Result<String> {
        let key = self.key(dir);
        let call = if key.is_empty() {
            operation.to_string()
        } else {
            format!("{} {}", operation, key)
        };
        self.calls.lock().unwrap().push(call);

        if self
            .script
            .lock()
            .unwrap()
            .failing
            .contains(&format!("{} {}", operation, key))
        {
            return Err(SyncError::CommandFailure {
                command: format!("git {}", operation),
                stderr: format!("scripted {} failure", operation),
            });
        }
        Ok(key)
    }
}

#[async_trait]
impl VersionControlClient for FakeVcs {
    async fn resolve_head(&self, dir: &Path) -> Result<String> {
        let key = self.record("rev-parse", dir)?;
        Ok(self.script.lock().unwrap().heads.get(&key).cloned().unwrap_or_default())
    }

    async fn fetch(&self, dir: &Path) -> Result<()> {
        self.record("fetch", dir).map(|_| ())
    }

    async fn resolve_default_branch(&self, dir: &Path) -> Result<String> {
        let key = self.record("symbolic-ref", dir)?;
        Ok(self
            .script
            .lock()
            .unwrap()
            .branches
            .get(&key)
            .cloned()
            .unwrap_or_else(|| "main".to_string()))
    }

    async fn resolve_remote_tip(&self, dir: &Path, _branch: &str) -> Result<String> {
        let key = self.record("rev-parse-remote", dir)?;
        Ok(self.script.lock().unwrap().tips.get(&key).cloned().unwrap_or_default())
    }

    async fn checkout(&self, dir: &Path, _branch: &str) -> Result<()> {
        self.record("checkout", dir).map(|_| ())
    }

    async fn pull(&self, dir: &Path, _branch: &str) -> Result<()> {
        let key = self.record("pull", dir)?;
        let mut script = self.script.lock().unwrap();
        if let Some(tip) = script.tips.get(&key).cloned() {
            script.heads.insert(key, tip);
        }
        Ok(())
    }

    async fn stage_all(&self, dir: &Path) -> Result<()> {
        self.record("add", dir).map(|_| ())
    }

    async fn commit(&self, dir: &Path, message: &str) -> Result<()> {
        self.record("commit", dir)?;
        self.commit_messages.lock().unwrap().push(message.to_string());
        Ok(())
    }

    async fn push(&self, dir: &Path, branch: &str) -> Result<()> {
        self.record("push", dir)?;
        self.calls.lock().unwrap().push(format!("pushed {}", branch));
        Ok(())
    }

    async fn init_submodules_recursive(&self, dir: &Path) -> Result<()> {
        self.record("submodule-init", dir).map(|_| ())
    }
}
