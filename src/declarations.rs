//! Declaration file parsing
//!
//! Reads the line-oriented submodule declaration file (normally `.gitmodules`)
//! and extracts each `[submodule "<name>"]` stanza together with its
//! `path = <relative-path>` line. Every other field is ignored.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, error, info};

use crate::error::{Result, SyncError};

/// A submodule declared by the parent repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submodule {
    /// Identity of the submodule within the declaration file
    pub name: String,
    /// Location relative to the parent repository root
    pub path: String,
}

impl Submodule {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Absolute working directory of this submodule under `repo_root`
    pub fn working_dir(&self, repo_root: &Path) -> PathBuf {
        repo_root.join(&self.path)
    }
}

/// Ordered name -> path mapping in declaration order
///
/// A name that repeats keeps its first position and takes the last path seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declarations {
    entries: Vec<Submodule>,
}

impl Declarations {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Submodule> {
        self.entries.iter()
    }

    #[cfg(test)]
    pub(crate) fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.path.as_str())
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|s| s.name.as_str()).collect()
    }

    fn insert(&mut self, name: String, path: String) {
        match self.entries.iter_mut().find(|s| s.name == name) {
            Some(existing) => existing.path = path,
            None => self.entries.push(Submodule { name, path }),
        }
    }
}

impl<'a> IntoIterator for &'a Declarations {
    type Item = &'a Submodule;
    type IntoIter = std::slice::Iter<'a, Submodule>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn stanza_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"^\[submodule "(.+)"\]$"#).expect("valid stanza regex"))
}

fn path_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^path = (.+)$").expect("valid path regex"))
}

/// Parse declaration file contents
pub fn parse_str(content: &str) -> Declarations {
    let mut declarations = Declarations::default();
    let mut current_name: Option<String> = None;
    let mut current_path: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();

        if let Some(caps) = stanza_pattern().captures(line) {
            if let (Some(name), Some(path)) = (current_name.take(), current_path.take()) {
                declarations.insert(name, path);
            }
            current_name = Some(caps[1].to_string());
            current_path = None;
        } else if let Some(caps) = path_pattern().captures(line) {
            current_path = Some(caps[1].trim().to_string());
        }
    }

    if let (Some(name), Some(path)) = (current_name, current_path) {
        declarations.insert(name, path);
    }

    declarations
}

/// Read and parse the declaration file at `path`
pub fn read_declarations(path: &Path) -> Result<Declarations> {
    if !path.exists() {
        return Err(SyncError::MissingDeclarationFile(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(parse_str(&content))
}

/// Parse the declaration file, reporting problems and yielding an empty
/// mapping when it is missing or unreadable
pub fn parse_declarations(path: &Path) -> Declarations {
    match read_declarations(path) {
        Ok(declarations) => {
            info!(
                "Found {} submodules: {:?}",
                declarations.len(),
                declarations.names()
            );
            for submodule in &declarations {
                debug!("Declared submodule {} at {}", submodule.name, submodule.path);
            }
            declarations
        }
        Err(e) => {
            error!("{}", e);
            Declarations::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    const TWO_STANZAS: &str = r#"[submodule "a"]
	path = libs/a
	url = https://example.com/a.git
[submodule "b"]
	path = libs/b
	url = https://example.com/b.git
"#;

    #[test]
    fn test_two_stanzas_in_order() {
        let declarations = parse_str(TWO_STANZAS);
        assert_eq!(declarations.names(), vec!["a", "b"]);
        assert_eq!(declarations.get("a"), Some("libs/a"));
        assert_eq!(declarations.get("b"), Some("libs/b"));
    }

    #[test]
    fn test_stanza_without_path_is_dropped() {
        let content = r#"[submodule "orphan"]
	url = https://example.com/orphan.git
[submodule "kept"]
	path = vendor/kept
"#;
        let declarations = parse_str(content);
        assert_eq!(declarations.names(), vec!["kept"]);
    }

    #[test]
    fn test_unrelated_lines_are_ignored() {
        let content = "# comment\n[core]\n\tbare = false\npathological = nope\n";
        assert!(parse_str(content).is_empty());
    }

    #[test]
    fn test_repeated_name_keeps_position_and_last_path() {
        let content = r#"[submodule "a"]
path = old/a
[submodule "b"]
path = libs/b
[submodule "a"]
path = new/a
"#;
        let declarations = parse_str(content);
        assert_eq!(declarations.names(), vec!["a", "b"]);
        assert_eq!(declarations.get("a"), Some("new/a"));
    }

    #[test]
    fn test_names_with_slashes_and_spaces() {
        let content = "[submodule \"third party/lib\"]\n  path = third_party/lib  \n";
        let declarations = parse_str(content);
        assert_eq!(declarations.get("third party/lib"), Some("third_party/lib"));
    }

    #[test]
    fn test_missing_file_yields_empty_mapping() {
        let temp = assert_fs::TempDir::new().unwrap();
        let missing = temp.child(".gitmodules");

        assert!(parse_declarations(missing.path()).is_empty());
        assert!(matches!(
            read_declarations(missing.path()),
            Err(SyncError::MissingDeclarationFile(_))
        ));
    }

    #[test]
    fn test_reads_file_from_disk() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child(".gitmodules");
        file.write_str(TWO_STANZAS).unwrap();

        let declarations = parse_declarations(file.path());
        assert_eq!(declarations.len(), 2);
        let first = declarations.iter().next().unwrap();
        assert_eq!(first.working_dir(temp.path()), temp.path().join("libs/a"));
    }
}
