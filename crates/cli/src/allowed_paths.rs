//! Directories pathaction is allowed to run in.
//!
//! A path is allowed when it is an allowed directory or lies below one.
//! Only the permanent entries are persisted.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use pathaction_rules::paths;

/// On-disk form of the allow-list.
#[derive(Debug, Default, Serialize, Deserialize)]
struct AllowListFile {
    #[serde(default)]
    permanently_allowed: Vec<PathBuf>,
}

#[derive(Debug, Default, Clone)]
pub struct AllowedPaths {
    temporary: BTreeSet<PathBuf>,
    permanent: BTreeSet<PathBuf>,
}

fn resolve(path: &Path) -> PathBuf {
    paths::real_path(path).unwrap_or_else(|_| path.to_path_buf())
}

impl AllowedPaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the permanent entries from `path`. A missing file is an empty list.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(?path, "Allow-list not found, starting empty");
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read allow-list: {}", path.display()))?;
        let file: Option<AllowListFile> = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse allow-list: {}", path.display()))?;
        Ok(Self {
            temporary: BTreeSet::new(),
            permanent: file.unwrap_or_default().permanently_allowed.into_iter().collect(),
        })
    }

    /// Write the permanent entries to `path`, creating its directory.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }
        let file = AllowListFile {
            permanently_allowed: self.permanent.iter().cloned().collect(),
        };
        let yaml = serde_yaml::to_string(&file).context("failed to serialize allow-list")?;
        fs::write(path, yaml)
            .with_context(|| format!("failed to write allow-list: {}", path.display()))?;
        Ok(())
    }

    /// Allow `path` and everything below it. An entry moves between the
    /// temporary and permanent sets when added again with the other flag.
    pub fn add(&mut self, path: &Path, permanent: bool) {
        let path = resolve(path);
        if permanent {
            self.temporary.remove(&path);
            self.permanent.insert(path);
        } else {
            self.permanent.remove(&path);
            self.temporary.insert(path);
        }
    }

    pub fn remove(&mut self, path: &Path) {
        let path = resolve(path);
        self.temporary.remove(&path);
        self.permanent.remove(&path);
    }

    pub fn is_allowed(&self, path: &Path) -> bool {
        let path = resolve(path);
        self.iter().any(|allowed| path.starts_with(allowed))
    }

    /// Every allowed directory, temporary ones first.
    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.temporary.iter().chain(self.permanent.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tree() -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let root = fs::canonicalize(tmp.path()).unwrap();
        fs::create_dir_all(root.join("project/src")).unwrap();
        fs::create_dir_all(root.join("other")).unwrap();
        (tmp, root)
    }

    #[test]
    fn subdirectories_and_files_are_allowed() {
        let (_tmp, root) = tree();
        let mut allowed = AllowedPaths::new();
        allowed.add(&root.join("project"), false);

        assert!(allowed.is_allowed(&root.join("project")));
        assert!(allowed.is_allowed(&root.join("project/src/main.rs")));
        assert!(!allowed.is_allowed(&root.join("other/file.py")));
        assert!(!allowed.is_allowed(&root.join("project-two")));
    }

    #[test]
    fn dot_segments_cannot_escape() {
        let (_tmp, root) = tree();
        let mut allowed = AllowedPaths::new();
        allowed.add(&root.join("project"), true);

        assert!(!allowed.is_allowed(&root.join("project/../other/file.py")));
    }

    #[test]
    fn add_moves_between_sets_and_remove_clears_both() {
        let (_tmp, root) = tree();
        let dir = root.join("project");
        let mut allowed = AllowedPaths::new();

        allowed.add(&dir, false);
        allowed.add(&dir, true);
        assert_eq!(allowed.iter().count(), 1);
        assert!(allowed.permanent.contains(&dir));

        allowed.remove(&dir);
        assert!(!allowed.is_allowed(&dir));
    }

    #[test]
    fn only_permanent_entries_are_saved() {
        let (tmp, root) = tree();
        let file = tmp.path().join("cfg/permissions.yml");
        let mut allowed = AllowedPaths::new();
        allowed.add(&root.join("project"), true);
        allowed.add(&root.join("other"), false);
        allowed.save(&file).unwrap();

        let text = fs::read_to_string(&file).unwrap();
        assert!(text.contains("permanently_allowed"));

        let loaded = AllowedPaths::load(&file).unwrap();
        assert!(loaded.is_allowed(&root.join("project/src")));
        assert!(!loaded.is_allowed(&root.join("other")));
    }

    #[test]
    fn missing_or_empty_file_is_an_empty_list() {
        let (tmp, root) = tree();
        let missing = AllowedPaths::load(&tmp.path().join("none.yml")).unwrap();
        assert_eq!(missing.iter().count(), 0);

        let empty = tmp.path().join("empty.yml");
        fs::write(&empty, "").unwrap();
        assert!(!AllowedPaths::load(&empty).unwrap().is_allowed(&root));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let (tmp, _root) = tree();
        let file = tmp.path().join("bad.yml");
        fs::write(&file, "permanently_allowed: {a: [").unwrap();
        assert!(AllowedPaths::load(&file).is_err());
    }
}
