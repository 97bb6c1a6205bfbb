//! Rule file discovery along a path's directory ancestry.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ActionError, Result};
use crate::paths;

/// Base name of a rule file.
pub const RULE_FILE_STEM: &str = ".pathaction";

/// Accepted rule file extensions, in lookup order.
pub const RULE_FILE_EXTENSIONS: &[&str] = &[".yaml", ".yml"];

/// Rule files present directly in `dir`.
pub fn rule_files_in(dir: &Path) -> Vec<PathBuf> {
    RULE_FILE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{RULE_FILE_STEM}{ext}")))
        .filter(|candidate| candidate.is_file())
        .collect()
}

/// Walk from `target` towards the filesystem root and collect rule files,
/// most distant ancestor first.
///
/// The walk starts at the real location of `target`, or at its parent when
/// it is not a directory. `depth_limit` bounds the number of directories
/// inspected; `None` walks up to the root. Two rule files in one directory
/// is an error.
pub fn discover(target: &Path, depth_limit: Option<usize>) -> Result<Vec<PathBuf>> {
    let real = paths::real_path(target).map_err(|e| ActionError::io(target, e))?;
    let mut dir = if real.is_dir() {
        real
    } else {
        match real.parent() {
            Some(parent) => parent.to_path_buf(),
            None => real,
        }
    };

    let mut remaining = depth_limit;
    let mut found: Vec<PathBuf> = Vec::new();
    loop {
        if remaining == Some(0) {
            break;
        }

        let mut hits = rule_files_in(&dir);
        if hits.len() > 1 {
            return Err(ActionError::Discovery { dir, files: hits });
        }
        if let Some(hit) = hits.pop() {
            if !found.contains(&hit) {
                debug!(path = %hit.display(), "rule file found");
                found.insert(0, hit);
            }
        }

        remaining = remaining.map(|n| n - 1);
        match dir.parent() {
            Some(parent) => dir = parent.to_path_buf(),
            None => break,
        }
    }

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn nearest_file_comes_last() {
        let tmp = TempDir::new().unwrap();
        let root = fs::canonicalize(tmp.path()).unwrap();
        touch(&root.join("a/.pathaction.yaml"));
        touch(&root.join("a/b/.pathaction.yml"));
        touch(&root.join("a/b/c/file.txt"));

        let found = discover(&root.join("a/b/c/file.txt"), None).unwrap();
        let ours: Vec<_> = found.iter().filter(|p| p.starts_with(&root)).cloned().collect();
        assert_eq!(
            ours,
            vec![root.join("a/.pathaction.yaml"), root.join("a/b/.pathaction.yml")]
        );
    }

    #[test]
    fn directory_target_is_inspected_itself() {
        let tmp = TempDir::new().unwrap();
        let root = fs::canonicalize(tmp.path()).unwrap();
        touch(&root.join("d/.pathaction.yaml"));

        let found = discover(&root.join("d"), Some(1)).unwrap();
        assert_eq!(found, vec![root.join("d/.pathaction.yaml")]);
    }

    #[test]
    fn depth_limit_bounds_the_walk() {
        let tmp = TempDir::new().unwrap();
        let root = fs::canonicalize(tmp.path()).unwrap();
        touch(&root.join(".pathaction.yaml"));
        touch(&root.join("x/y/file.py"));

        assert!(discover(&root.join("x/y/file.py"), Some(2)).unwrap().is_empty());
        assert_eq!(
            discover(&root.join("x/y/file.py"), Some(3)).unwrap(),
            vec![root.join(".pathaction.yaml")]
        );
        assert!(discover(&root.join("x/y/file.py"), Some(0)).unwrap().is_empty());
    }

    #[test]
    fn two_rule_files_in_one_directory() {
        let tmp = TempDir::new().unwrap();
        let root = fs::canonicalize(tmp.path()).unwrap();
        touch(&root.join(".pathaction.yaml"));
        touch(&root.join(".pathaction.yml"));

        match discover(&root.join("file.txt"), None) {
            Err(ActionError::Discovery { dir, files }) => {
                assert_eq!(dir, root);
                assert_eq!(files.len(), 2);
            }
            other => panic!("expected a discovery error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_target_walks_the_real_tree() {
        let tmp = TempDir::new().unwrap();
        let root = fs::canonicalize(tmp.path()).unwrap();
        touch(&root.join("real/.pathaction.yaml"));
        touch(&root.join("real/file.sh"));
        fs::create_dir_all(root.join("links")).unwrap();
        std::os::unix::fs::symlink(root.join("real/file.sh"), root.join("links/file.sh")).unwrap();

        let found = discover(&root.join("links/file.sh"), Some(1)).unwrap();
        assert_eq!(found, vec![root.join("real/.pathaction.yaml")]);
    }
}
