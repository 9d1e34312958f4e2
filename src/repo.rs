//! Git repository root discovery

use std::path::{Path, PathBuf};

use crate::gitignore::GIT_DIR;

/// Find the nearest enclosing git repository root.
///
/// Starting at `start` (resolved to an absolute path with symlinks
/// normalized), each directory is probed for a `.git` control directory,
/// moving to the parent on a miss. Returns `None` once the filesystem
/// root has been reached without a hit, or when `start` does not exist.
/// Absence is an expected outcome, not an error.
pub fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut dir = start.canonicalize().ok()?;
    loop {
        if dir.join(GIT_DIR).is_dir() {
            return Some(dir);
        }
        if !dir.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_none_outside_repo() {
        let temp = TempDir::new().unwrap();
        let child = temp.path().join("sub").join("dir");
        fs::create_dir_all(&child).unwrap();

        assert_eq!(find_git_root(&child), None);
    }

    #[test]
    fn test_detects_root_from_nested_dir() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        let nested = temp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let root = find_git_root(&nested).unwrap();
        assert_eq!(root, temp.path().canonicalize().unwrap());
    }

    #[test]
    fn test_prefers_nearest_ancestor() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        let inner = temp.path().join("vendor").join("lib");
        fs::create_dir_all(inner.join(".git")).unwrap();
        let start = inner.join("src");
        fs::create_dir_all(&start).unwrap();

        let root = find_git_root(&start).unwrap();
        assert_eq!(root, inner.canonicalize().unwrap());
    }

    #[test]
    fn test_git_file_is_not_a_marker() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".git"), "gitdir: elsewhere").unwrap();

        assert_eq!(find_git_root(temp.path()), None);
    }

    #[test]
    fn test_missing_start_path() {
        let temp = TempDir::new().unwrap();
        let gone = temp.path().join("does-not-exist");

        assert_eq!(find_git_root(&gone), None);
    }
}
