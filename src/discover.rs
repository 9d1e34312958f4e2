//! Gitignore-aware file discovery
//!
//! Walks one or more search paths and produces the set of files to
//! archive. Excluded directories are pruned before descent, so an ignored
//! subtree is skipped entirely even when files inside it would not match
//! any pattern on their own.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use walkdir::WalkDir;

use crate::archive::relative_name;
use crate::gitignore::{IgnoreSpec, GIT_DIR};

/// The files selected for archiving: absolute paths, no duplicates.
pub type FileSet = BTreeSet<PathBuf>;

/// Collect the files reachable from `search_paths`, filtered by `ignore`.
///
/// Paths are matched against the rules by their location relative to
/// `base_dir`, so every search path must live under it. A search path
/// that is itself a file is included unless excluded. `.git` entries are
/// pruned unconditionally. `ignore = None` means nothing is excluded.
///
/// Unreadable directory entries are reported on stderr and skipped; a bad
/// entry never fails the whole collection.
pub fn collect_files(
    search_paths: &[PathBuf],
    ignore: Option<&IgnoreSpec>,
    base_dir: &Path,
) -> Result<FileSet> {
    let mut files = FileSet::new();

    for search in search_paths {
        let rel = relative_name(search, base_dir).ok_or_else(|| {
            anyhow!(
                "search path {} is not under base directory {}",
                search.display(),
                base_dir.display()
            )
        })?;

        if search.is_file() {
            if !is_excluded(ignore, &rel) {
                files.insert(search.clone());
            }
            continue;
        }

        walk_directory(search, ignore, base_dir, &mut files);
    }

    Ok(files)
}

fn walk_directory(dir: &Path, ignore: Option<&IgnoreSpec>, base_dir: &Path, files: &mut FileSet) {
    let walker = WalkDir::new(dir).into_iter().filter_entry(|entry| {
        if entry.file_name() == GIT_DIR {
            return false;
        }
        if !entry.file_type().is_dir() {
            return true;
        }
        // Pruning decision: an excluded directory is never descended into.
        match relative_name(entry.path(), base_dir) {
            Some(rel) if !rel.is_empty() => !is_excluded_dir(ignore, &rel),
            _ => true,
        }
    });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                eprintln!("Warning: skipping unreadable entry: {}", err);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(rel) = relative_name(entry.path(), base_dir) else {
            continue;
        };
        if !is_excluded(ignore, &rel) {
            files.insert(entry.into_path());
        }
    }
}

fn is_excluded(ignore: Option<&IgnoreSpec>, rel: &str) -> bool {
    ignore.is_some_and(|spec| spec.matches(rel))
}

fn is_excluded_dir(ignore: Option<&IgnoreSpec>, rel: &str) -> bool {
    ignore.is_some_and(|spec| spec.matches_dir(rel))
}
