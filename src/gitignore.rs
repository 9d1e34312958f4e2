//! Gitignore pattern loading and matching
//!
//! A `.gitignore` file is compiled into an ordered list of rules, one per
//! pattern line. Matching replays every rule in file order against a
//! root-relative path and keeps the verdict of the last rule that hit, so
//! a later `!pattern` re-includes a path excluded by an earlier, broader
//! pattern.

use std::fs;
use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};

/// Name of the pattern file read at the repository root.
pub const GITIGNORE_FILE: &str = ".gitignore";

/// Name of the git control directory. Always pruned during discovery.
pub const GIT_DIR: &str = ".git";

/// Load the ignore rules for `root`.
///
/// Returns `None` when `enabled` is false (ignore processing disabled) or
/// when `root` has no `.gitignore` file. Callers must treat `None` as
/// "nothing is excluded".
pub fn load(root: &Path, enabled: bool) -> Option<IgnoreSpec> {
    if !enabled {
        return None;
    }
    let text = fs::read_to_string(root.join(GITIGNORE_FILE)).ok()?;
    Some(IgnoreSpec::parse(&text))
}

/// An ordered, compiled set of gitignore rules.
#[derive(Debug)]
pub struct IgnoreSpec {
    rules: Vec<IgnoreRule>,
}

impl IgnoreSpec {
    /// Compile pattern text, one rule per line.
    ///
    /// Blank lines and `#` comments are skipped. A pattern that fails to
    /// compile is skipped with a warning instead of failing the load.
    pub fn parse(text: &str) -> Self {
        let mut rules = Vec::new();
        for line in text.lines() {
            match IgnoreRule::parse(line) {
                Ok(Some(rule)) => rules.push(rule),
                Ok(None) => {}
                Err(err) => {
                    eprintln!("Warning: skipping unusable .gitignore pattern '{}': {}", line, err);
                }
            }
        }
        Self { rules }
    }

    /// Whether a root-relative file path is excluded.
    pub fn matches(&self, path: &str) -> bool {
        self.verdict(path, false)
    }

    /// Whether a root-relative directory path is excluded. Directory-only
    /// rules (`pattern/`) can only hit through this entry point.
    pub fn matches_dir(&self, path: &str) -> bool {
        self.verdict(path, true)
    }

    fn verdict(&self, path: &str, is_dir: bool) -> bool {
        let mut excluded = false;
        for rule in &self.rules {
            if rule.hits(path, is_dir) {
                excluded = !rule.negated;
            }
        }
        excluded
    }
}

/// A single compiled pattern line.
#[derive(Debug)]
struct IgnoreRule {
    /// The pattern itself.
    matcher: GlobMatcher,
    /// The pattern extended with `/**`: paths below a matched directory.
    subtree: GlobMatcher,
    negated: bool,
    dir_only: bool,
}

impl IgnoreRule {
    /// Parse one pattern line. `Ok(None)` for blanks and comments.
    fn parse(line: &str) -> Result<Option<Self>, globset::Error> {
        let mut pattern = line.trim_end();
        if pattern.is_empty() || pattern.starts_with('#') {
            return Ok(None);
        }

        let negated = if let Some(rest) = pattern.strip_prefix('!') {
            pattern = rest;
            true
        } else {
            false
        };

        let dir_only = if let Some(rest) = pattern.strip_suffix('/') {
            pattern = rest;
            true
        } else {
            false
        };

        // A separator anywhere in the remaining pattern anchors it to the
        // root; otherwise it matches at any depth.
        let anchored = pattern.contains('/');
        let pattern = pattern.strip_prefix('/').unwrap_or(pattern);
        if pattern.is_empty() {
            return Ok(None);
        }

        let glob = if anchored {
            pattern.to_string()
        } else {
            format!("**/{pattern}")
        };

        Ok(Some(Self {
            matcher: compile(&glob)?,
            subtree: compile(&format!("{glob}/**"))?,
            negated,
            dir_only,
        }))
    }

    fn hits(&self, path: &str, is_dir: bool) -> bool {
        if self.dir_only && !is_dir {
            // The pattern names a directory; a file can only hit by living
            // under a directory the pattern matches.
            return self.subtree.is_match(path);
        }
        self.matcher.is_match(path) || self.subtree.is_match(path)
    }
}

fn compile(glob: &str) -> Result<GlobMatcher, globset::Error> {
    Ok(GlobBuilder::new(glob)
        .literal_separator(true)
        .backslash_escape(true)
        .build()?
        .compile_matcher())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_disabled_returns_none() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".gitignore"), "*.log\n").unwrap();

        assert!(load(temp.path(), false).is_none());
    }

    #[test]
    fn test_load_missing_file_returns_none() {
        let temp = TempDir::new().unwrap();

        assert!(load(temp.path(), true).is_none());
    }

    #[test]
    fn test_load_reads_pattern_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".gitignore"), "*.log\n").unwrap();

        let spec = load(temp.path(), true).unwrap();
        assert!(spec.matches("debug.log"));
        assert!(!spec.matches("debug.txt"));
    }

    #[test]
    fn test_negation_overrides_earlier_match() {
        let spec = IgnoreSpec::parse("*.log\n!keep.log\n");

        assert!(spec.matches("foo/bar/debug.log"));
        assert!(!spec.matches("keep.log"));
        assert!(!spec.matches("foo/keep.log"));
    }

    #[test]
    fn test_last_match_wins_in_file_order() {
        // Negation first, broader exclusion later: the later rule wins.
        let spec = IgnoreSpec::parse("!keep.log\n*.log\n");

        assert!(spec.matches("keep.log"));
    }

    #[test]
    fn test_unanchored_matches_at_any_depth() {
        let spec = IgnoreSpec::parse("*.tmp\n");

        assert!(spec.matches("build.tmp"));
        assert!(spec.matches("a/b/c/build.tmp"));
    }

    #[test]
    fn test_anchored_by_leading_slash() {
        let spec = IgnoreSpec::parse("/build\n");

        assert!(spec.matches_dir("build"));
        assert!(spec.matches("build"));
        assert!(!spec.matches_dir("x/build"));
    }

    #[test]
    fn test_anchored_by_internal_slash() {
        let spec = IgnoreSpec::parse("doc/frotz\n");

        assert!(spec.matches("doc/frotz"));
        assert!(!spec.matches("x/doc/frotz"));
    }

    #[test]
    fn test_directory_only_pattern() {
        let spec = IgnoreSpec::parse("node_modules/\n");

        assert!(spec.matches_dir("node_modules"));
        assert!(spec.matches_dir("pkg/node_modules"));
        assert!(spec.matches("node_modules/pkg/index.js"));
        // A plain file named node_modules is not a directory.
        assert!(!spec.matches("node_modules"));
    }

    #[test]
    fn test_excluded_directory_covers_contents() {
        let spec = IgnoreSpec::parse("build\n");

        assert!(spec.matches_dir("build"));
        assert!(spec.matches("build/out/main.o"));
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let spec = IgnoreSpec::parse("# generated outputs\n\n*.tmp\n");

        assert!(spec.matches("a.tmp"));
        assert!(!spec.matches("# generated outputs"));
    }

    #[test]
    fn test_question_mark_and_classes() {
        let spec = IgnoreSpec::parse("?.txt\n[ab].rs\n");

        assert!(spec.matches("a.txt"));
        assert!(spec.matches("sub/z.txt"));
        assert!(!spec.matches("ab.txt"));
        assert!(spec.matches("a.rs"));
        assert!(!spec.matches("c.rs"));
    }

    #[test]
    fn test_star_does_not_cross_separators() {
        let spec = IgnoreSpec::parse("/src*.rs\n");

        assert!(spec.matches("srcmain.rs"));
        assert!(!spec.matches("src/main.rs"));
    }

    #[test]
    fn test_double_star_crosses_separators() {
        let spec = IgnoreSpec::parse("target/**/deps\n");

        assert!(spec.matches_dir("target/debug/build/deps"));
        assert!(!spec.matches_dir("other/debug/deps"));
    }

    #[test]
    fn test_malformed_pattern_is_skipped() {
        // "[" is an unterminated character class; the load must survive
        // and the remaining rules must still apply.
        let spec = IgnoreSpec::parse("[\n*.tmp\n");

        assert!(spec.matches("x.tmp"));
        assert!(!spec.matches("["));
    }

    #[test]
    fn test_empty_spec_excludes_nothing() {
        let spec = IgnoreSpec::parse("");

        assert!(!spec.matches("anything"));
        assert!(!spec.matches_dir("anything"));
    }
}
