//! Archive data structures and format constants

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Fixed, recognizable prefix of every boundary line.
pub const MARKER_PREFIX: &str = "++++++++++--------:";

/// Header line marking where the payload begins. The bytes after this
/// line (plus its newline) are the payload.
pub const PAYLOAD_SENTINEL: &str = "# --- DATA PAYLOAD ---";

/// Reserved token carried by the terminal boundary line instead of a path.
pub const END_TOKEN: &str = "__ARCHIVE_END__";

/// Placeholder substituted with the document separator when the header is
/// rendered.
const SEPARATOR_PLACEHOLDER: &str = "@SEPARATOR@";

/// The script preamble of every archive. Running the whole document with
/// bash locates the payload behind the sentinel and splits it back into
/// files. The awk extractor joins content lines with newlines, which is
/// exactly the inverse of the delimiter newline the encoder emits after
/// each file's bytes.
const HEADER_TEMPLATE: &str = r##"#!/bin/bash
# Self-extracting archive.
#
# Execute this file with bash to unpack its payload into the current
# directory, or pass a target directory as the first argument:
#
#   bash <archive> [target-dir]
#
# The embedded extractor below is line oriented; archives carrying raw
# binary data are better unpacked with the companion tool (emx-shar x).
set -eu

TARGET_DIR="${1:-.}"
SEPARATOR="@SEPARATOR@"

PAYLOAD_START=$(awk '/^# --- DATA PAYLOAD ---$/ { print NR + 1; exit }' "$0")
if [ -z "$PAYLOAD_START" ]; then
    echo "corrupt archive: payload sentinel not found" >&2
    exit 1
fi

mkdir -p "$TARGET_DIR"
tail -n +"$PAYLOAD_START" "$0" | awk -v sep="$SEPARATOR" -v dir="$TARGET_DIR" '
index($0, sep) == 1 {
    if (out != "") close(out)
    name = substr($0, length(sep) + 1)
    if (name == "__ARCHIVE_END__") exit
    out = dir "/" name
    slash = 0
    for (i = length(name); i > 0; i--)
        if (substr(name, i, 1) == "/") { slash = i; break }
    if (slash > 0) system("mkdir -p \"" dir "/" substr(name, 1, slash - 1) "\"")
    printf "" > out
    first = 1
    next
}
out != "" {
    if (first) { printf "%s", $0 > out; first = 0 }
    else { printf "\n%s", $0 > out }
}
'
exit 0
# --- DATA PAYLOAD ---
"##;

/// Render the script header for a document using `separator` as its
/// boundary marker. The returned text ends with the payload sentinel line,
/// so the first boundary line follows immediately.
pub fn render_header(separator: &str) -> String {
    HEADER_TEMPLATE.replace(SEPARATOR_PLACEHOLDER, separator)
}

/// A single file inside an archive document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path relative to the archive base directory, forward slashes only.
    pub path: String,
    /// Raw file bytes, exactly as on disk.
    pub data: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            data: data.into(),
        }
    }
}

/// An in-memory archive document: the decoded (or to-be-encoded) file set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Archive {
    pub entries: Vec<ArchiveEntry>,
}

impl Archive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, rejecting duplicate relative paths. Every path in a
    /// document must resolve to exactly one file on decode.
    pub fn add_entry(&mut self, entry: ArchiveEntry) -> Result<()> {
        if self.entries.iter().any(|e| e.path == entry.path) {
            bail!("Duplicate archive path: {}", entry.path);
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Materialize every entry under `target`, creating intermediate
    /// directories as needed. Entry paths that escape `target` are refused.
    pub fn write_to_dir(&self, target: &Path) -> Result<()> {
        for entry in &self.entries {
            let dest = safe_join(target, &entry.path)?;
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
            fs::write(&dest, &entry.data)
                .with_context(|| format!("Failed to write: {}", dest.display()))?;
        }
        Ok(())
    }
}

/// Join a decoded relative path onto `base`, refusing anything that could
/// land outside it (absolute paths, `..`, or `.` components).
pub fn safe_join(base: &Path, name: &str) -> Result<PathBuf> {
    if name.is_empty() {
        bail!("refusing to extract entry with an empty path");
    }
    let mut dest = base.to_path_buf();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => dest.push(part),
            _ => bail!("refusing to extract '{}': path escapes the target directory", name),
        }
    }
    Ok(dest)
}

/// The base-relative name recorded for `path` in a document: forward
/// slashes regardless of host conventions. `None` when `path` is not
/// under `base`.
pub fn relative_name(path: &Path, base: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}

/// First occurrence of `needle` in `haystack`.
pub(crate) fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}
