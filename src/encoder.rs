//! Archive encoder

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use rand::Rng;

use crate::archive::{find_subslice, relative_name, render_header, Archive, ArchiveEntry};
use crate::archive::{END_TOKEN, MARKER_PREFIX};
use crate::discover::FileSet;

/// Encodes a file set into a self-extracting archive document.
pub struct Encoder {
    // Currently stateless, but reserved for future options
}

impl Encoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self {}
    }

    /// Read every file in `file_set` and write the complete document to
    /// `writer`. Paths are recorded relative to `base_dir`.
    ///
    /// Fails fast with the offending path when a file cannot be read, for
    /// example because it was deleted after selection. Partial output
    /// already written to the sink is the caller's to discard.
    pub fn encode_to_writer<W: Write>(
        &self,
        file_set: &FileSet,
        base_dir: &Path,
        mut writer: W,
    ) -> Result<()> {
        let archive = self.load_archive(file_set, base_dir)?;
        self.write_document(&archive, &mut writer)
    }

    /// Encode a file set to an in-memory document.
    pub fn encode(&self, file_set: &FileSet, base_dir: &Path) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.encode_to_writer(file_set, base_dir, &mut output)?;
        Ok(output)
    }

    /// Read the file set from disk into an in-memory archive. Each file
    /// handle lives only for the duration of that one read.
    pub fn load_archive(&self, file_set: &FileSet, base_dir: &Path) -> Result<Archive> {
        let mut archive = Archive::new();
        for path in file_set {
            let name = relative_name(path, base_dir).ok_or_else(|| {
                anyhow!(
                    "file {} is not under base directory {}",
                    path.display(),
                    base_dir.display()
                )
            })?;
            let data = fs::read(path)
                .with_context(|| format!("Failed to read file: {}", path.display()))?;
            archive.add_entry(ArchiveEntry::new(name, data))?;
        }
        Ok(archive)
    }

    /// Write an in-memory archive as a complete document: header, one
    /// boundary line plus raw bytes per entry in sorted path order, and
    /// the terminal boundary line.
    pub fn write_document<W: Write>(&self, archive: &Archive, writer: &mut W) -> Result<()> {
        let mut ordered: Vec<&ArchiveEntry> = archive.entries.iter().collect();
        ordered.sort_by(|a, b| a.path.cmp(&b.path));

        let separator = Self::unique_separator(archive);
        writer.write_all(render_header(&separator).as_bytes())?;

        for entry in ordered {
            writer.write_all(separator.as_bytes())?;
            writer.write_all(entry.path.as_bytes())?;
            writer.write_all(b"\n")?;
            writer.write_all(&entry.data)?;
            // Delimiter newline; the decoder strips it back off.
            writer.write_all(b"\n")?;
        }

        writer.write_all(separator.as_bytes())?;
        writer.write_all(END_TOKEN.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    /// Pick a boundary marker that provably does not occur in any entry's
    /// content: a random suffix is drawn and the payload rescanned until
    /// no collision remains. Uniqueness is a guarantee, not a probability.
    fn unique_separator(archive: &Archive) -> String {
        let mut rng = rand::rng();
        loop {
            let candidate = format!("{}{:016x}:", MARKER_PREFIX, rng.random::<u64>());
            let collides = archive
                .entries
                .iter()
                .any(|entry| find_subslice(&entry.data, candidate.as_bytes()).is_some());
            if !collides {
                return candidate;
            }
        }
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::PAYLOAD_SENTINEL;
    use std::fs;
    use tempfile::TempDir;

    fn document_text(archive: &Archive) -> Vec<u8> {
        let mut output = Vec::new();
        Encoder::new().write_document(archive, &mut output).unwrap();
        output
    }

    fn as_text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn test_document_header_and_footer() {
        let text = as_text(&document_text(&Archive::new()));

        assert!(text.starts_with("#!/bin/bash"));
        assert!(text.contains(&format!("\n{}\n", PAYLOAD_SENTINEL)));
        assert!(text.contains("SEPARATOR=\"++++++++++--------:"));
        assert!(text.ends_with(&format!("{}\n", END_TOKEN)));
    }

    #[test]
    fn test_document_contains_paths_and_content() {
        let mut archive = Archive::new();
        archive.add_entry(ArchiveEntry::new("dir/a.txt", "content-a")).unwrap();
        archive.add_entry(ArchiveEntry::new("b.txt", "content-b")).unwrap();

        let text = as_text(&document_text(&archive));

        assert!(text.contains("dir/a.txt"));
        assert!(text.contains("b.txt"));
        assert!(text.contains("content-a"));
        assert!(text.contains("content-b"));
    }

    #[test]
    fn test_entries_emitted_in_sorted_path_order() {
        let mut archive = Archive::new();
        // Insert deliberately out of order.
        archive.add_entry(ArchiveEntry::new("dir/a.txt", "a")).unwrap();
        archive.add_entry(ArchiveEntry::new("b.txt", "b")).unwrap();
        archive.add_entry(ArchiveEntry::new("a.txt", "a")).unwrap();

        let text = as_text(&document_text(&archive));

        let pos_a = text.find(":a.txt\n").unwrap();
        let pos_b = text.find(":b.txt\n").unwrap();
        let pos_dir = text.find(":dir/a.txt\n").unwrap();
        assert!(pos_a < pos_b);
        assert!(pos_b < pos_dir);
    }

    #[test]
    fn test_encode_from_disk() {
        let temp = TempDir::new().unwrap();
        let base = temp.path();
        fs::create_dir_all(base.join("dir")).unwrap();
        fs::write(base.join("dir/a.txt"), "content-a").unwrap();
        fs::write(base.join("b.txt"), "content-b").unwrap();

        let mut file_set = FileSet::new();
        file_set.insert(base.join("dir/a.txt"));
        file_set.insert(base.join("b.txt"));

        let output = Encoder::new().encode(&file_set, base).unwrap();
        let text = as_text(&output);

        assert!(text.contains("dir/a.txt"));
        assert!(text.contains("content-a"));
        assert!(text.contains("content-b"));
    }

    #[test]
    fn test_unreadable_file_fails_with_path() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("vanished.txt");
        let mut file_set = FileSet::new();
        file_set.insert(missing.clone());

        let err = Encoder::new().encode(&file_set, temp.path()).unwrap_err();

        assert!(format!("{:#}", err).contains("vanished.txt"));
    }

    #[test]
    fn test_separator_avoids_payload_collision() {
        // Content carrying the fixed prefix and a plausible full marker
        // must never be mistaken for a boundary.
        let mut archive = Archive::new();
        archive
            .add_entry(ArchiveEntry::new(
                "tricky.txt",
                format!("{}0123456789abcdef:fake/path\n", MARKER_PREFIX),
            ))
            .unwrap();

        let output = document_text(&archive);
        let text = as_text(&output);
        let separator_line = text
            .lines()
            .find(|l| l.starts_with("SEPARATOR=\""))
            .unwrap();
        let separator = separator_line
            .trim_start_matches("SEPARATOR=\"")
            .trim_end_matches('"');

        assert!(!archive.entries[0]
            .data
            .windows(separator.len())
            .any(|w| w == separator.as_bytes()));
    }
}
