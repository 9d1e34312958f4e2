//! Archive decoder
//!
//! The byte-level inverse of the encoder, equivalent to the extraction
//! routine embedded in every document header. Content is the bytes
//! strictly between a boundary line's newline and the newline preceding
//! the next boundary, so binary data and missing trailing newlines
//! survive the round trip untouched.

use anyhow::{anyhow, bail, Result};

use crate::archive::{find_subslice, Archive, ArchiveEntry};
use crate::archive::{END_TOKEN, MARKER_PREFIX, PAYLOAD_SENTINEL};

/// Decodes a self-extracting archive document.
pub struct Decoder {
    // Currently stateless, but reserved for future options
}

impl Decoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self {}
    }

    /// Decode a complete document into its entries.
    ///
    /// The separator is learned from the first boundary line after the
    /// payload sentinel, so any document written with any marker suffix
    /// decodes without out-of-band knowledge. Bytes after the terminal
    /// boundary line are ignored.
    pub fn decode(&self, input: &[u8]) -> Result<Archive> {
        let payload = payload_of(input)?;
        let separator = separator_of(payload)?;

        let mut archive = Archive::new();
        let mut boundary = Vec::with_capacity(separator.len() + 1);
        boundary.push(b'\n');
        boundary.extend_from_slice(separator);

        let mut cursor = 0usize;
        loop {
            // Invariant: payload[cursor..] starts with the separator.
            let line_len = find_byte(&payload[cursor..], b'\n')
                .ok_or_else(|| anyhow!("corrupt archive: unterminated boundary line"))?;
            let name_bytes = &payload[cursor + separator.len()..cursor + line_len];
            let name = std::str::from_utf8(name_bytes)
                .map_err(|_| anyhow!("corrupt archive: file name is not valid UTF-8"))?;
            if name == END_TOKEN {
                break;
            }
            if name.is_empty() {
                bail!("corrupt archive: boundary line without a file name");
            }

            let content_start = cursor + line_len + 1;
            let offset = find_subslice(&payload[content_start..], &boundary).ok_or_else(|| {
                anyhow!("corrupt archive: missing end marker after '{}'", name)
            })?;
            let content_end = content_start + offset;

            archive.add_entry(ArchiveEntry::new(
                name,
                payload[content_start..content_end].to_vec(),
            ))?;

            // Skip the delimiter newline onto the next boundary line.
            cursor = content_end + 1;
        }

        Ok(archive)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// The bytes following the payload sentinel line.
fn payload_of(input: &[u8]) -> Result<&[u8]> {
    let needle = format!("\n{}\n", PAYLOAD_SENTINEL);
    let pos = find_subslice(input, needle.as_bytes())
        .ok_or_else(|| anyhow!("corrupt archive: payload sentinel not found"))?;
    Ok(&input[pos + needle.len()..])
}

/// The document separator, read off the first boundary line: the fixed
/// prefix, the entropy suffix, and the closing colon.
fn separator_of(payload: &[u8]) -> Result<&[u8]> {
    let line_len = find_byte(payload, b'\n')
        .ok_or_else(|| anyhow!("corrupt archive: no boundary line after payload sentinel"))?;
    let first_line = &payload[..line_len];
    if !first_line.starts_with(MARKER_PREFIX.as_bytes()) {
        bail!("corrupt archive: expected a boundary line after the payload sentinel");
    }
    let suffix_len = first_line[MARKER_PREFIX.len()..]
        .iter()
        .position(|&b| b == b':')
        .ok_or_else(|| anyhow!("corrupt archive: malformed boundary line"))?;
    Ok(&first_line[..MARKER_PREFIX.len() + suffix_len + 1])
}

fn find_byte(haystack: &[u8], byte: u8) -> Option<usize> {
    haystack.iter().position(|&b| b == byte)
}
