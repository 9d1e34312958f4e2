//! # emx-shar
//!
//! Self-extracting shell archives with gitignore-aware file selection.
//!
//! An archive is a single text file that is simultaneously a bash script
//! and a container: executing it unpacks its own payload, and the
//! companion decoder reconstructs the same files byte for byte.
//!
//! ## Document Format
//!
//! ```text
//! #!/bin/bash
//! ... embedded extraction routine, SEPARATOR="<marker>" ...
//! # --- DATA PAYLOAD ---
//! <marker>dir/a.txt
//! raw bytes of dir/a.txt
//! <marker>z.bin
//! raw bytes of z.bin
//! <marker>__ARCHIVE_END__
//! ```
//!
//! Every boundary line is the document's marker followed by a relative
//! path; the reserved end token closes the payload. The marker combines
//! the fixed prefix `++++++++++--------:` with a random suffix that is
//! rescanned against the payload and regenerated on collision, so file
//! content never needs escaping: binary bytes, embedded marker-like
//! strings, and missing trailing newlines all survive unmodified.
//!
//! ## File Selection
//!
//! Files are discovered by walking one or more search paths. When a
//! `.gitignore` is in play, its rules are honored with standard
//! semantics: last match wins, `!` re-includes, trailing `/` restricts a
//! pattern to directories, patterns containing `/` are anchored to the
//! root. Excluded directories are pruned whole, exactly as git skips
//! them, and `.git` itself is never archived.
//!
//! ```no_run
//! use std::path::Path;
//! use emx_shar::{collect_files, find_git_root, gitignore, Encoder};
//!
//! # fn main() -> anyhow::Result<()> {
//! let base = find_git_root(Path::new(".")).expect("not inside a repository");
//! let spec = gitignore::load(&base, true);
//! let files = collect_files(&[base.clone()], spec.as_ref(), &base)?;
//! let document = Encoder::new().encode(&files, &base)?;
//! # let _ = document;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod decoder;
pub mod discover;
pub mod encoder;
pub mod gitignore;
pub mod repo;

pub use archive::{safe_join, Archive, ArchiveEntry, END_TOKEN, MARKER_PREFIX, PAYLOAD_SENTINEL};
pub use decoder::Decoder;
pub use discover::{collect_files, FileSet};
pub use encoder::Encoder;
pub use gitignore::IgnoreSpec;
pub use repo::find_git_root;
