//! emx-shar CLI
//!
//! Create, extract, and list self-extracting shell archives.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use emx_shar::archive::relative_name;
use emx_shar::{collect_files, find_git_root, gitignore, Decoder, Encoder};
use std::env;
use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "emx-shar")]
#[command(author = "nzinfo <li.monan@gmail.com>")]
#[command(version)]
#[command(about = "Self-extracting shell archive tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an archive from files/directories
    Create {
        /// Files and directories to archive
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output archive file (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Base directory for relative paths (default: enclosing git root,
        /// falling back to the current directory)
        #[arg(short = 'b', long)]
        base_dir: Option<PathBuf>,

        /// Do not load .gitignore rules
        #[arg(long)]
        no_gitignore: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Extract an archive
    #[command(name = "x")]
    Extract {
        /// Archive file to extract (default: stdin)
        #[arg(short = 'i', long)]
        input: Option<PathBuf>,

        /// Directory to extract to (default: current directory)
        #[arg(short = 'C', long, default_value = ".")]
        directory: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// List contents of an archive
    #[command(name = "t")]
    List {
        /// Archive file to list (default: stdin)
        #[arg(short = 'i', long)]
        input: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Create { inputs, output, base_dir, no_gitignore, verbose } => {
            create_archive(inputs, output, base_dir, no_gitignore, verbose)?;
        }
        Commands::Extract { input, directory, verbose } => {
            extract_archive(input, directory, verbose)?;
        }
        Commands::List { input, verbose } => {
            list_archive(input, verbose)?;
        }
    }

    Ok(())
}

fn create_archive(
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
    base_dir: Option<PathBuf>,
    no_gitignore: bool,
    verbose: bool,
) -> Result<()> {
    let cwd = env::current_dir().context("Failed to resolve current directory")?;
    let base_dir = match base_dir {
        Some(dir) => dir
            .canonicalize()
            .with_context(|| format!("Invalid base directory: {}", dir.display()))?,
        None => find_git_root(&cwd).unwrap_or(cwd),
    };

    let mut search_paths = Vec::with_capacity(inputs.len());
    for input in &inputs {
        let resolved = input
            .canonicalize()
            .with_context(|| format!("Invalid input path: {}", input.display()))?;
        search_paths.push(resolved);
    }

    let spec = gitignore::load(&base_dir, !no_gitignore);
    let files = collect_files(&search_paths, spec.as_ref(), &base_dir)?;

    if verbose {
        for file in &files {
            if let Some(name) = relative_name(file, &base_dir) {
                println!("Adding: {}", name);
            }
        }
    }

    let encoder = Encoder::new();
    if let Some(output_path) = output {
        let sink = fs::File::create(&output_path)
            .with_context(|| format!("Failed to create: {}", output_path.display()))?;
        encoder.encode_to_writer(&files, &base_dir, BufWriter::new(sink))?;
        mark_executable(&output_path)?;

        if verbose {
            println!("Created: {} ({} files)", output_path.display(), files.len());
        }
    } else {
        let stdout = io::stdout();
        encoder.encode_to_writer(&files, &base_dir, stdout.lock())?;
    }

    Ok(())
}

/// The document is a runnable script; file output gets the execute bit.
#[cfg(unix)]
fn mark_executable(path: &std::path::Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("Failed to set permissions: {}", path.display()))
}

#[cfg(not(unix))]
fn mark_executable(_path: &std::path::Path) -> Result<()> {
    Ok(())
}

fn read_document(input: Option<PathBuf>) -> Result<Vec<u8>> {
    if let Some(input_path) = input {
        fs::read(&input_path).with_context(|| format!("Failed to read: {}", input_path.display()))
    } else {
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer)?;
        Ok(buffer)
    }
}

fn extract_archive(input: Option<PathBuf>, directory: PathBuf, verbose: bool) -> Result<()> {
    let document = read_document(input)?;
    let archive = Decoder::new().decode(&document)?;

    if verbose {
        println!("Files: {}", archive.entries.len());
        for entry in &archive.entries {
            println!("Extracting: {}", entry.path);
        }
    }

    archive.write_to_dir(&directory)?;
    Ok(())
}

fn list_archive(input: Option<PathBuf>, verbose: bool) -> Result<()> {
    let document = read_document(input)?;
    let archive = Decoder::new().decode(&document)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for entry in &archive.entries {
        if verbose {
            writeln!(out, "{}  {}", entry.path, entry.data.len())?;
        } else {
            writeln!(out, "{}", entry.path)?;
        }
    }

    Ok(())
}
