//! affread CLI - inspect AFF archives
//!
//! Lists the node tree, prints node payloads and verifies section digests.

use std::io::Write;
use std::path::{Path, PathBuf};

use affread_core::NodeKind;
use affread_reader::{AffReader, NodeData, ReaderConfig, SectionKind};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "affread")]
#[command(about = "Inspect and verify AFF archives", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Command {
    /// Show the header version, section descriptors and counts
    Info {
        file: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the children of a node
    Ls {
        file: PathBuf,

        /// Node path
        #[arg(default_value = "/")]
        path: String,
    },

    /// List every node with its kind and size
    Tree { file: PathBuf },

    /// Print the payload of a node
    Cat { file: PathBuf, path: String },

    /// Open the archive and verify every section digest
    Verify { file: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(cli.log_level.as_str())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Command::Info { file, json } => cmd_info(&file, json),
        Command::Ls { file, path } => cmd_ls(&file, &path),
        Command::Tree { file } => cmd_tree(&file),
        Command::Cat { file, path } => cmd_cat(&file, &path),
        Command::Verify { file } => cmd_verify(&file),
    }
}

fn open(path: &Path) -> Result<AffReader> {
    AffReader::open(path).with_context(|| format!("Failed to open {}", path.display()))
}

fn cmd_info(file: &Path, json: bool) -> Result<()> {
    let archive = open(file)?;

    if json {
        let value = serde_json::json!({
            "path": file.display().to_string(),
            "header": archive.header(),
            "strings": archive.string_table().len(),
            "nodes": archive.tree().len(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("=== AFF Archive ===");
    println!("Path:     {}", file.display());
    println!("Version:  {}", archive.version());
    println!("Strings:  {}", archive.string_table().len());
    println!("Nodes:    {}", archive.tree().len());
    println!();
    println!("{:<8} {:>12} {:>12} {:>8}  {}", "Section", "Start", "Size", "Records", "MD5");
    println!("{}", "-".repeat(80));
    for kind in SectionKind::ALL {
        let section = archive.header().section(kind);
        println!(
            "{:<8} {:>12} {:>12} {:>8}  {}",
            kind.name(),
            section.start,
            format_bytes(section.size),
            section.records,
            section.md5_hex()
        );
    }

    Ok(())
}

fn cmd_ls(file: &Path, path: &str) -> Result<()> {
    let archive = open(file)?;
    let id = archive.resolve_path(path)?;

    for child in archive.children(id)? {
        println!("{}", archive.info(child.id)?);
    }
    Ok(())
}

fn cmd_tree(file: &Path) -> Result<()> {
    let archive = open(file)?;
    for info in archive.walk() {
        println!("{}", info);
    }
    Ok(())
}

fn cmd_cat(file: &Path, path: &str) -> Result<()> {
    let mut archive = open(file)?;
    let id = archive.resolve_path(path)?;
    if archive.node(id)?.kind == NodeKind::Void {
        bail!("{} has no payload", path);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match archive.read_node(id)? {
        NodeData::Void => {}
        NodeData::Char(bytes) => out.write_all(&bytes)?,
        NodeData::Int(values) => {
            for v in values {
                writeln!(out, "{}", v)?;
            }
        }
        NodeData::Double(values) => {
            for v in values {
                writeln!(out, "{}", v)?;
            }
        }
        NodeData::Complex(values) => {
            for (re, im) in values {
                writeln!(out, "{} {}", re, im)?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

fn cmd_verify(file: &Path) -> Result<()> {
    let archive = AffReader::open_with_config(file, &ReaderConfig::verifying())
        .with_context(|| format!("Verification of {} failed", file.display()))?;

    for kind in SectionKind::ALL {
        let section = archive.header().section(kind);
        println!("{:<8} OK  {}", kind.name(), section.md5_hex());
    }
    println!("{}: {} archive verified", file.display(), archive.version());
    Ok(())
}

/// Format bytes in a human-readable way
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1_048_576 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else if bytes < 1_073_741_824 {
        format!("{:.2} MB", bytes as f64 / 1_048_576.0)
    } else {
        format!("{:.2} GB", bytes as f64 / 1_073_741_824.0)
    }
}
