//! Development tasks for qtsrc-prep.
//!
//!   cargo xtask check-tools          Verify external tools are on PATH
//!   cargo xtask clean-cache <dir>    Remove interrupted downloads

mod cache;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

/// Tools every build-mode run shells out to
const REQUIRED_TOOLS: &[&str] = &["curl", "tar", "make"];

#[derive(Parser)]
#[command(name = "xtask")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that curl, tar, make and the generator are installed
    CheckTools {
        /// Binding generator executable
        #[arg(long, default_value = "qtbindgen")]
        generator: String,
    },
    /// Delete `.part` files left behind by interrupted downloads
    CleanCache {
        dir: std::path::PathBuf,
    },
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Command::CheckTools { generator } => check_tools(&generator),
        Command::CleanCache { dir } => {
            let removed = cache::remove_partial_downloads(&dir)?;
            println!("Removed {} partial download(s) from {}", removed, dir.display());
            Ok(())
        }
    }
}

fn check_tools(generator: &str) -> Result<()> {
    let mut missing = Vec::new();
    for tool in REQUIRED_TOOLS.iter().copied().chain([generator]) {
        match which::which(tool) {
            Ok(path) => println!("  {:<12} {}", tool, path.display()),
            Err(_) => {
                println!("  {:<12} not found", tool);
                missing.push(tool);
            }
        }
    }

    if !missing.is_empty() {
        bail!("missing tools: {}", missing.join(", "));
    }
    Ok(())
}
