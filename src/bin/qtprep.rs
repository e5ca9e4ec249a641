//! qtprep - prepare Qt source trees and run the binding generator
//!
//! Usage:
//!   qtprep                       Download, unpack, configure, generate
//!   qtprep --config qt.toml      Use the platform table from a file
//!   qtprep --system              Generate against the Qt found on PATH
//!   qtprep --no-generate         Prepare source trees only
//!
//! Exit codes: 0 success, 1 generator failure, 2 any earlier failure.

use anyhow::{Context as _, Result};
use clap::Parser;
use qtsrc_prep::{
    Config, Context, Mode, PipelineError, RunOptions, SystemRunner, lock, orchestrator, output,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Default cache root (XDG compliant)
fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("qtsrc-prep"))
        .unwrap_or_else(|| PathBuf::from(".qtsrc-cache"))
}

#[derive(Parser)]
#[command(name = "qtprep")]
#[command(about = "Prepare Qt source trees for per-platform binding generation")]
#[command(version)]
struct Cli {
    /// Platform table (TOML); the built-in table is used if omitted
    #[arg(short, long, env = "QTPREP_CONFIG")]
    config: Option<PathBuf>,

    /// Download/unpack root
    #[arg(long, env = "QTPREP_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Use the installed Qt (qmake on PATH) instead of building from source
    #[arg(long)]
    system: bool,

    /// Stop after the source trees are configured
    #[arg(long)]
    no_generate: bool,

    /// Print commands without running them
    #[arg(long)]
    dry_run: bool,

    /// Print every command before it runs
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(&format!("{:#}", err));
            ExitCode::from(exit_code(&err))
        }
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<PipelineError>()
        .map(PipelineError::exit_code)
        .unwrap_or(2)
}

fn run(cli: Cli) -> Result<()> {
    let config = match cli.config {
        Some(ref path) => Config::load(path)?,
        None => Config::default(),
    };

    let cache_root = cli
        .cache_dir
        .or_else(|| config.cache_dir.clone())
        .unwrap_or_else(default_cache_dir);

    let _lock = if cli.dry_run {
        None
    } else {
        std::fs::create_dir_all(&cache_root).with_context(|| {
            format!("Failed to create cache directory: {}", cache_root.display())
        })?;
        Some(lock::acquire_cache_lock(&cache_root)?)
    };

    let ctx = Context::with_cache_root(&cache_root)
        .mirror(config.mirror.clone())
        .dry_run(cli.dry_run)
        .verbose(cli.verbose);

    let options = RunOptions {
        mode: if cli.system { Mode::System } else { Mode::Build },
        generate: !cli.no_generate,
    };

    output::info(&format!("cache: {}", cache_root.display()));
    let report = orchestrator::run(&config, ctx, &SystemRunner, options)?;

    if options.generate {
        output::success(&format!(
            "Generated bindings for {} platform(s): {}",
            report.generated,
            report.platforms.join(", ")
        ));
    } else {
        output::success(&format!(
            "Prepared Qt {}",
            report.versions.join(", ")
        ));
    }

    Ok(())
}
