//! Run orchestration
//!
//! Builds the platform list, prepares each distinct Qt version once, then
//! runs the binding generator for every platform in declaration order.

use std::path::Path;

use crate::core::config::Config;
use crate::core::output;
use crate::core::platform::Platform;
use crate::executor::{Context, Executor, PipelineError, ToolRunner, unique_versions};
use crate::probe;

/// Where the Qt installation comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Download, unpack and configure the configured versions
    #[default]
    Build,
    /// Use the Qt found on `PATH` and skip acquisition entirely
    System,
}

/// Options for a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub mode: Mode,
    /// Run the binding generator after the trees are ready
    pub generate: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Build,
            generate: true,
        }
    }
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Target ids in generation order
    pub platforms: Vec<String>,
    /// Distinct Qt versions prepared
    pub versions: Vec<String>,
    /// Number of generator invocations
    pub generated: usize,
}

/// Platforms declared by the configuration, resolved against the cache root.
pub fn build_platforms(config: &Config, cache_root: &Path) -> Result<Vec<Platform>, PipelineError> {
    config
        .platforms
        .iter()
        .map(|spec| Platform::from_spec(spec, cache_root).map_err(PipelineError::from))
        .collect()
}

/// Execute a complete run.
pub fn run(
    config: &Config,
    ctx: Context,
    runner: &dyn ToolRunner,
    options: RunOptions,
) -> Result<RunReport, PipelineError> {
    let platforms = match options.mode {
        Mode::Build => build_platforms(config, &ctx.cache_root)?,
        Mode::System => {
            output::action("Probing installed Qt");
            let platform = probe::probe_platform(runner)?;
            output::detail(&format!(
                "found Qt {} at {}",
                platform.version(),
                platform.install_root().display()
            ));
            vec![platform]
        }
    };

    let versions = unique_versions(&platforms);
    let executor = Executor::new(ctx, runner);

    if options.mode == Mode::Build {
        executor.prepare(&versions)?;
    }

    let generated = if options.generate {
        executor.generate(&config.generator, &platforms)?
    } else {
        output::info("Skipping binding generation");
        0
    };

    Ok(RunReport {
        platforms: platforms.iter().map(Platform::target_id).collect(),
        versions: versions.iter().map(|v| v.raw().to_string()).collect(),
        generated,
    })
}
