//! Pipeline executor - downloads, unpacks and configures Qt source trees,
//! then runs the binding generator.
//!
//! Every stage looks at the cache root first and only acts on versions that
//! have not reached its target state yet, so running the pipeline twice does
//! no work the second time.

mod configure;
mod context;
mod download;
mod error;
mod generate;
#[doc(hidden)]
pub mod testing;
mod tool;
mod unpack;
mod util;

pub use configure::{KEEP_MODULES, configure_args, skip_modules};
pub use context::Context;
pub use download::fetch;
pub use error::PipelineError;
pub use generate::generator_invocation;
pub use tool::{
    CURL_RETRY_POLICY, ExitClass, Invocation, RetryPolicy, SystemRunner, ToolOutput, ToolRunner,
};

use std::collections::HashSet;

use crate::core::config::GeneratorConfig;
use crate::core::output;
use crate::core::platform::Platform;
use crate::core::version::QtVersion;

/// How far a version has progressed in the cache root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VersionState {
    MissingArchive,
    ArchivePresent,
    Unpacked,
    Configured,
}

/// Inspect the cache root for a version.
pub fn version_state(ctx: &Context, version: &QtVersion) -> VersionState {
    let root = &ctx.cache_root;
    if util::is_executable(&version.qmake_path(root)) {
        VersionState::Configured
    } else if version.unpack_path(root).is_dir() {
        VersionState::Unpacked
    } else if version.archive_path(root).is_file() {
        VersionState::ArchivePresent
    } else {
        VersionState::MissingArchive
    }
}

/// Work done by one stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageSummary {
    /// Versions the stage acted on
    pub processed: usize,
    /// Versions already at or past the stage's target state
    pub skipped: usize,
}

/// Versions of `platforms` without duplicates, in first-declaration order.
pub fn unique_versions(platforms: &[Platform]) -> Vec<QtVersion> {
    let mut seen = HashSet::new();
    platforms
        .iter()
        .map(|p| p.version())
        .filter(|v| seen.insert((*v).clone()))
        .cloned()
        .collect()
}

/// Runs pipeline stages against one cache root.
pub struct Executor<'a> {
    ctx: Context,
    runner: &'a dyn ToolRunner,
}

impl<'a> Executor<'a> {
    /// Create a new executor with the given context and tool runner.
    pub fn new(ctx: Context, runner: &'a dyn ToolRunner) -> Self {
        Self { ctx, runner }
    }

    /// Bring every version to the configured state: download, unpack, configure.
    pub fn prepare(&self, versions: &[QtVersion]) -> Result<(), PipelineError> {
        output::action(&format!("Downloading {} Qt release(s)", versions.len()));
        let summary = self.download(versions)?;
        report(&summary, "downloaded");

        output::action("Unpacking source trees");
        let summary = self.unpack(versions)?;
        report(&summary, "unpacked");

        output::action("Configuring source trees");
        let summary = self.configure(versions)?;
        report(&summary, "configured");

        Ok(())
    }

    /// Execute the download stage.
    pub fn download(&self, versions: &[QtVersion]) -> Result<StageSummary, PipelineError> {
        download::download(&self.ctx, self.runner, versions)
    }

    /// Execute the unpack stage.
    pub fn unpack(&self, versions: &[QtVersion]) -> Result<StageSummary, PipelineError> {
        unpack::unpack(&self.ctx, self.runner, versions)
    }

    /// Execute the configure stage.
    pub fn configure(&self, versions: &[QtVersion]) -> Result<StageSummary, PipelineError> {
        configure::configure(&self.ctx, self.runner, versions)
    }

    /// Run the binding generator for each platform.
    pub fn generate(
        &self,
        generator: &GeneratorConfig,
        platforms: &[Platform],
    ) -> Result<usize, PipelineError> {
        generate::generate(&self.ctx, self.runner, generator, platforms)
    }
}

fn report(summary: &StageSummary, verb: &str) {
    if summary.processed == 0 {
        output::skip(&format!("nothing to do, {} already {}", summary.skipped, verb));
    } else {
        output::detail(&format!(
            "{} {}, {} already done",
            summary.processed, verb, summary.skipped
        ));
    }
}
