//! Unpack stage - extracts downloaded archives into the cache root.

use crate::core::output;
use crate::core::version::QtVersion;

use super::context::Context;
use super::error::PipelineError;
use super::tool::{Invocation, ToolRunner};
use super::util::{STDERR_TAIL_LINES, invoke};
use super::{StageSummary, VersionState, version_state};

/// Archive extraction tool
const TAR: &str = "tar";

/// Unpack every archive whose source tree is missing.
pub fn unpack(
    ctx: &Context,
    runner: &dyn ToolRunner,
    versions: &[QtVersion],
) -> Result<StageSummary, PipelineError> {
    let mut summary = StageSummary::default();

    for version in versions {
        if version_state(ctx, version) >= VersionState::Unpacked {
            summary.skipped += 1;
            continue;
        }

        output::sub_action(&format!("Qt {}", version));
        extract(ctx, runner, version)?;
        summary.processed += 1;
    }

    Ok(summary)
}

fn extract(ctx: &Context, runner: &dyn ToolRunner, version: &QtVersion) -> Result<(), PipelineError> {
    let archive = version.archive_path(&ctx.cache_root);
    let invocation = Invocation::new(TAR)
        .arg("-C")
        .arg(ctx.cache_root.display())
        .arg("-xf")
        .arg(archive.display());

    let out = invoke(
        ctx,
        runner,
        &invocation,
        &format!("unpacking {}", version.archive_name()),
    )?;

    if !out.is_success() {
        return Err(PipelineError::ExtractionFailure {
            version: version.to_string(),
            archive,
            code: out.exit_code,
            stderr: out.stderr_tail(STDERR_TAIL_LINES),
        });
    }

    output::detail(&format!(
        "unpacked to {}",
        version.unpack_path(&ctx.cache_root).display()
    ));
    Ok(())
}
