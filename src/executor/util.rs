//! Utility functions for the executor.

use std::path::{Path, PathBuf};

use crate::core::output;

use super::context::Context;
use super::error::PipelineError;
use super::tool::{Invocation, ToolOutput, ToolRunner};

/// Lines of stderr kept in error reports
pub const STDERR_TAIL_LINES: usize = 20;

/// Run an invocation behind a spinner.
///
/// In dry-run mode the command is only printed and reported as successful.
/// A non-zero exit is returned as `Ok`; callers decide what it means.
pub fn invoke(
    ctx: &Context,
    runner: &dyn ToolRunner,
    invocation: &Invocation,
    message: &str,
) -> Result<ToolOutput, PipelineError> {
    if ctx.verbose || ctx.dry_run {
        eprintln!(
            "[{}] {}",
            if ctx.dry_run { "dry-run" } else { "exec" },
            invocation
        );
    }

    if ctx.dry_run {
        return Ok(ToolOutput::success());
    }

    let pb = output::spinner(message);
    let result = runner.run(invocation);
    match result {
        Ok(ref out) if out.is_success() => output::progress_success(pb, message),
        _ => output::progress_fail(pb, message),
    }

    result.map_err(|source| PipelineError::Spawn {
        program: invocation.program.clone(),
        source,
    })
}

/// Temporary download target next to the final archive
pub fn part_path(archive: &Path) -> PathBuf {
    let mut name = archive.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Whether `path` is a regular file with an execute bit set.
pub fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path)
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        path.is_file()
    }
}
