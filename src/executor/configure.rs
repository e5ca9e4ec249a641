//! Configure stage - turns an unpacked tree into a minimal buildable form.
//!
//! Runs `./configure` with every optional module skipped except the keep-set,
//! then `make qmake_all` to generate the module headers.

use std::collections::BTreeSet;

use crate::core::output;
use crate::core::version::QtVersion;
use crate::discovery::{self, Discovery};

use super::context::Context;
use super::error::PipelineError;
use super::tool::{Invocation, ToolRunner};
use super::util::{STDERR_TAIL_LINES, invoke};
use super::{StageSummary, VersionState, version_state};

/// Modules that are always built
pub const KEEP_MODULES: &[&str] = &["base"];

/// Flags passed to every `configure` run, before `-prefix` and `-skip`
const CONFIGURE_FLAGS: &[&str] = &[
    "-opensource",
    "-confirm-license",
    "-nomake",
    "examples",
    "-nomake",
    "tests",
    "-nomake",
    "tools",
];

/// Configure every unpacked tree that has no `qmake` yet.
pub fn configure(
    ctx: &Context,
    runner: &dyn ToolRunner,
    versions: &[QtVersion],
) -> Result<StageSummary, PipelineError> {
    let mut summary = StageSummary::default();

    for version in versions {
        if version_state(ctx, version) >= VersionState::Configured {
            summary.skipped += 1;
            continue;
        }

        output::sub_action(&format!("Qt {}", version));
        configure_tree(ctx, runner, version)?;
        summary.processed += 1;
    }

    Ok(summary)
}

/// Modules to pass as `-skip`: everything discovered except the keep-set.
pub fn skip_modules(discovered: &BTreeSet<String>) -> Vec<String> {
    discovered
        .iter()
        .filter(|m| !KEEP_MODULES.contains(&m.as_str()))
        .cloned()
        .collect()
}

/// Full `configure` argument list for a tree.
pub fn configure_args(ctx: &Context, version: &QtVersion, skip: &[String]) -> Vec<String> {
    let mut args: Vec<String> = CONFIGURE_FLAGS.iter().map(|f| f.to_string()).collect();
    args.push("-prefix".to_string());
    args.push(version.install_prefix(&ctx.cache_root).display().to_string());
    for module in skip {
        args.push("-skip".to_string());
        args.push(module.clone());
    }
    args
}

fn configure_tree(
    ctx: &Context,
    runner: &dyn ToolRunner,
    version: &QtVersion,
) -> Result<(), PipelineError> {
    let tree = version.unpack_path(&ctx.cache_root);

    let discovery = discovery::discover(&tree).map_err(|source| PipelineError::Io {
        path: tree.clone(),
        source,
    })?;
    match &discovery {
        Discovery::Found { manifest, modules } => output::detail(&format!(
            "{} lists {} module(s) present on disk",
            manifest,
            modules.len()
        )),
        Discovery::NoManifest => output::warning(&format!(
            "no module manifest in {}, configuring without skipping modules",
            tree.display()
        )),
    }
    let skip = skip_modules(&discovery.modules());
    if !skip.is_empty() {
        output::detail(&format!("skipping: {}", skip.join(" ")));
    }

    let invocation = Invocation::new("./configure")
        .args(configure_args(ctx, version, &skip))
        .current_dir(&tree);
    let out = invoke(ctx, runner, &invocation, &format!("configuring Qt {}", version))?;
    if !out.is_success() {
        return Err(PipelineError::ConfigureFailure {
            version: version.to_string(),
            tree,
            code: out.exit_code,
            stderr: out.stderr_tail(STDERR_TAIL_LINES),
        });
    }

    let invocation = Invocation::new("make")
        .arg(format!("-j{}", ctx.nproc))
        .arg("qmake_all")
        .current_dir(&tree);
    let out = invoke(
        ctx,
        runner,
        &invocation,
        &format!("generating headers for Qt {}", version),
    )?;
    if !out.is_success() {
        // qmake alone would mark the tree configured on the next run
        let qmake = version.qmake_path(&ctx.cache_root);
        if let Err(e) = std::fs::remove_file(&qmake)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            output::warning(&format!(
                "could not remove {} ({}); delete it before the next run",
                qmake.display(),
                e
            ));
        }
        return Err(PipelineError::BuildHeaderFailure {
            version: version.to_string(),
            tree,
            code: out.exit_code,
            stderr: out.stderr_tail(STDERR_TAIL_LINES),
        });
    }

    Ok(())
}
