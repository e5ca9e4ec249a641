//! Generation phase - runs the binding generator once per platform.

use crate::core::config::GeneratorConfig;
use crate::core::output;
use crate::core::platform::Platform;

use super::context::Context;
use super::error::PipelineError;
use super::tool::{Invocation, ToolRunner};
use super::util::{STDERR_TAIL_LINES, invoke};

/// Invocation of the generator for one platform.
pub fn generator_invocation(generator: &GeneratorConfig, platform: &Platform) -> Invocation {
    let mut invocation = Invocation::new(&generator.program).arg(&generator.manifest);
    for (name, value) in platform.generator_vars() {
        invocation = invocation.arg("--var").arg(format!("{}={}", name, value));
    }
    invocation.envs(platform.environment())
}

/// Run the generator for every platform in order, stopping at the first failure.
pub fn generate(
    ctx: &Context,
    runner: &dyn ToolRunner,
    generator: &GeneratorConfig,
    platforms: &[Platform],
) -> Result<usize, PipelineError> {
    let total = platforms.len();

    for (i, platform) in platforms.iter().enumerate() {
        let id = platform.target_id();
        output::action_numbered(i + 1, total, &format!("Generating {}", id));

        let invocation = generator_invocation(generator, platform);
        let out = invoke(ctx, runner, &invocation, &format!("{} {}", generator.program, id))?;
        if !out.is_success() {
            return Err(PipelineError::GeneratorFailure {
                platform: id,
                version: platform.version().to_string(),
                code: out.exit_code,
                stderr: out.stderr_tail(STDERR_TAIL_LINES),
            });
        }
    }

    Ok(total)
}
