//! Download stage - fetches missing release archives with curl.

use crate::core::output;
use crate::core::version::QtVersion;

use super::context::Context;
use super::error::PipelineError;
use super::tool::{CURL_RETRY_POLICY, ExitClass, Invocation, RetryPolicy, ToolRunner};
use super::util::{STDERR_TAIL_LINES, invoke, part_path};
use super::{StageSummary, VersionState, version_state};

/// Fetch tool
const CURL: &str = "curl";

/// Download every archive that is not on disk yet.
pub fn download(
    ctx: &Context,
    runner: &dyn ToolRunner,
    versions: &[QtVersion],
) -> Result<StageSummary, PipelineError> {
    let mut summary = StageSummary::default();

    for version in versions {
        if version_state(ctx, version) >= VersionState::ArchivePresent {
            summary.skipped += 1;
            continue;
        }

        output::sub_action(&format!("Qt {}", version));
        fetch(ctx, runner, version, &CURL_RETRY_POLICY)?;
        summary.processed += 1;
    }

    Ok(summary)
}

/// Fetch one archive, retrying transient failures according to `policy`.
pub fn fetch(
    ctx: &Context,
    runner: &dyn ToolRunner,
    version: &QtVersion,
    policy: &RetryPolicy,
) -> Result<(), PipelineError> {
    let archive = version.archive_path(&ctx.cache_root);
    let part = part_path(&archive);
    let url = version.download_url(&ctx.mirror);

    output::detail(&format!("downloading {}", url));

    let mut attempt = 0;
    loop {
        attempt += 1;
        match fetch_once(ctx, runner, version, &url, attempt, policy) {
            Ok(()) => break,
            Err(PipelineError::TransientFetchError { code, .. }) if attempt < policy.max_attempts => {
                output::warning(&format!(
                    "transfer of Qt {} interrupted (curl exit {}), retrying ({}/{})",
                    version,
                    code,
                    attempt + 1,
                    policy.max_attempts
                ));
            }
            Err(PipelineError::TransientFetchError {
                version,
                url,
                code,
                attempt,
                stderr,
            }) => {
                return Err(PipelineError::FetchFailure {
                    version,
                    url,
                    code,
                    attempts: attempt,
                    stderr,
                });
            }
            Err(e) => return Err(e),
        }
    }

    if ctx.dry_run {
        return Ok(());
    }

    std::fs::rename(&part, &archive).map_err(|source| PipelineError::Io {
        path: archive.clone(),
        source,
    })?;
    output::detail(&format!("saved {}", archive.display()));
    Ok(())
}

fn fetch_once(
    ctx: &Context,
    runner: &dyn ToolRunner,
    version: &QtVersion,
    url: &str,
    attempt: u32,
    policy: &RetryPolicy,
) -> Result<(), PipelineError> {
    let part = part_path(&version.archive_path(&ctx.cache_root));
    let invocation = Invocation::new(CURL)
        .args(["-C", "-", "-L", "-f", "-o"])
        .arg(part.display())
        .arg(url);

    let out = invoke(
        ctx,
        runner,
        &invocation,
        &format!("fetching {}", version.archive_name()),
    )?;

    match policy.classify(out.exit_code) {
        ExitClass::Success => Ok(()),
        ExitClass::Retryable => Err(PipelineError::TransientFetchError {
            version: version.to_string(),
            url: url.to_string(),
            code: out.exit_code,
            attempt,
            stderr: out.stderr_tail(STDERR_TAIL_LINES),
        }),
        ExitClass::Fatal => Err(PipelineError::FetchFailure {
            version: version.to_string(),
            url: url.to_string(),
            code: out.exit_code,
            attempts: attempt,
            stderr: out.stderr_tail(STDERR_TAIL_LINES),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::testing::FakeRunner;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Context, QtVersion) {
        let dir = TempDir::new().unwrap();
        let ctx = Context::with_cache_root(dir.path());
        let version = QtVersion::parse("5.15.2").unwrap();
        (dir, ctx, version)
    }

    #[test]
    fn test_success_renames_part_file() {
        let (_dir, ctx, version) = setup();
        let runner = FakeRunner::new().with_curl_codes(&[0]);

        fetch(&ctx, &runner, &version, &CURL_RETRY_POLICY).unwrap();

        let archive = version.archive_path(&ctx.cache_root);
        assert!(archive.is_file());
        assert!(!part_path(&archive).exists());
        assert_eq!(runner.count("curl"), 1);
    }

    #[test]
    fn test_curl_arguments() {
        let (_dir, ctx, version) = setup();
        let runner = FakeRunner::new().with_curl_codes(&[0]);

        fetch(&ctx, &runner, &version, &CURL_RETRY_POLICY).unwrap();

        let calls = runner.calls();
        let args = &calls[0].args;
        let part = part_path(&version.archive_path(&ctx.cache_root));
        assert_eq!(&args[..5], ["-C", "-", "-L", "-f", "-o"]);
        assert_eq!(args[5], part.display().to_string());
        assert_eq!(args[6], version.download_url(&ctx.mirror));
    }

    #[test]
    fn test_transient_exit_retries_until_exhausted() {
        let (_dir, ctx, version) = setup();
        let runner = FakeRunner::new().with_curl_codes(&[56, 56, 56]);

        let err = fetch(&ctx, &runner, &version, &CURL_RETRY_POLICY).unwrap_err();

        assert_eq!(runner.count("curl"), 3);
        match err {
            PipelineError::FetchFailure { code, attempts, .. } => {
                assert_eq!(code, 56);
                assert_eq!(attempts, 3);
            }
            other => panic!("expected FetchFailure, got {:?}", other),
        }
        assert!(!version.archive_path(&ctx.cache_root).exists());
    }

    #[test]
    fn test_transient_exit_then_success() {
        let (_dir, ctx, version) = setup();
        let runner = FakeRunner::new().with_curl_codes(&[18, 56, 0]);

        fetch(&ctx, &runner, &version, &CURL_RETRY_POLICY).unwrap();

        assert_eq!(runner.count("curl"), 3);
        assert!(version.archive_path(&ctx.cache_root).is_file());
    }

    #[test]
    fn test_fatal_exit_is_not_retried() {
        let (_dir, ctx, version) = setup();
        let runner = FakeRunner::new().with_curl_codes(&[1]);

        let err = fetch(&ctx, &runner, &version, &CURL_RETRY_POLICY).unwrap_err();

        assert_eq!(runner.count("curl"), 1);
        match err {
            PipelineError::FetchFailure {
                code,
                attempts,
                url,
                version: v,
                ..
            } => {
                assert_eq!(code, 1);
                assert_eq!(attempts, 1);
                assert_eq!(v, "5.15.2");
                assert!(url.ends_with("qt-everywhere-src-5.15.2.tar.xz"));
            }
            other => panic!("expected FetchFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_fatal_after_transient_stops_immediately() {
        let (_dir, ctx, version) = setup();
        let runner = FakeRunner::new().with_curl_codes(&[56, 22, 0]);

        let err = fetch(&ctx, &runner, &version, &CURL_RETRY_POLICY).unwrap_err();

        assert_eq!(runner.count("curl"), 2);
        assert!(matches!(err, PipelineError::FetchFailure { code: 22, .. }));
    }

    #[test]
    fn test_stage_skips_present_archive() {
        let (_dir, ctx, version) = setup();
        std::fs::write(version.archive_path(&ctx.cache_root), b"xz").unwrap();
        let runner = FakeRunner::new();

        let summary = download(&ctx, &runner, &[version]).unwrap();

        assert_eq!(summary.processed, 0);
        assert_eq!(summary.skipped, 1);
        assert_eq!(runner.count("curl"), 0);
    }

    #[test]
    fn test_stage_skips_unpacked_version_without_archive() {
        let (_dir, ctx, version) = setup();
        std::fs::create_dir_all(version.unpack_path(&ctx.cache_root)).unwrap();
        let runner = FakeRunner::new();

        let summary = download(&ctx, &runner, &[version]).unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(runner.count("curl"), 0);
    }

    #[test]
    fn test_dry_run_leaves_disk_untouched() {
        let (_dir, ctx, version) = setup();
        let ctx = ctx.dry_run(true);
        let runner = FakeRunner::new();

        let summary = download(&ctx, &runner, &[version.clone()]).unwrap();

        assert_eq!(summary.processed, 1);
        assert_eq!(runner.count("curl"), 0);
        assert!(!version.archive_path(&ctx.cache_root).exists());
    }
}
