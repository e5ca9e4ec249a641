//! System-probe mode
//!
//! Targets a Qt that is already installed instead of building one. The
//! installation is described by `qmake -query`, whose output looks like:
//!
//! ```text
//! QT_INSTALL_PREFIX:/usr
//! QT_INSTALL_HEADERS:/usr/include/qt5
//! QT_INSTALL_LIBS:/usr/lib64
//! QT_VERSION:5.15.2
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::core::platform::{Platform, PlatformSpec};
use crate::core::version::VersionError;
use crate::executor::{Invocation, ToolRunner};

/// qmake executable names, in lookup order
pub const QMAKE_CANDIDATES: &[&str] = &["qmake-qt5", "qmake"];

const KEY_PREFIX: &str = "QT_INSTALL_PREFIX";
const KEY_HEADERS: &str = "QT_INSTALL_HEADERS";
const KEY_LIBS: &str = "QT_INSTALL_LIBS";
const KEY_VERSION: &str = "QT_VERSION";

/// Errors raised while probing an installed Qt.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("no qmake found on PATH (tried: {})", .candidates.join(", "))]
    ToolNotFound { candidates: Vec<String> },

    #[error("failed to run {}: {source}", .tool.display())]
    Spawn {
        tool: PathBuf,
        source: std::io::Error,
    },

    #[error("{} -query failed (exit code {code}): {stderr}", .tool.display())]
    QueryFailed {
        tool: PathBuf,
        code: i32,
        stderr: String,
    },

    #[error("{} -query did not report {}", .tool.display(), .missing.join(", "))]
    IncompleteProbeResult {
        tool: PathBuf,
        missing: Vec<&'static str>,
    },

    #[error(transparent)]
    Version(#[from] VersionError),
}

/// Values read from `qmake -query`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub prefix: PathBuf,
    pub headers: PathBuf,
    pub libs: PathBuf,
    /// `major.minor`
    pub version: String,
}

/// Parse `KEY:value` lines. On failure returns the missing keys.
pub fn parse_query_output(text: &str) -> Result<ProbeResult, Vec<&'static str>> {
    let mut prefix = None;
    let mut headers = None;
    let mut libs = None;
    let mut version = None;

    for line in text.lines() {
        let Some((key, value)) = line.trim().split_once(':') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match key {
            KEY_PREFIX => prefix = Some(PathBuf::from(value)),
            KEY_HEADERS => headers = Some(PathBuf::from(value)),
            KEY_LIBS => libs = Some(PathBuf::from(value)),
            KEY_VERSION => version = Some(minor_precision(value)),
            _ => {}
        }
    }

    match (prefix, headers, libs, version) {
        (Some(prefix), Some(headers), Some(libs), Some(version)) => Ok(ProbeResult {
            prefix,
            headers,
            libs,
            version,
        }),
        (prefix, headers, libs, version) => {
            let mut missing = Vec::new();
            if prefix.is_none() {
                missing.push(KEY_PREFIX);
            }
            if headers.is_none() {
                missing.push(KEY_HEADERS);
            }
            if libs.is_none() {
                missing.push(KEY_LIBS);
            }
            if version.is_none() {
                missing.push(KEY_VERSION);
            }
            Err(missing)
        }
    }
}

/// `5.15.2` -> `5.15`
fn minor_precision(version: &str) -> String {
    version.splitn(3, '.').take(2).collect::<Vec<_>>().join(".")
}

/// Locate qmake and query it.
pub fn probe(runner: &dyn ToolRunner) -> Result<(PathBuf, ProbeResult), ProbeError> {
    let tool = QMAKE_CANDIDATES
        .iter()
        .find_map(|name| runner.locate(name))
        .ok_or_else(|| ProbeError::ToolNotFound {
            candidates: QMAKE_CANDIDATES.iter().map(|s| s.to_string()).collect(),
        })?;

    let invocation = Invocation::new(tool.display().to_string()).arg("-query");
    let out = runner.run(&invocation).map_err(|source| ProbeError::Spawn {
        tool: tool.clone(),
        source,
    })?;
    if !out.is_success() {
        return Err(ProbeError::QueryFailed {
            tool,
            code: out.exit_code,
            stderr: out.stderr.trim().to_string(),
        });
    }

    match parse_query_output(&out.stdout) {
        Ok(result) => Ok((tool, result)),
        Err(missing) => Err(ProbeError::IncompleteProbeResult { tool, missing }),
    }
}

/// Build the single platform of system-probe mode from the installed Qt.
pub fn probe_platform(runner: &dyn ToolRunner) -> Result<Platform, ProbeError> {
    let (tool, found) = probe(runner)?;

    let spec = host_spec(&found.version);
    let platform = Platform::from_spec(&spec, &found.prefix)?
        .with_install_root(&found.prefix)
        .with_qmake(tool)
        .with_lib_dir(&found.libs)
        .with_include_dir(&found.headers);
    Ok(platform)
}

/// Platform record describing the machine this binary runs on.
pub fn host_spec(version: &str) -> PlatformSpec {
    PlatformSpec::new(
        std::env::consts::OS,
        host_libc(),
        std::env::consts::ARCH,
        version,
        env!("QTPREP_HOST_TRIPLE"),
        std::mem::size_of::<usize>() as u32,
        if cfg!(target_endian = "big") {
            "big"
        } else {
            "little"
        },
    )
}

fn host_libc() -> &'static str {
    if cfg!(target_env = "musl") {
        "musl"
    } else if cfg!(target_env = "gnu") {
        "gnu"
    } else if cfg!(target_env = "msvc") {
        "msvc"
    } else {
        "none"
    }
}
