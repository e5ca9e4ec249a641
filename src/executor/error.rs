//! Pipeline error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::version::VersionError;
use crate::probe::ProbeError;

/// Errors that abort a run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error("transient fetch error for Qt {version} (exit code {code}, attempt {attempt})")]
    TransientFetchError {
        version: String,
        url: String,
        code: i32,
        attempt: u32,
        stderr: String,
    },

    #[error(
        "download of Qt {version} failed (exit code {code}, {attempts} attempt(s))\n  url: {url}{}",
        note(.stderr)
    )]
    FetchFailure {
        version: String,
        url: String,
        code: i32,
        attempts: u32,
        stderr: String,
    },

    #[error(
        "unpacking Qt {version} failed (exit code {code})\n  archive: {}{}",
        .archive.display(),
        note(.stderr)
    )]
    ExtractionFailure {
        version: String,
        archive: PathBuf,
        code: i32,
        stderr: String,
    },

    #[error(
        "configure of Qt {version} failed (exit code {code})\n  in: {}{}",
        .tree.display(),
        note(.stderr)
    )]
    ConfigureFailure {
        version: String,
        tree: PathBuf,
        code: i32,
        stderr: String,
    },

    #[error(
        "header generation for Qt {version} failed (exit code {code})\n  in: {}{}",
        .tree.display(),
        note(.stderr)
    )]
    BuildHeaderFailure {
        version: String,
        tree: PathBuf,
        code: i32,
        stderr: String,
    },

    #[error(
        "binding generation for {platform} (Qt {version}) failed (exit code {code}){}",
        note(.stderr)
    )]
    GeneratorFailure {
        platform: String,
        version: String,
        code: i32,
        stderr: String,
    },

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Process exit code for this failure: 1 for generation, 2 for everything
    /// that happens before it.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::GeneratorFailure { .. } => 1,
            _ => 2,
        }
    }
}

fn note(stderr: &str) -> String {
    if stderr.trim().is_empty() {
        String::new()
    } else {
        format!("\n  stderr: {}", stderr.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let generator = PipelineError::GeneratorFailure {
            platform: "linux-gnu-x86_64-qt5.15.2".into(),
            version: "5.15.2".into(),
            code: 3,
            stderr: String::new(),
        };
        assert_eq!(generator.exit_code(), 1);

        let fetch = PipelineError::FetchFailure {
            version: "5.15.2".into(),
            url: "https://example.org/qt.tar.xz".into(),
            code: 1,
            attempts: 1,
            stderr: String::new(),
        };
        assert_eq!(fetch.exit_code(), 2);
    }

    #[test]
    fn test_messages_name_version_and_context() {
        let err = PipelineError::FetchFailure {
            version: "5.9.0".into(),
            url: "https://example.org/qt.tar.xz".into(),
            code: 56,
            attempts: 3,
            stderr: "curl: (56) Recv failure\n".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("5.9.0"));
        assert!(msg.contains("https://example.org/qt.tar.xz"));
        assert!(msg.contains("3 attempt(s)"));
        assert!(msg.contains("Recv failure"));

        let err = PipelineError::ConfigureFailure {
            version: "5.12.0".into(),
            tree: PathBuf::from("/cache/qt-everywhere-src-5.12.0"),
            code: 1,
            stderr: String::new(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/cache/qt-everywhere-src-5.12.0"));
        assert!(!msg.contains("stderr"));
    }
}
