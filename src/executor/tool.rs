//! External tool invocation.
//!
//! Every external program (curl, tar, configure, make, qmake, the binding
//! generator) is described by an [`Invocation`] and executed through a
//! [`ToolRunner`], which returns the captured [`ToolOutput`]. Exit-code
//! classification lives in [`RetryPolicy`].

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A single external program call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory (inherited when `None`)
    pub cwd: Option<PathBuf>,
    /// Variables added to the inherited environment
    pub env: BTreeMap<String, String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl fmt::Display) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: fmt::Display,
    {
        self.args.extend(args.into_iter().map(|a| a.to_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn envs(mut self, env: BTreeMap<String, String>) -> Self {
        self.env.extend(env);
        self
    }

    /// Base name of the program, for matching in logs and tests
    pub fn program_name(&self) -> &str {
        Path::new(&self.program)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.program)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        if let Some(ref dir) = self.cwd {
            write!(f, " (in {})", dir.display())?;
        }
        Ok(())
    }
}

/// Captured result of a finished invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, or -1 when the process was killed by a signal
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success() -> Self {
        Self::default()
    }

    pub fn with_code(exit_code: i32) -> Self {
        Self {
            exit_code,
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// Last `lines` lines of stderr, for error reports
    pub fn stderr_tail(&self, lines: usize) -> String {
        let all: Vec<&str> = self.stderr.lines().collect();
        let start = all.len().saturating_sub(lines);
        all[start..].join("\n")
    }
}

/// Runs external programs.
pub trait ToolRunner {
    /// Run the invocation to completion and capture its output.
    ///
    /// `Err` means the program could not be started at all.
    fn run(&self, invocation: &Invocation) -> io::Result<ToolOutput>;

    /// Find an executable on `PATH`.
    fn locate(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }
}

/// Runs programs as child processes, capturing stdout and stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<ToolOutput> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .envs(&invocation.env)
            .stdin(Stdio::null());
        if let Some(ref dir) = invocation.cwd {
            cmd.current_dir(dir);
        }

        let output = cmd.output()?;
        Ok(ToolOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// How an exit code is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitClass {
    Success,
    Retryable,
    Fatal,
}

/// Retry policy for a flaky external tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Exit codes worth another attempt
    pub retryable: &'static [i32],
}

/// curl: 56 = failure receiving network data (peer closed), 18 = partial file
pub const CURL_RETRY_POLICY: RetryPolicy = RetryPolicy {
    max_attempts: 3,
    retryable: &[56, 18],
};

impl RetryPolicy {
    pub fn classify(&self, exit_code: i32) -> ExitClass {
        if exit_code == 0 {
            ExitClass::Success
        } else if self.retryable.contains(&exit_code) {
            ExitClass::Retryable
        } else {
            ExitClass::Fatal
        }
    }
}

/// Shell-quote a value for display.
pub fn shell_quote(s: impl fmt::Display) -> String {
    let s = s.to_string();
    if !s.is_empty()
        && s.chars().all(|c| {
            c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '=' | ',' | '+')
        })
    {
        s
    } else {
        format!("'{}'", s.replace('\'', "'\"'\"'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_curl_codes() {
        assert_eq!(CURL_RETRY_POLICY.classify(0), ExitClass::Success);
        assert_eq!(CURL_RETRY_POLICY.classify(56), ExitClass::Retryable);
        assert_eq!(CURL_RETRY_POLICY.classify(18), ExitClass::Retryable);
        assert_eq!(CURL_RETRY_POLICY.classify(1), ExitClass::Fatal);
        assert_eq!(CURL_RETRY_POLICY.classify(22), ExitClass::Fatal);
        assert_eq!(CURL_RETRY_POLICY.classify(-1), ExitClass::Fatal);
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("simple"), "simple");
        assert_eq!(shell_quote("/path/to/file"), "/path/to/file");
        assert_eq!(shell_quote("arch=x86_64"), "arch=x86_64");
        assert_eq!(shell_quote("has space"), "'has space'");
        assert_eq!(shell_quote("has'quote"), "'has'\"'\"'quote'");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_invocation_display() {
        let inv = Invocation::new("tar")
            .arg("-C")
            .arg("/my cache")
            .arg("-xf")
            .current_dir("/tmp");
        assert_eq!(inv.to_string(), "tar -C '/my cache' -xf (in /tmp)");
    }

    #[test]
    fn test_program_name() {
        assert_eq!(Invocation::new("/usr/bin/curl").program_name(), "curl");
        assert_eq!(Invocation::new("./configure").program_name(), "configure");
    }

    #[test]
    fn test_stderr_tail() {
        let out = ToolOutput {
            exit_code: 2,
            stdout: String::new(),
            stderr: "a\nb\nc\nd\n".to_string(),
        };
        assert_eq!(out.stderr_tail(2), "c\nd");
        assert_eq!(out.stderr_tail(10), "a\nb\nc\nd");
    }

    #[test]
    fn test_system_runner_exit_codes() {
        let runner = SystemRunner;
        let ok = runner.run(&Invocation::new("true")).unwrap();
        assert!(ok.is_success());

        let failed = runner.run(&Invocation::new("false")).unwrap();
        assert_eq!(failed.exit_code, 1);

        let custom = runner
            .run(&Invocation::new("sh").arg("-c").arg("exit 56"))
            .unwrap();
        assert_eq!(custom.exit_code, 56);
    }

    #[test]
    fn test_system_runner_captures_output_and_env() {
        let runner = SystemRunner;
        let mut env = BTreeMap::new();
        env.insert("QTPREP_TEST_VALUE".to_string(), "hello".to_string());
        let out = runner
            .run(
                &Invocation::new("sh")
                    .arg("-c")
                    .arg("echo $QTPREP_TEST_VALUE; echo oops >&2; pwd")
                    .current_dir("/")
                    .envs(env),
            )
            .unwrap();
        assert_eq!(out.stdout, "hello\n/\n");
        assert_eq!(out.stderr, "oops\n");
    }

    #[test]
    fn test_system_runner_missing_program() {
        let runner = SystemRunner;
        let result = runner.run(&Invocation::new("qtprep-definitely-not-installed"));
        assert!(result.is_err());
    }

    #[test]
    fn test_locate_via_path() {
        assert!(SystemRunner.locate("sh").is_some());
        assert!(SystemRunner
            .locate("qtprep-definitely-not-installed")
            .is_none());
    }
}
