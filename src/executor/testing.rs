//! Scripted tool runner for unit and integration tests.
//!
//! Records every invocation and simulates the on-disk effects of a
//! successful curl, tar and configure run.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};

use super::tool::{Invocation, ToolOutput, ToolRunner};

#[derive(Default)]
pub struct FakeRunner {
    calls: RefCell<Vec<Invocation>>,
    curl_codes: RefCell<VecDeque<i32>>,
    exit_codes: HashMap<String, i32>,
    stdout: HashMap<String, String>,
    on_path: HashMap<String, PathBuf>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exit codes returned by successive curl calls (0 once exhausted)
    pub fn with_curl_codes(self, codes: &[i32]) -> Self {
        self.curl_codes.borrow_mut().extend(codes.iter().copied());
        self
    }

    /// Exit code for every call of `program`
    pub fn with_exit(mut self, program: &str, code: i32) -> Self {
        self.exit_codes.insert(program.to_string(), code);
        self
    }

    pub fn with_stdout(mut self, program: &str, stdout: &str) -> Self {
        self.stdout.insert(program.to_string(), stdout.to_string());
        self
    }

    pub fn with_on_path(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.on_path.insert(name.to_string(), path.into());
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, program: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.program_name() == program)
            .count()
    }

    fn simulate(&self, invocation: &Invocation) -> io::Result<()> {
        match invocation.program_name() {
            "curl" => {
                if let Some(pos) = invocation.args.iter().position(|a| a == "-o")
                    && let Some(target) = invocation.args.get(pos + 1)
                {
                    std::fs::write(target, b"archive")?;
                }
            }
            "tar" => {
                if let [_, root, _, archive, ..] = invocation.args.as_slice() {
                    let name = Path::new(archive)
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or_default();
                    let stem = name.trim_end_matches(".tar.xz");
                    std::fs::create_dir_all(Path::new(root).join(stem))?;
                }
            }
            "configure" => {
                if let Some(ref cwd) = invocation.cwd {
                    write_executable(&cwd.join("qtbase/bin/qmake"))?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl ToolRunner for FakeRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<ToolOutput> {
        self.calls.borrow_mut().push(invocation.clone());
        let name = invocation.program_name().to_string();

        let code = if name == "curl" {
            self.curl_codes.borrow_mut().pop_front().unwrap_or(0)
        } else {
            self.exit_codes.get(&name).copied().unwrap_or(0)
        };

        if code == 0 {
            self.simulate(invocation)?;
        }

        Ok(ToolOutput {
            exit_code: code,
            stdout: self.stdout.get(&name).cloned().unwrap_or_default(),
            stderr: if code == 0 {
                String::new()
            } else {
                format!("{} failed with {}", name, code)
            },
        })
    }

    fn locate(&self, name: &str) -> Option<PathBuf> {
        self.on_path.get(name).cloned()
    }
}

/// Create an executable file (and its parent directories).
pub fn write_executable(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, "#!/bin/sh\n")?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}
