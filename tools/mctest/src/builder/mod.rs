//! Building the compiler under test.
//!
//! The build tool runs with its default target in the directory that holds
//! the build descriptor. Its stdout is discarded; stderr is kept so a failed
//! build can say why.

use std::path::{Path, PathBuf};

use crate::config::RunnerConfig;
use crate::error::HarnessError;
use crate::process::{Invocation, ProcessResult, Stream};

/// Lines of build-tool stderr kept in a [`HarnessError::Build`].
const STDERR_TAIL_LINES: usize = 20;

/// Builds the compiler under test with an external build tool.
#[derive(Clone, Debug)]
pub struct CompilerBuilder {
    build_tool: String,
    compiler_name: String,
}

impl CompilerBuilder {
    pub fn new(build_tool: impl Into<String>, compiler_name: impl Into<String>) -> Self {
        CompilerBuilder {
            build_tool: build_tool.into(),
            compiler_name: compiler_name.into(),
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(&config.build_tool, &config.compiler_name)
    }

    /// Run the build next to `descriptor` and return the compiler's path.
    pub fn build(&self, descriptor: &Path) -> Result<PathBuf, HarnessError> {
        let dir = build_dir(descriptor);
        tracing::info!(dir = %dir.display(), tool = %self.build_tool, "building compiler");

        let result = Invocation::new(&self.build_tool, &dir)
            .stdout(Stream::Discard)
            .stderr(Stream::Capture)
            .run();

        match result {
            ProcessResult::Completed { status, .. } if status.success() => {}
            ProcessResult::Completed { status, stderr, .. } => {
                let mut detail = format!("'{}' failed ({status})", self.build_tool);
                let tail = stderr_tail(&stderr);
                if !tail.is_empty() {
                    detail.push_str("\n\n");
                    detail.push_str(&tail);
                }
                return Err(HarnessError::build(&dir, detail));
            }
            ProcessResult::LaunchFailed { error } => {
                return Err(HarnessError::build(
                    &dir,
                    format!("could not launch '{}': {error}", self.build_tool),
                ));
            }
            ProcessResult::TimedOut { .. } => {
                return Err(HarnessError::build(
                    &dir,
                    format!("'{}' timed out", self.build_tool),
                ));
            }
        }

        let compiler = dir.join(&self.compiler_name);
        if !compiler.is_file() {
            return Err(HarnessError::build(
                &dir,
                format!(
                    "build succeeded but '{}' was not produced",
                    compiler.display()
                ),
            ));
        }

        tracing::debug!(compiler = %compiler.display(), "compiler built");
        Ok(compiler)
    }
}

/// Directory containing the build descriptor; a bare file name means `.`.
pub fn build_dir(descriptor: &Path) -> PathBuf {
    match descriptor.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.trim_end().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
