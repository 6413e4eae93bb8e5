//! Runner configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default per-step deadline for compile, link, and execute.
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for a conformance run.
///
/// File names are resolved against the suite root (`tests_dir`,
/// `workspace_dir`, `support_file`) or the workspace (`intermediate`,
/// `executable`). Program names are looked up on `PATH` unless absolute.
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// Directory holding the support file and the test directory.
    pub suite_root: PathBuf,
    /// Test directory, relative to the suite root.
    pub tests_dir: String,
    /// Scratch workspace, relative to the suite root.
    pub workspace_dir: String,
    /// Support source linked with every test (supplies `main`).
    pub support_file: String,
    /// Name of the compiler executable produced by the build.
    pub compiler_name: String,
    /// Build tool run in the build descriptor's directory.
    pub build_tool: String,
    /// Native compiler used for the link step.
    pub native_compiler: String,
    /// Intermediate artifact the compiler writes into its working directory.
    pub intermediate: String,
    /// Executable produced by the link step.
    pub executable: String,
    /// Deadline for each compile/link/execute step. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            suite_root: PathBuf::from("."),
            tests_dir: "tests".to_string(),
            workspace_dir: "tmp".to_string(),
            support_file: "driver.cpp".to_string(),
            compiler_name: "mccomp".to_string(),
            build_tool: "make".to_string(),
            native_compiler: "clang++".to_string(),
            intermediate: "output.ll".to_string(),
            executable: "out".to_string(),
            timeout: Some(DEFAULT_STEP_TIMEOUT),
        }
    }
}

impl RunnerConfig {
    /// Set the step timeout from seconds; zero disables it.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = (secs > 0).then_some(Duration::from_secs(secs));
        self
    }

    pub fn tests_path(&self, suite_root: &Path) -> PathBuf {
        suite_root.join(&self.tests_dir)
    }

    pub fn workspace_path(&self, suite_root: &Path) -> PathBuf {
        suite_root.join(&self.workspace_dir)
    }

    pub fn support_path(&self, suite_root: &Path) -> PathBuf {
        suite_root.join(&self.support_file)
    }
}
