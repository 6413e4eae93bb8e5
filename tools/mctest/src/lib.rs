//! mctest - conformance runner for the mccomp compiler.
//!
//! Builds the compiler under test, then pushes every annotated program in the
//! suite through the native toolchain and checks what it prints.
//!
//! # Architecture
//!
//! ```text
//! build descriptor ──► CompilerBuilder ──► mccomp
//!                                            │
//! Workspace (tmp/) ◄── staged mccomp + driver.cpp
//!     │
//!     ▼
//! discover_tests() ──► TestCase (expectation header)
//!     │
//!     ▼
//! PipelineExecutor: compile ──► link ──► execute ──► compare
//!     │
//!     ▼
//! Reporter ──► "Passed test X" / "Failed test X. Reason: Y" / "ALL PASSED"
//! ```
//!
//! Every test runs serially inside one workspace; per-test artifacts share
//! fixed names and are cleared before each test.

pub mod builder;
pub mod config;
pub mod error;
pub mod process;
pub mod workspace;

pub use builder::CompilerBuilder;
pub use config::RunnerConfig;
pub use error::{HarnessError, FATAL_EXIT_CODE};
pub use test::{
    discover_tests, FailReason, Outcome, PipelineExecutor, Reporter, RunSummary, Stage, TestCase,
    TestFile, TestResult, TestRunner,
};
pub use workspace::Workspace;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for diagnostic output on stderr.
///
/// Safe to call multiple times. `RUST_LOG` takes precedence; without it,
/// `verbose` enables `mctest=debug` and otherwise nothing is installed.
pub fn init_tracing(verbose: bool) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if verbose {
            EnvFilter::new("mctest=debug")
        } else {
            return;
        };

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(filter)
            .init();
    });
}
