//! Fatal harness errors.
//!
//! Anything here aborts the whole run. Per-test failures are not errors; they
//! are [`crate::FailReason`] values carried by an [`crate::Outcome`].

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Exit status used when the run aborts on a [`HarnessError`].
pub const FATAL_EXIT_CODE: u8 = 2;

/// Error that stops the run before or between tests.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The workspace, support file, or test directory could not be prepared.
    #[error("{context} '{}': {source}", .path.display())]
    Setup {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The compiler under test could not be built.
    #[error("failed to build compiler in '{}': {detail}", .dir.display())]
    Build { dir: PathBuf, detail: String },

    /// A discovered test file could not be read.
    #[error("cannot read test file '{}': {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The linked test program could not be run to completion.
    #[error("test executable for '{test}' {detail}")]
    Execute { test: String, detail: String },

    /// Writing the console report failed.
    #[error("cannot write report: {0}")]
    Report(#[from] io::Error),
}

impl HarnessError {
    #[cold]
    pub fn setup(context: &'static str, path: &Path, source: io::Error) -> Self {
        HarnessError::Setup {
            context,
            path: path.to_path_buf(),
            source,
        }
    }

    #[cold]
    pub fn build(dir: &Path, detail: impl Into<String>) -> Self {
        HarnessError::Build {
            dir: dir.to_path_buf(),
            detail: detail.into(),
        }
    }
}
