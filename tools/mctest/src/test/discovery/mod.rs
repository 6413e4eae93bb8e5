//! Test file discovery.
//!
//! Lists the test directory (non-recursively) and keeps regular files whose
//! name ends in [`TEST_SUFFIX`]. Everything else is ignored.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::HarnessError;

/// Suffix that marks a test program.
pub const TEST_SUFFIX: &str = ".c";

/// A discovered test file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestFile {
    /// Path to the test file.
    pub path: PathBuf,
}

impl TestFile {
    pub fn new(path: PathBuf) -> Self {
        TestFile { path }
    }
}

/// Discover all test files in `dir`.
///
/// # Returns
/// Discovered test files, sorted by path so runs are reproducible.
pub fn discover_tests(dir: &Path) -> Result<Vec<TestFile>, HarnessError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| HarnessError::setup("cannot list test directory", dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| HarnessError::setup("cannot list test directory", dir, e))?;
        let path = entry.path();
        if path.is_file() && is_test_file(&path) {
            files.push(TestFile::new(path));
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!(dir = %dir.display(), count = files.len(), "discovered tests");
    Ok(files)
}

fn is_test_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(TEST_SUFFIX))
}
