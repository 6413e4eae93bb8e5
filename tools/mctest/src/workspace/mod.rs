//! Scratch workspace for a conformance run.
//!
//! The workspace holds the staged compiler, the staged support file, and the
//! per-test artifacts. It is removed when the [`Workspace`] is released or
//! dropped, so an aborted run leaves nothing behind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::HarnessError;

/// A directory owned exclusively by one run.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    released: bool,
}

impl Workspace {
    /// Create a fresh workspace at `root`, removing any stale one first.
    pub fn acquire(root: impl Into<PathBuf>) -> Result<Self, HarnessError> {
        let root = root.into();

        remove_tree(&root)
            .map_err(|e| HarnessError::setup("cannot remove stale workspace", &root, e))?;
        fs::create_dir(&root)
            .map_err(|e| HarnessError::setup("cannot create workspace", &root, e))?;

        tracing::debug!(path = %root.display(), "workspace acquired");
        Ok(Workspace {
            root,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Path of a file inside the workspace.
    pub fn artifact(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Copy `source` into the workspace as `name`.
    pub fn stage(&self, source: &Path, name: &str) -> Result<PathBuf, HarnessError> {
        let dest = self.artifact(name);
        fs::copy(source, &dest)
            .map_err(|e| HarnessError::setup("cannot stage file", source, e))?;
        tracing::debug!(from = %source.display(), to = %dest.display(), "staged");
        Ok(dest)
    }

    /// Copy `source` into the workspace and set its execute bits.
    pub fn stage_executable(&self, source: &Path, name: &str) -> Result<PathBuf, HarnessError> {
        let dest = self.stage(source, name)?;
        make_executable(&dest)
            .map_err(|e| HarnessError::setup("cannot mark executable", &dest, e))?;
        Ok(dest)
    }

    /// Remove per-test artifacts left by the previous test.
    pub fn clear_artifacts(&self, names: &[&str]) -> Result<(), HarnessError> {
        for name in names {
            let path = self.artifact(name);
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(HarnessError::setup("cannot clear artifact", &path, e)),
            }
        }
        Ok(())
    }

    /// Remove the workspace now, reporting failure instead of logging it.
    pub fn release(mut self) -> Result<(), HarnessError> {
        self.released = true;
        remove_tree(&self.root)
            .map_err(|e| HarnessError::setup("cannot remove workspace", &self.root, e))?;
        tracing::debug!(path = %self.root.display(), "workspace released");
        Ok(())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = remove_tree(&self.root) {
            tracing::warn!(path = %self.root.display(), "failed to remove workspace: {e}");
        }
    }
}

/// `remove_dir_all` that treats a missing directory as already removed.
fn remove_tree(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}
