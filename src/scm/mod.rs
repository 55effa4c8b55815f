//! SCM (Source Control Management) abstraction layer.
//!
//! The commit pipeline only needs a handful of git operations. They are
//! exposed through [`Scm`] so the pipeline can be driven by the real git CLI
//! or by an in-memory fake in tests.

#[cfg(test)]
pub(crate) mod fake;
mod git;

use anyhow::{anyhow, Result};
use std::path::Path;

pub use git::GitScm;

/// Structured result of one version-control command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        CommandOutput {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        CommandOutput {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Best human-readable explanation of a failure.
    pub fn detail(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        match self.code {
            Some(code) => format!("exited with status {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Version-control operations used by the commit pipeline.
///
/// `Err` means the command could not be run at all. A command that ran and
/// failed comes back as `Ok` with a non-zero [`CommandOutput::code`].
pub trait Scm: Send + Sync {
    /// Root of the working tree.
    fn workdir(&self) -> &Path;

    /// Name of the checked-out branch (empty when HEAD is detached).
    fn current_branch(&self) -> Result<CommandOutput>;

    /// Switch the working tree to `branch`.
    fn checkout(&self, branch: &str) -> Result<CommandOutput>;

    /// Stage exactly one path.
    fn add(&self, path: &Path) -> Result<CommandOutput>;

    /// Compare the index against HEAD for one path.
    /// Exit code 0 means unchanged, 1 means changed.
    fn diff_cached_quiet(&self, path: &Path) -> Result<CommandOutput>;

    /// Commit the staged state of `path` only.
    fn commit(&self, message: &str, path: &Path) -> Result<CommandOutput>;

    /// Full identifier of HEAD.
    fn head_commit(&self) -> Result<CommandOutput>;

    /// URL of a remote. Fails when the remote does not exist.
    fn remote_get_url(&self, name: &str) -> Result<CommandOutput>;

    fn remote_add(&self, name: &str, url: &str) -> Result<CommandOutput>;

    fn remote_set_url(&self, name: &str, url: &str) -> Result<CommandOutput>;

    /// Push `branch` to the same branch on `remote`. Never forces.
    fn push(&self, remote: &str, branch: &str) -> Result<CommandOutput>;

    /// Read a configuration value. Fails when the key is unset.
    fn config_get(&self, key: &str) -> Result<CommandOutput>;

    /// Set a repository-scoped configuration value.
    fn config_set(&self, key: &str, value: &str) -> Result<CommandOutput>;
}

/// Check if a directory is a Git repository.
pub fn is_repo(path: &Path) -> bool {
    path.join(".git").exists()
}

/// Open an existing Git repository.
pub fn open(path: &Path) -> Result<Box<dyn Scm>> {
    if is_repo(path) {
        Ok(Box::new(GitScm::open(path)?))
    } else {
        Err(anyhow!(
            "No Git repository found at '{}'. Expected .git directory.",
            path.display()
        ))
    }
}

/// Initialize a new Git repository whose unborn HEAD points at `branch`.
pub fn init(path: &Path, branch: &str) -> Result<Box<dyn Scm>> {
    Ok(Box::new(GitScm::init(path, branch)?))
}
