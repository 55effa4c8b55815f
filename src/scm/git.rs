//! Git SCM backend using CLI commands.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{CommandOutput, Scm};
use crate::credentials::display_url;

/// Git SCM implementation using the git CLI.
pub struct GitScm {
    workdir: PathBuf,
}

impl GitScm {
    /// Open an existing Git repository.
    pub fn open(path: &Path) -> Result<Self> {
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if !path.join(".git").exists() {
            return Err(anyhow!(
                "Not a git repository: '{}' (no .git directory)",
                path.display()
            ));
        }

        Ok(Self { workdir: path })
    }

    /// Initialize a new Git repository with `branch` as its initial branch.
    pub fn init(path: &Path, branch: &str) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory '{}'", path.display()))?;

        let output = Command::new("git")
            .args(["init"])
            .current_dir(path)
            .output()
            .context("Failed to run 'git init'")?;

        if !output.status.success() {
            return Err(anyhow!(
                "git init failed: {}",
                String::from_utf8_lossy(&output.stderr)
            ));
        }

        // Works on any git version, unlike `init -b`
        let head = format!("refs/heads/{branch}");
        let output = Command::new("git")
            .args(["symbolic-ref", "HEAD", &head])
            .current_dir(path)
            .output()
            .context("Failed to run 'git symbolic-ref'")?;

        if !output.status.success() {
            return Err(anyhow!(
                "Failed to point HEAD at '{}': {}",
                branch,
                String::from_utf8_lossy(&output.stderr)
            ));
        }

        Self::open(path)
    }

    /// Run a git command and capture its result. `shown` is what gets logged.
    fn run(&self, args: &[&str], shown: &str) -> Result<CommandOutput> {
        log::debug!("git {shown}");

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .with_context(|| format!("Failed to run 'git {shown}'"))?;

        let result = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        };

        if !result.success() {
            log::trace!("git {shown} exited with {:?}", result.code);
        }

        Ok(result)
    }

    fn run_args(&self, args: &[&str]) -> Result<CommandOutput> {
        self.run(args, &args.join(" "))
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl Scm for GitScm {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn current_branch(&self) -> Result<CommandOutput> {
        self.run_args(&["branch", "--show-current"])
    }

    fn checkout(&self, branch: &str) -> Result<CommandOutput> {
        self.run_args(&["checkout", branch])
    }

    fn add(&self, path: &Path) -> Result<CommandOutput> {
        let path = path_arg(path);
        self.run_args(&["add", "--", &path])
    }

    fn diff_cached_quiet(&self, path: &Path) -> Result<CommandOutput> {
        let path = path_arg(path);
        self.run_args(&["diff", "--cached", "--quiet", "--", &path])
    }

    fn commit(&self, message: &str, path: &Path) -> Result<CommandOutput> {
        let path = path_arg(path);
        self.run_args(&["commit", "-m", message, "--", &path])
    }

    fn head_commit(&self) -> Result<CommandOutput> {
        self.run_args(&["rev-parse", "HEAD"])
    }

    fn remote_get_url(&self, name: &str) -> Result<CommandOutput> {
        // stdout carries the URL, so the caller decides whether to show it
        self.run_args(&["remote", "get-url", name])
    }

    fn remote_add(&self, name: &str, url: &str) -> Result<CommandOutput> {
        let shown = format!("remote add {name} {}", display_url(url));
        self.run(&["remote", "add", name, url], &shown)
    }

    fn remote_set_url(&self, name: &str, url: &str) -> Result<CommandOutput> {
        let shown = format!("remote set-url {name} {}", display_url(url));
        self.run(&["remote", "set-url", name, url], &shown)
    }

    fn push(&self, remote: &str, branch: &str) -> Result<CommandOutput> {
        self.run_args(&["push", remote, branch])
    }

    fn config_get(&self, key: &str) -> Result<CommandOutput> {
        self.run_args(&["config", "--get", key])
    }

    fn config_set(&self, key: &str, value: &str) -> Result<CommandOutput> {
        self.run_args(&["config", key, value])
    }
}
