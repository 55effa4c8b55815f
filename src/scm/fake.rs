//! In-memory [`Scm`] used by pipeline unit tests.
//!
//! Tracks the staged and committed bytes of each path so the no-op check
//! behaves like git's, and lets a test make any single operation fail.

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{CommandOutput, Scm};

#[derive(Default)]
struct FakeState {
    branch: String,
    staged: HashMap<PathBuf, Vec<u8>>,
    committed: HashMap<PathBuf, Vec<u8>>,
    commits: Vec<String>,
    remotes: HashMap<String, String>,
    config: HashMap<String, String>,
    pushed: Vec<(String, String)>,
    calls: Vec<String>,
}

pub(crate) struct FakeScm {
    workdir: PathBuf,
    state: Mutex<FakeState>,
    fail_on: Mutex<Option<&'static str>>,
    spawn_error_on: Mutex<Option<&'static str>>,
}

impl FakeScm {
    pub(crate) fn new(workdir: &Path, branch: &str) -> Self {
        FakeScm {
            workdir: workdir.to_path_buf(),
            state: Mutex::new(FakeState {
                branch: branch.to_string(),
                ..Default::default()
            }),
            fail_on: Mutex::new(None),
            spawn_error_on: Mutex::new(None),
        }
    }

    /// Make the named operation exit with git's fatal status (128).
    pub(crate) fn fail_on(&self, op: &'static str) {
        *self.fail_on.lock().unwrap() = Some(op);
    }

    /// Make the named operation fail to spawn.
    pub(crate) fn spawn_error_on(&self, op: &'static str) {
        *self.spawn_error_on.lock().unwrap() = Some(op);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn commit_count(&self) -> usize {
        self.state.lock().unwrap().commits.len()
    }

    pub(crate) fn remote_url(&self, name: &str) -> Option<String> {
        self.state.lock().unwrap().remotes.get(name).cloned()
    }

    pub(crate) fn config_value(&self, key: &str) -> Option<String> {
        self.state.lock().unwrap().config.get(key).cloned()
    }

    pub(crate) fn set_config(&self, key: &str, value: &str) {
        self.state
            .lock()
            .unwrap()
            .config
            .insert(key.to_string(), value.to_string());
    }

    pub(crate) fn pushes(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().pushed.clone()
    }

    fn enter(&self, op: &'static str) -> Result<Option<CommandOutput>> {
        self.state.lock().unwrap().calls.push(op.to_string());
        if *self.spawn_error_on.lock().unwrap() == Some(op) {
            return Err(anyhow!("Failed to run 'git {op}'"));
        }
        if *self.fail_on.lock().unwrap() == Some(op) {
            return Ok(Some(CommandOutput::failed(128, format!("fatal: {op} failed"))));
        }
        Ok(None)
    }
}

impl Scm for FakeScm {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn current_branch(&self) -> Result<CommandOutput> {
        if let Some(out) = self.enter("branch")? {
            return Ok(out);
        }
        Ok(CommandOutput::ok(self.state.lock().unwrap().branch.clone()))
    }

    fn checkout(&self, branch: &str) -> Result<CommandOutput> {
        if let Some(out) = self.enter("checkout")? {
            return Ok(out);
        }
        self.state.lock().unwrap().branch = branch.to_string();
        Ok(CommandOutput::ok(""))
    }

    fn add(&self, path: &Path) -> Result<CommandOutput> {
        if let Some(out) = self.enter("add")? {
            return Ok(out);
        }
        let bytes = std::fs::read(self.workdir.join(path))?;
        self.state
            .lock()
            .unwrap()
            .staged
            .insert(path.to_path_buf(), bytes);
        Ok(CommandOutput::ok(""))
    }

    fn diff_cached_quiet(&self, path: &Path) -> Result<CommandOutput> {
        if let Some(out) = self.enter("diff")? {
            return Ok(out);
        }
        let state = self.state.lock().unwrap();
        let same = state.staged.get(path) == state.committed.get(path);
        Ok(if same {
            CommandOutput::ok("")
        } else {
            CommandOutput::failed(1, "")
        })
    }

    fn commit(&self, _message: &str, path: &Path) -> Result<CommandOutput> {
        if let Some(out) = self.enter("commit")? {
            return Ok(out);
        }
        let mut state = self.state.lock().unwrap();
        if !state.config.contains_key("user.name") || !state.config.contains_key("user.email") {
            return Ok(CommandOutput::failed(128, "Please tell me who you are."));
        }
        match state.staged.get(path).cloned() {
            Some(bytes) if state.committed.get(path) != Some(&bytes) => {
                state.committed.insert(path.to_path_buf(), bytes);
                let id = format!("{:040x}", state.commits.len() + 1);
                state.commits.push(id);
                Ok(CommandOutput::ok(""))
            }
            _ => Ok(CommandOutput::failed(1, "nothing to commit, working tree clean")),
        }
    }

    fn head_commit(&self) -> Result<CommandOutput> {
        if let Some(out) = self.enter("rev-parse")? {
            return Ok(out);
        }
        match self.state.lock().unwrap().commits.last() {
            Some(id) => Ok(CommandOutput::ok(id.clone())),
            None => Ok(CommandOutput::failed(128, "fatal: ambiguous argument 'HEAD'")),
        }
    }

    fn remote_get_url(&self, name: &str) -> Result<CommandOutput> {
        if let Some(out) = self.enter("remote-get-url")? {
            return Ok(out);
        }
        match self.state.lock().unwrap().remotes.get(name) {
            Some(url) => Ok(CommandOutput::ok(url.clone())),
            None => Ok(CommandOutput::failed(2, format!("error: No such remote '{name}'"))),
        }
    }

    fn remote_add(&self, name: &str, url: &str) -> Result<CommandOutput> {
        if let Some(out) = self.enter("remote-add")? {
            return Ok(out);
        }
        self.state
            .lock()
            .unwrap()
            .remotes
            .insert(name.to_string(), url.to_string());
        Ok(CommandOutput::ok(""))
    }

    fn remote_set_url(&self, name: &str, url: &str) -> Result<CommandOutput> {
        if let Some(out) = self.enter("remote-set-url")? {
            return Ok(out);
        }
        self.state
            .lock()
            .unwrap()
            .remotes
            .insert(name.to_string(), url.to_string());
        Ok(CommandOutput::ok(""))
    }

    fn push(&self, remote: &str, branch: &str) -> Result<CommandOutput> {
        if self.enter("push")?.is_some() {
            let url = self.remote_url(remote).unwrap_or_default();
            return Ok(CommandOutput::failed(
                128,
                format!("fatal: unable to access '{url}/': Could not resolve host"),
            ));
        }
        self.state
            .lock()
            .unwrap()
            .pushed
            .push((remote.to_string(), branch.to_string()));
        Ok(CommandOutput::ok(""))
    }

    fn config_get(&self, key: &str) -> Result<CommandOutput> {
        if let Some(out) = self.enter("config-get")? {
            return Ok(out);
        }
        match self.state.lock().unwrap().config.get(key) {
            Some(value) => Ok(CommandOutput::ok(value.clone())),
            None => Ok(CommandOutput::failed(1, "")),
        }
    }

    fn config_set(&self, key: &str, value: &str) -> Result<CommandOutput> {
        if let Some(out) = self.enter("config-set")? {
            return Ok(out);
        }
        self.set_config(key, value);
        Ok(CommandOutput::ok(""))
    }
}
