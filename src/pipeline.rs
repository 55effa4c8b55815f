//! The commit pipeline: write an entry, commit it, publish it.
//!
//! Steps run in a fixed order and stop at the first failure. Nothing is
//! retried and nothing already done is rolled back, so a failed push leaves
//! the local commit in place for a later push to pick up.

use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::PipelineConfig;
use crate::credentials::{authenticated_url, display_url, redact, Credential};
use crate::path::{derive_path_for, DeriveError, StoredPath};
use crate::record::AchievementRecord;
use crate::scm::{CommandOutput, Scm};

/// Reason reported when a submission matches the committed file.
pub const NO_OP_REASON: &str = "identical to existing file";

/// The pipeline step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Mkdir,
    Write,
    Checkout,
    Add,
    Commit,
    RemoteConfig,
    Push,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Mkdir => "mkdir",
            Stage::Write => "write",
            Stage::Checkout => "checkout",
            Stage::Add => "add",
            Stage::Commit => "commit",
            Stage::RemoteConfig => "remote-config",
            Stage::Push => "push",
        }
    }

    /// Whether a failure at this stage leaves a local commit that was not published.
    pub fn committed_locally(&self) -> bool {
        matches!(self, Stage::RemoteConfig | Stage::Push)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one persistence attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineResult {
    /// Committed and pushed
    Written { path: StoredPath, commit_id: String },
    /// Content matched the committed file; nothing was committed or pushed
    NoOp { path: StoredPath, reason: String },
    /// Stopped at `stage`
    Failed { stage: Stage, detail: String },
}

/// Response shape handed to callers that speak JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntryResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
}

impl PipelineResult {
    pub fn is_success(&self) -> bool {
        !matches!(self, PipelineResult::Failed { .. })
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    pub fn message(&self) -> String {
        match self {
            PipelineResult::Written { path, commit_id } => {
                format!("Log entry written to {path} and committed as {commit_id}")
            }
            PipelineResult::NoOp { path, reason } => {
                format!("No changes to commit. Log entry {path} is {reason}")
            }
            PipelineResult::Failed { stage, detail } => {
                let note = if stage.committed_locally() {
                    " (committed locally, not published)"
                } else {
                    ""
                };
                format!("Failed to write log entry at stage '{stage}'{note}: {detail}")
            }
        }
    }

    pub fn to_response(&self) -> LogEntryResponse {
        let (file_path, commit_hash, stage) = match self {
            PipelineResult::Written { path, commit_id } => {
                (Some(path.to_string()), Some(commit_id.clone()), None)
            }
            PipelineResult::NoOp { path, .. } => (Some(path.to_string()), None, None),
            PipelineResult::Failed { stage, .. } => (None, None, Some(*stage)),
        };

        LogEntryResponse {
            success: self.is_success(),
            message: self.message(),
            file_path,
            commit_hash,
            stage,
        }
    }
}

/// Early exit from a step, carried through `?` inside [`Pipeline::run_steps`].
struct StepFailure {
    stage: Stage,
    detail: String,
}

type Step<T> = std::result::Result<T, StepFailure>;

fn fail(stage: Stage, detail: impl fmt::Display) -> StepFailure {
    StepFailure {
        stage,
        detail: detail.to_string(),
    }
}

/// Require a command to have run and exited successfully.
fn check(stage: Stage, output: Result<CommandOutput>) -> Step<CommandOutput> {
    match output {
        Ok(out) if out.success() => Ok(out),
        Ok(out) => Err(fail(stage, out.detail())),
        Err(e) => Err(fail(stage, format!("{e:#}"))),
    }
}

/// Writes achievement entries into a git working tree and publishes them.
///
/// Runs are serialized per pipeline, so share one instance per repository.
pub struct Pipeline {
    scm: Box<dyn Scm>,
    config: PipelineConfig,
    log_file: Option<PathBuf>,
    lock: Mutex<()>,
}

impl Pipeline {
    /// Create a pipeline, configuring the commit identity if the repository lacks one.
    ///
    /// Outcomes are only logged to the console; see [`Pipeline::with_log_file`].
    pub fn new(scm: Box<dyn Scm>, config: PipelineConfig) -> Result<Self> {
        let pipeline = Pipeline {
            scm,
            config,
            log_file: None,
            lock: Mutex::new(()),
        };
        pipeline.ensure_identity()?;
        Ok(pipeline)
    }

    /// Open the repository named in `config` with the git CLI backend.
    pub fn open(config: PipelineConfig) -> Result<Self> {
        let scm = crate::scm::open(&config.repo_path)?;
        Self::new(scm, config)
    }

    /// Append every outcome to `path` as well as the console log.
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn scm(&self) -> &dyn Scm {
        self.scm.as_ref()
    }

    /// Set `user.name` / `user.email` only where git has no value yet.
    fn ensure_identity(&self) -> Result<()> {
        let identity = &self.config.identity;
        for (key, value) in [("user.name", &identity.name), ("user.email", &identity.email)] {
            let current = self.scm.config_get(key)?;
            if current.success() && !current.stdout.is_empty() {
                continue;
            }

            log::info!("Configuring git {key} for {}", self.scm.workdir().display());
            let out = self.scm.config_set(key, value)?;
            if !out.success() {
                anyhow::bail!("Failed to set git {key}: {}", out.detail());
            }
        }
        Ok(())
    }

    /// Derive the path for `record` and persist it.
    pub fn log_entry(
        &self,
        record: &AchievementRecord,
        credential: Option<&Credential>,
    ) -> std::result::Result<PipelineResult, DeriveError> {
        let path = derive_path_for(record)?;
        Ok(self.persist(&path, record, credential))
    }

    /// Write `record` to `path`, commit it and push the branch.
    pub fn persist(
        &self,
        path: &StoredPath,
        record: &AchievementRecord,
        credential: Option<&Credential>,
    ) -> PipelineResult {
        // A poisoned lock only means another run panicked; git state is still consistent
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        log::info!("Persisting log entry {path}");

        let result = match self.run_steps(path, record, credential) {
            Ok(result) => result,
            Err(StepFailure { stage, detail }) => PipelineResult::Failed {
                stage,
                detail: redact(&detail, credential),
            },
        };

        match &result {
            PipelineResult::Written { commit_id, .. } => {
                log::info!("Committed {path} as {commit_id}")
            }
            PipelineResult::NoOp { .. } => log::info!("No changes for {path}"),
            PipelineResult::Failed { stage, detail } => {
                log::error!("Pipeline failed at {stage} for {path}: {detail}")
            }
        }
        if let Some(log_file) = &self.log_file {
            if let Err(e) = crate::logger::append_line(log_file, &result.message()) {
                log::debug!("Could not write to log file: {e:#}");
            }
        }

        result
    }

    fn run_steps(
        &self,
        path: &StoredPath,
        record: &AchievementRecord,
        credential: Option<&Credential>,
    ) -> Step<PipelineResult> {
        let target = self.scm.workdir().join(path.as_path());

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| fail(Stage::Mkdir, format!("{}: {e}", parent.display())))?;
        }

        let content = record
            .to_json_bytes()
            .map_err(|e| fail(Stage::Write, format!("{e:#}")))?;
        write_atomic(&target, &content)
            .map_err(|e| fail(Stage::Write, format!("{}: {e:#}", target.display())))?;

        self.select_branch()?;

        check(Stage::Add, self.scm.add(path.as_path()))?;

        if !self.has_staged_change(path)? {
            return Ok(PipelineResult::NoOp {
                path: path.clone(),
                reason: NO_OP_REASON.to_string(),
            });
        }

        check(
            Stage::Commit,
            self.scm.commit(&record.commit_message(), path.as_path()),
        )?;
        let commit_id = check(Stage::Commit, self.scm.head_commit())?.stdout;

        self.ensure_remote(credential)?;

        let remote = &self.config.remote_name;
        check(Stage::Push, self.scm.push(remote, &self.config.branch))?;

        Ok(PipelineResult::Written {
            path: path.clone(),
            commit_id,
        })
    }

    fn select_branch(&self) -> Step<()> {
        let branch = &self.config.branch;
        let current = check(Stage::Checkout, self.scm.current_branch())?;
        if current.stdout == *branch {
            return Ok(());
        }

        log::info!("Switching from '{}' to '{branch}'", current.stdout);
        check(Stage::Checkout, self.scm.checkout(branch))?;
        Ok(())
    }

    /// Exit 0 means no difference, 1 means staged changes, anything else is an error.
    fn has_staged_change(&self, path: &StoredPath) -> Step<bool> {
        match self.scm.diff_cached_quiet(path.as_path()) {
            Ok(out) if out.code == Some(0) => Ok(false),
            Ok(out) if out.code == Some(1) => Ok(true),
            Ok(out) => Err(fail(Stage::Add, out.detail())),
            Err(e) => Err(fail(Stage::Add, format!("{e:#}"))),
        }
    }

    /// Create the remote or refresh its URL so a rotated token takes effect.
    fn ensure_remote(&self, credential: Option<&Credential>) -> Step<()> {
        let name = &self.config.remote_name;
        let existing = self
            .scm
            .remote_get_url(name)
            .map_err(|e| fail(Stage::RemoteConfig, format!("{e:#}")))?;

        match (&self.config.remote_url, existing.success()) {
            (Some(url), true) => {
                let url = push_url(url, credential);
                check(Stage::RemoteConfig, self.scm.remote_set_url(name, &url))?;
            }
            (Some(url), false) => {
                log::info!("Adding remote '{name}'");
                let url = push_url(url, credential);
                check(Stage::RemoteConfig, self.scm.remote_add(name, &url))?;
            }
            (None, true) => {
                // Also drops a token left behind by an earlier run
                let url = push_url(&existing.stdout, credential);
                if url != existing.stdout {
                    check(Stage::RemoteConfig, self.scm.remote_set_url(name, &url))?;
                }
            }
            (None, false) => {
                return Err(fail(
                    Stage::RemoteConfig,
                    format!("remote '{name}' does not exist and no remote URL is configured"),
                ));
            }
        }

        Ok(())
    }
}

/// The URL to push through: any stored userinfo replaced by the current token, if any.
fn push_url(url: &str, credential: Option<&Credential>) -> String {
    authenticated_url(&display_url(url), credential)
}

/// Write to a sibling temp file and rename it over `target`.
fn write_atomic(target: &Path, content: &[u8]) -> Result<()> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = dir.join(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));

    let written = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(content)?;
        file.sync_all()?;
        fs::rename(&tmp, target)
    })();

    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    written?;
    Ok(())
}
