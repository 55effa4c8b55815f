//! # achievement-log
//!
//! Records achievements as JSON files in a git repository and publishes them
//! to a remote.
//!
//! ## Overview
//!
//! Each entry is written to `logs/<year>/<month>-<day>_<slug>.json`, where the
//! path depends only on the entry's date and title. Writing it is followed by
//! a fixed sequence of git steps (checkout, add, no-op check, commit, remote
//! setup, push). Submitting identical content twice commits once; the second
//! call reports a no-op.
//!
//! ## Architecture
//!
//! - Entry model and on-disk format ([`record`])
//! - Path derivation ([`path`])
//! - Boundary validation ([`request`])
//! - Version-control interface ([`scm`]) and push credentials ([`credentials`])
//! - The commit pipeline ([`pipeline`])
//! - Configuration, logging and diagnostics ([`config`], [`logger`], [`health`])
//! - CLI command handlers ([`handlers`])

/// Platform-agnostic configuration: the config directory and the pipeline settings file.
pub mod config;

/// Push tokens: embedding them into remote URLs and redacting them from output.
pub mod credentials;

/// Command handlers for the `achievement-log` binary.
pub mod handlers;

/// Environment diagnostics: repository, git identity and token presence.
pub mod health;

/// Logging setup: console via `env_logger` plus an append-only log file.
pub mod logger;

/// Derivation of the stored path from an entry's date and title.
pub mod path;

/// The commit pipeline that writes, commits and pushes entries.
pub mod pipeline;

/// The achievement record and its JSON serialization.
pub mod record;

/// Validation of submitted entries before they reach the pipeline.
pub mod request;

/// Narrow version-control interface with a git CLI implementation.
pub mod scm;

pub use path::{derive_path, DeriveError, StoredPath};
pub use pipeline::{Pipeline, PipelineResult, Stage};
pub use record::AchievementRecord;
