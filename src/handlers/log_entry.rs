//! `log` command: validate an entry and run it through the pipeline.

use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

use super::EXIT_INVALID_INPUT;
use crate::config::{ConfigManager, PipelineConfig};
use crate::credentials::Credential;
use crate::pipeline::{Pipeline, PipelineResult};
use crate::request::AchievementRequest;

/// Where the entry comes from.
#[derive(Debug, Clone)]
pub enum LogInput {
    /// Fields given on the command line
    Fields(AchievementRequest),
    /// A JSON file with the same fields
    File(PathBuf),
}

impl LogInput {
    fn into_request(self) -> Result<AchievementRequest> {
        match self {
            LogInput::Fields(request) => Ok(request),
            LogInput::File(path) => {
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read entry file: {}", path.display()))?;
                serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse entry file: {}", path.display()))
            }
        }
    }
}

/// Handle the log command, returning the process exit code.
pub fn handle_log(input: LogInput, config: &PipelineConfig, json: bool) -> Result<i32> {
    let request = input.into_request()?;

    let record = match request.validate() {
        Ok(record) => record,
        Err(errors) => {
            log::warn!("Rejected entry: {errors}");
            if json {
                let body = serde_json::json!({
                    "success": false,
                    "message": errors.to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                eprintln!("{}", "Entry rejected:".red().bold());
                for e in &errors.0 {
                    eprintln!("  {} {}: {}", "✗".red(), e.field.bold(), e.message);
                }
            }
            return Ok(EXIT_INVALID_INPUT);
        }
    };

    let credential = Credential::from_env(&config.token_env);
    if credential.is_none() {
        log::warn!(
            "{} is not set; pushing with the remote's existing credentials",
            config.token_env
        );
    }

    let pipeline = Pipeline::open(config.clone())
        .context("Failed to open log repository")?
        .with_log_file(ConfigManager::log_file_path()?);

    let result = match pipeline.log_entry(&record, credential.as_ref()) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("{} {e}", "Entry rejected:".red().bold());
            return Ok(EXIT_INVALID_INPUT);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result.to_response())?);
    } else {
        print_result(&result);
    }

    Ok(result.exit_code())
}

fn print_result(result: &PipelineResult) {
    match result {
        PipelineResult::Written { path, commit_id } => {
            println!("{} {}", "✓ Logged".green().bold(), path);
            println!("  {} {}", "Commit:".cyan(), commit_id);
        }
        PipelineResult::NoOp { path, reason } => {
            println!("{} {} is {}", "No changes:".yellow().bold(), path, reason);
        }
        PipelineResult::Failed { stage, .. } => {
            eprintln!("{} {}", "✗".red().bold(), result.message());
            if stage.committed_locally() {
                eprintln!(
                    "  {} the entry is committed locally and will go out with the next successful push",
                    "Note:".yellow()
                );
            }
        }
    }
}
