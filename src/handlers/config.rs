//! `config` command: show or update the pipeline configuration.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::{ConfigManager, PipelineConfig};
use crate::credentials::display_url;

/// Fields the `config` command can change. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct ConfigUpdate {
    pub repo: Option<PathBuf>,
    pub remote: Option<String>,
    pub remote_name: Option<String>,
    pub branch: Option<String>,
    pub token_env: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl ConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self.repo.is_none()
            && self.remote.is_none()
            && self.remote_name.is_none()
            && self.branch.is_none()
            && self.token_env.is_none()
            && self.name.is_none()
            && self.email.is_none()
    }

    /// Apply to `config`, returning a description of each change.
    fn apply(self, config: &mut PipelineConfig) -> Vec<String> {
        let mut changes = Vec::new();

        if let Some(repo) = self.repo {
            changes.push(format!("repo_path = {}", repo.display()));
            config.repo_path = repo;
        }
        if let Some(remote) = self.remote {
            // Tokens belong in the environment, not the config file
            let remote = display_url(&remote);
            changes.push(format!("remote_url = {remote}"));
            config.remote_url = Some(remote);
        }
        if let Some(name) = self.remote_name {
            changes.push(format!("remote_name = {name}"));
            config.remote_name = name;
        }
        if let Some(branch) = self.branch {
            changes.push(format!("branch = {branch}"));
            config.branch = branch;
        }
        if let Some(var) = self.token_env {
            changes.push(format!("token_env = {var}"));
            config.token_env = var;
        }
        if let Some(name) = self.name {
            changes.push(format!("identity.name = {name}"));
            config.identity.name = name;
        }
        if let Some(email) = self.email {
            changes.push(format!("identity.email = {email}"));
            config.identity.email = email;
        }

        changes
    }
}

/// Print the effective configuration.
pub fn handle_config_show() -> Result<()> {
    let config = PipelineConfig::load().context("Failed to load configuration")?;
    let path = ConfigManager::config_file_path()?;

    println!("{}", "Achievement Log Configuration".cyan().bold());
    println!("  {} {}", "File:".dimmed(), path.display());
    println!();
    println!("  {:<14} {}", "repo_path", config.repo_path.display());
    println!("  {:<14} {}", "branch", config.branch);
    println!("  {:<14} {}", "remote_name", config.remote_name);
    println!(
        "  {:<14} {}",
        "remote_url",
        config.remote_url.as_deref().unwrap_or("(use existing remote)")
    );
    println!("  {:<14} {}", "token_env", config.token_env);
    println!(
        "  {:<14} {} <{}>",
        "identity", config.identity.name, config.identity.email
    );

    Ok(())
}

/// Apply an update and save it.
pub fn handle_config_update(update: ConfigUpdate) -> Result<()> {
    if update.is_empty() {
        println!("{}", "Nothing to change (see --show).".yellow());
        return Ok(());
    }

    let mut config = PipelineConfig::load().context("Failed to load configuration")?;
    let changes = update.apply(&mut config);
    config.save().context("Failed to save configuration")?;

    for change in changes {
        println!("  {} {}", "✓".green(), change);
    }
    log::info!("Configuration updated");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_update() {
        assert!(ConfigUpdate::default().is_empty());
        let update = ConfigUpdate {
            branch: Some("trunk".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_apply_strips_credentials_from_remote() {
        let mut config = PipelineConfig::default();
        let update = ConfigUpdate {
            remote: Some("https://secret@github.com/owner/logs.git".to_string()),
            name: Some("Someone".to_string()),
            ..Default::default()
        };

        let changes = update.apply(&mut config);

        assert_eq!(
            config.remote_url.as_deref(),
            Some("https://github.com/owner/logs.git")
        );
        assert_eq!(config.identity.name, "Someone");
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| !c.contains("secret")));
    }
}
