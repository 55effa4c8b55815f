//! `init` command: prepare a log repository and remember it in the config.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use crate::config::PipelineConfig;
use crate::credentials::display_url;
use crate::scm;

/// Initialize (or adopt) a log repository and save it as the configured one.
pub fn handle_init(repo_path: &Path, remote_url: Option<&str>, branch: Option<&str>) -> Result<()> {
    println!("{}", "Initializing log repository...".cyan().bold());

    let mut config = PipelineConfig::load().context("Failed to load configuration")?;
    if let Some(branch) = branch {
        config.branch = branch.to_string();
    }

    init_repo(repo_path, remote_url, &mut config)?;
    config.save().context("Failed to save configuration")?;

    println!("{}", "Repository initialized successfully!".green().bold());
    println!("\n{} achievement-log log --help", "Next:".cyan().bold());

    Ok(())
}

/// Open or create the repository and record it in `config`.
fn init_repo(
    repo_path: &Path,
    remote_url: Option<&str>,
    config: &mut PipelineConfig,
) -> Result<()> {
    let shown = repo_path.display();
    let repo = if scm::is_repo(repo_path) {
        println!("  {} existing repository at {shown}", "Using".green());
        scm::open(repo_path)?
    } else {
        println!("  {} new repository at {shown}", "Creating".green());
        scm::init(repo_path, &config.branch)?
    };

    if let Some(url) = remote_url {
        let url = display_url(url);
        let name = &config.remote_name;

        if repo.remote_get_url(name)?.success() {
            println!("  {} Remote '{}' already exists", "Note:".yellow(), name);
        } else {
            let out = repo.remote_add(name, &url)?;
            if !out.success() {
                anyhow::bail!("Failed to add remote '{name}': {}", out.detail());
            }
            println!("  {} remote '{}' -> {}", "Added".green(), name, url);
        }
        config.remote_url = Some(url);
    }

    config.repo_path = repo.workdir().to_path_buf();
    Ok(())
}
