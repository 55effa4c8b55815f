use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::credentials::Credential;
use crate::scm::{self, Scm};

/// Snapshot of whether this machine can publish entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: String,
    pub timestamp: String,
    pub environment: String,
    pub github_token_configured: bool,
    pub git_configured: bool,
    pub repo_found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Inspect the configured repository, identity and token.
pub fn check(config: &PipelineConfig) -> HealthReport {
    let repo = scm::open(&config.repo_path).ok();
    let report = check_with(config, repo.as_deref());
    log::debug!("Health check: {report:?}");
    report
}

fn check_with(config: &PipelineConfig, repo: Option<&dyn Scm>) -> HealthReport {
    let github_token_configured = Credential::from_env(&config.token_env).is_some();

    let (git_configured, branch) = match repo {
        Some(repo) => {
            let has = |key: &str| {
                repo.config_get(key)
                    .map(|out| out.success() && !out.stdout.is_empty())
                    .unwrap_or(false)
            };
            let branch = repo
                .current_branch()
                .ok()
                .filter(|out| out.success() && !out.stdout.is_empty())
                .map(|out| out.stdout);
            (has("user.name") && has("user.email"), branch)
        }
        None => (false, None),
    };

    let repo_found = repo.is_some();
    let status = if repo_found { "healthy" } else { "degraded" };

    HealthReport {
        status: status.to_string(),
        timestamp: chrono::Local::now().to_rfc3339(),
        environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "unknown".to_string()),
        github_token_configured,
        git_configured,
        repo_found,
        branch,
    }
}

/// Print a report for humans.
pub fn print_report(report: &HealthReport, config: &PipelineConfig) -> Result<()> {
    let mark = |ok: bool| if ok { "✓".green() } else { "✗".red() };

    let status = if report.is_healthy() {
        report.status.green().bold()
    } else {
        report.status.yellow().bold()
    };
    println!("{} {}", "Status:".bold(), status);
    println!("  {} {}", "Environment:".cyan(), report.environment);
    println!(
        "  {} repository at {}",
        mark(report.repo_found),
        config.repo_path.display()
    );
    if let Some(branch) = &report.branch {
        println!("    on branch {branch}");
    }
    println!("  {} git identity configured", mark(report.git_configured));
    println!(
        "  {} token in ${}",
        mark(report.github_token_configured),
        config.token_env
    );

    if !report.github_token_configured {
        println!(
            "\n{} pushes to HTTPS remotes will fail without {}",
            "Warning:".yellow().bold(),
            config.token_env
        );
    }

    Ok(())
}
