use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use achievement_log::config::PipelineConfig;
use achievement_log::handlers::{self, ConfigUpdate, LogInput};
use achievement_log::logger;
use achievement_log::request::AchievementRequest;

#[derive(Parser)]
#[command(name = "achievement-log")]
#[command(about = "Log achievements as JSON files and publish them to a git repository", long_about = None)]
#[command(version)]
struct Cli {
    /// Log repository to use instead of the configured one
    #[arg(long, global = true)]
    repo: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record an achievement, commit it and push it
    Log {
        /// Date of the achievement (YYYY-MM-DD)
        #[arg(long, required_unless_present = "from_file")]
        date: Option<String>,

        /// Short title, also used for the file name
        #[arg(long, required_unless_present = "from_file")]
        title: Option<String>,

        /// What happened
        #[arg(long, required_unless_present = "from_file")]
        description: Option<String>,

        /// Tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Impact classification (e.g. Individual, Team, Strategic)
        #[arg(long, required_unless_present = "from_file")]
        impact_level: Option<String>,

        /// Audience label (repeatable)
        #[arg(long = "visibility")]
        visibility: Vec<String>,

        /// Resume-ready summary line
        #[arg(long, required_unless_present = "from_file")]
        resume_bullet: Option<String>,

        /// Read the entry from a JSON file instead of flags
        #[arg(long, conflicts_with_all = ["date", "title", "description", "impact_level", "resume_bullet"])]
        from_file: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Initialize a log repository and save it as the default
    Init {
        /// Path to the git repository for storing entries
        path: PathBuf,

        /// Remote git URL (without credentials)
        #[arg(long)]
        remote: Option<String>,

        /// Branch entries are committed to
        #[arg(long)]
        branch: Option<String>,
    },

    /// Check repository, git identity and token configuration
    Health {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// View or change settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Remote URL to push to (credentials are stripped)
        #[arg(long)]
        remote: Option<String>,

        /// Name of the remote
        #[arg(long)]
        remote_name: Option<String>,

        /// Branch entries are committed to
        #[arg(long)]
        branch: Option<String>,

        /// Environment variable holding the push token
        #[arg(long)]
        token_env: Option<String>,

        /// Commit author name, used when the repository has none
        #[arg(long)]
        name: Option<String>,

        /// Commit author email, used when the repository has none
        #[arg(long)]
        email: Option<String>,
    },
}

fn load_config(repo: Option<PathBuf>) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::load()?;
    if let Some(repo) = repo {
        config.repo_path = repo;
    }
    Ok(config)
}

fn main() -> Result<()> {
    logger::init_logger()?;

    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Log {
            date,
            title,
            description,
            tags,
            impact_level,
            visibility,
            resume_bullet,
            from_file,
            json,
        } => {
            let input = match from_file {
                Some(path) => LogInput::File(path),
                None => LogInput::Fields(AchievementRequest {
                    date: date.unwrap_or_default(),
                    title: title.unwrap_or_default(),
                    description: description.unwrap_or_default(),
                    tags,
                    impact_level: impact_level.unwrap_or_default(),
                    visibility,
                    resume_bullet: resume_bullet.unwrap_or_default(),
                }),
            };
            handlers::handle_log(input, &load_config(cli.repo)?, json)?
        }
        Commands::Init {
            path,
            remote,
            branch,
        } => {
            handlers::handle_init(&path, remote.as_deref(), branch.as_deref())?;
            0
        }
        Commands::Health { json } => handlers::handle_health(&load_config(cli.repo)?, json)?,
        Commands::Config {
            show,
            remote,
            remote_name,
            branch,
            token_env,
            name,
            email,
        } => {
            let update = ConfigUpdate {
                repo: cli.repo,
                remote,
                remote_name,
                branch,
                token_env,
                name,
                email,
            };
            if show && update.is_empty() {
                handlers::handle_config_show()?;
            } else {
                handlers::handle_config_update(update)?;
            }
            0
        }
    };

    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}
