mod commands;
mod notify;
mod ui;

use botdash_core::config;
use botdash_core::BotStatus;
use clap::{Parser, Subcommand, ValueEnum};
use commands::deploy::DeployParams;
use commands::logs::LogsParams;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "botdash",
    version,
    about = "Terminal dashboard for a bot-hosting control plane"
)]
struct Cli {
    /// Base URL of the control plane
    #[arg(long, global = true, env = "BOTDASH_URL", default_value = config::DEFAULT_BASE_URL)]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

/// Status filter for the bot list.
#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    All,
    Running,
    Stopped,
    Error,
    Initializing,
    Crashed,
}

impl StatusArg {
    fn filter(self) -> Option<BotStatus> {
        match self {
            StatusArg::All => None,
            StatusArg::Running => Some(BotStatus::Running),
            StatusArg::Stopped => Some(BotStatus::Stopped),
            StatusArg::Error => Some(BotStatus::Error),
            StatusArg::Initializing => Some(BotStatus::Initializing),
            StatusArg::Crashed => Some(BotStatus::Crashed),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with the dashboard password and store the session
    Login {
        /// Dashboard password (prompted for when omitted)
        #[arg(long, env = "BOTDASH_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// End the session on the server and forget it locally
    Logout,

    /// Show bot counts by status
    Stats,

    /// List bots with status, uptime and metrics
    List {
        #[arg(long, value_enum, default_value = "all")]
        status: StatusArg,
    },

    /// Keep the bot list on screen, refreshing periodically
    Watch {
        #[arg(long, value_enum, default_value = "all")]
        status: StatusArg,

        /// Seconds between refreshes
        #[arg(long, default_value_t = config::REFRESH_INTERVAL_SECS)]
        interval: u64,
    },

    /// Upload and start a new bot
    Deploy {
        /// Display name for the bot
        #[arg(long)]
        name: String,

        /// Bot source file
        #[arg(long)]
        bot_file: PathBuf,

        /// Requirements file
        #[arg(long)]
        requirements: Option<PathBuf>,
    },

    /// Restart a bot
    Restart { bot_id: String },

    /// Stop a bot
    Stop { bot_id: String },

    /// Delete a bot permanently
    Delete {
        bot_id: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Follow a bot's live log console
    Logs {
        bot_id: String,

        /// Number of backlog entries to fetch first
        #[arg(long, default_value_t = config::LOG_BACKLOG_LIMIT)]
        limit: usize,

        /// Write the console contents to this file when the view closes
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Check that the control plane is up
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let url = cli.url;

    match cli.command {
        Commands::Login { password } => {
            commands::login::run(&url, password).await?;
        }
        Commands::Logout => {
            commands::logout::run(&url).await?;
        }
        Commands::Stats => {
            commands::stats::run(&url).await?;
        }
        Commands::List { status } => {
            commands::list::run(&url, status.filter()).await?;
        }
        Commands::Watch { status, interval } => {
            commands::watch::run(&url, status.filter(), interval).await?;
        }
        Commands::Deploy {
            name,
            bot_file,
            requirements,
        } => {
            let params = DeployParams {
                name,
                bot_file,
                requirements,
            };
            commands::deploy::run(&url, params).await?;
        }
        Commands::Restart { bot_id } => {
            commands::actions::restart(&url, &bot_id).await?;
        }
        Commands::Stop { bot_id } => {
            commands::actions::stop(&url, &bot_id).await?;
        }
        Commands::Delete { bot_id, yes } => {
            commands::delete::run(&url, &bot_id, yes).await?;
        }
        Commands::Logs {
            bot_id,
            limit,
            export,
        } => {
            let params = LogsParams {
                bot_id,
                limit,
                export,
            };
            commands::logs::run(&url, params).await?;
        }
        Commands::Health => {
            commands::health::run(&url).await?;
        }
    }

    Ok(())
}
