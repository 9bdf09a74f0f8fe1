use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cadence::config::Config;

mod commands;

#[derive(Parser)]
#[command(
    name = "cadence",
    version,
    about = "Intelligent post scheduler with random slot planning and content fallback",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler loop until interrupted
    Run,

    /// Publish a single post immediately, outside any plan (recorded as TEST)
    Post,

    /// Publish a test post immediately (alias of post)
    Test,

    /// Show today's posting statistics
    Status {
        /// Number of recent attempts to list
        #[arg(short, long, default_value = "10")]
        recent: usize,
    },

    /// Preview the slot plan for the rest of today
    Plan {
        /// Print the plan as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging
    setup_tracing(&cli.log_format, cli.verbose)?;

    let config = load_config(cli.config.as_deref())?;
    config.validate()?;

    if let Err(e) = dispatch(cli.command, config).await {
        tracing::error!(category = ?e.category(), error = %e, "Command failed");
        return Err(e.into());
    }

    Ok(())
}

async fn dispatch(command: Commands, config: Config) -> cadence::error::Result<()> {
    match command {
        Commands::Run => {
            tracing::info!("Starting run command");
            commands::run(config).await
        }

        Commands::Post => {
            tracing::info!("Starting post command");
            commands::post(config).await
        }

        Commands::Test => {
            tracing::info!("Starting test post command");
            commands::post(config).await
        }

        Commands::Status { recent } => {
            tracing::info!(recent = %recent, "Starting status command");
            commands::status(config, recent)
        }

        Commands::Plan { json } => {
            tracing::info!(json = %json, "Starting plan command");
            commands::plan(config, json)
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading configuration file");
            Config::from_file(path)
        }
        None => Config::from_env(),
    }
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("cadence=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("cadence=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
