mod cli;
mod demo;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::config::ConfigCommands;
use cli::handlers;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "screenflow")]
#[command(version)]
#[command(about = "Screen-detecting workflow engine for browser automation")]
struct Cli {
    /// Log level (error, warn, info, debug, trace); defaults to the configured level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bundled login workflow against a simulated page
    ///
    /// Prints every engine event as it is published, followed by the outcome.
    ///
    /// Examples:
    ///   screenflow demo
    ///   screenflow demo --fail-password
    ///   screenflow demo --json --timeout 2
    Demo {
        /// Submit a wrong password so the run ends in the failure state
        #[arg(long)]
        fail_password: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,

        /// Detection timeout in seconds (overrides the configuration)
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Manage engine configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// List the registered workflows
    Workflows {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    handlers::init_cli_logging(cli.log_level.as_deref())?;

    match cli.command {
        Commands::Demo {
            fail_password,
            json,
            timeout,
            config,
        } => {
            handlers::handle_demo(fail_password, json, timeout, config).await?;
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show { path, json } => handlers::handle_config_show(path, json)?,
            ConfigCommands::Init { path, force } => handlers::handle_config_init(path, force)?,
            ConfigCommands::Validate { path } => handlers::handle_config_validate(path)?,
        },
        Commands::Workflows { json } => {
            handlers::handle_workflows(json)?;
        }
    }

    Ok(())
}
