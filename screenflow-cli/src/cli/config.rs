//! Configuration CLI commands

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show {
        /// Path to configuration file (default: XDG config dir)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Write a configuration file with default values
    Init {
        /// Path to configuration file (default: XDG config dir)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Check a configuration file for invalid values
    Validate {
        /// Path to configuration file (default: XDG config dir)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}
