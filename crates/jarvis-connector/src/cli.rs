//! Command line interface
//!
//! Flags given here override the matching config file values.

use clap::{Parser, Subcommand};
use jarvis_config::AppConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "jarvis-connector")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: .jarvis-connector.toml, then the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Gerrit base URL
    #[arg(long)]
    pub gerrit: Option<String>,

    /// File holding "user:secret" for Gerrit
    #[arg(long)]
    pub auth_file: Option<String>,

    /// CI event listener URL
    #[arg(long)]
    pub event_listener: Option<String>,

    /// Ask Gerrit to trace requests
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Poll Gerrit and dispatch checks and merges (default)
    Serve,

    /// List the checkers owned by this connector
    List,

    /// Create or update a checker for a repository
    Register {
        /// Repository the checker applies to
        #[arg(long)]
        repo: String,

        /// Checker kind, e.g. "jarvispipeline"
        #[arg(long)]
        prefix: String,

        /// Overwrite an existing checker instead of creating one
        #[arg(long)]
        update: bool,

        /// Block submission while the check is not passing
        #[arg(long)]
        blocking: bool,
    },

    /// Show the pending checks of one checker
    Pending {
        /// Checker UUID
        uuid: String,
    },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }

    /// Apply command line overrides on top of the loaded config
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(url) = &self.gerrit {
            config.gerrit_url = url.clone();
        }
        if let Some(path) = &self.auth_file {
            config.auth_file = Some(path.clone());
        }
        if let Some(url) = &self.event_listener {
            config.event_listener_url = url.clone();
        }
        if self.debug {
            config.debug = true;
        }
    }
}
