//! Roster CLI - Command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "roster", version, about = "Balanced course registration with GitHub team provisioning")]
pub struct Cli {
    /// Project directory (defaults to current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Output format (json for scripting)
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn get_project_dir(&self) -> PathBuf {
        self.project
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new roster project
    Init {
        /// Project name
        #[arg(short, long)]
        name: String,

        /// GitHub org to provision teams in (can be added to the config later)
        #[arg(long)]
        org: Option<String>,
    },

    /// Start the registration API server
    Serve {
        /// Port to listen on (defaults to the config value)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (defaults to the config value)
        #[arg(long)]
        host: Option<String>,
    },

    /// Sync registered teams to GitHub
    Sync,

    /// Look up a student's registration
    Status {
        /// Matricule to look up
        matricule: String,
    },

    /// Show per-topic availability
    Availability,

    /// GitHub token management
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Store the GitHub org token in the OS keyring
    SetToken {
        /// Personal access token with org admin scope
        token: String,
    },

    /// Remove the stored token
    Clear,

    /// Show whether a token is available
    Status,
}
