//! Command line interface definition

use clap::{Parser, Subcommand};
use lxpkg_types::ColorChoice;
use std::path::PathBuf;

/// lxpkg - Source-based package installer
#[derive(Parser)]
#[command(name = "lxpkg")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Source-based package installer")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging to the log directory
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory tree holding package descriptors
    #[arg(long, global = true, value_name = "DIR")]
    pub source_root: Option<PathBuf>,

    /// Scratch directory for downloads and extracted sources
    #[arg(long, global = true, value_name = "DIR")]
    pub build_root: Option<PathBuf>,

    /// Prefix that manifest paths are resolved against
    #[arg(long, global = true, value_name = "DIR")]
    pub install_root: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Fetch, build and install a package from its descriptor
    #[command(alias = "i")]
    Install {
        /// Package name (exact, or a substring of the descriptor name)
        package: String,
    },

    /// Remove the files a package's manifest lists
    #[command(alias = "rm")]
    Remove {
        /// Package name
        package: String,
    },

    /// List descriptors whose name contains the query
    #[command(alias = "list", alias = "ls", alias = "find")]
    Search {
        /// Search query (empty lists everything)
        #[arg(default_value = "")]
        query: String,
    },

    /// Show the descriptor a name resolves to
    Info {
        /// Package name
        package: String,
    },
}

impl Commands {
    #[allow(dead_code)] // Used in tests
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Install { .. } => "install",
            Commands::Remove { .. } => "remove",
            Commands::Search { .. } => "search",
            Commands::Info { .. } => "info",
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            Commands::Install { package } | Commands::Remove { package }
                if package.trim().is_empty() =>
            {
                Err("Package name cannot be empty".to_string())
            }
            Commands::Info { package } if package.trim().is_empty() => {
                Err("Package name cannot be empty".to_string())
            }
            _ => Ok(()),
        }
    }
}
