//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Kiln static site generator CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name, relative to root (default: kiln.toml)
    #[arg(short = 'C', long, default_value = "kiln.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Scaffold a new site with the default layout
    Init {
        /// the name(path) of site directory, related to `root`
        name: Option<PathBuf>,
    },

    /// Render templates and copy passthrough assets into the output directory
    Build {
        /// Delete the output directory before building
        #[arg(long)]
        clean: bool,

        /// Input directory path (relative to project root)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory path (relative to project root)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Commands::Init { .. })
    }
}
