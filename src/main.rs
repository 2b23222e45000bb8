//! Kiln - a static site generator for template and markdown blogs.

mod build;
mod cli;
mod compiler;
mod config;
mod init;
mod logger;
mod site;
mod utils;

use anyhow::{Result, bail};
use build::build_site;
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use init::new_site;
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Init { name } => new_site(&config, name.is_some()),
        Commands::Build { .. } => build_site(&config).map(|_| ()),
    }
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<SiteConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    let mut config = if !cli.is_init() && config_path.exists() {
        SiteConfig::from_path(&config_path)?
    } else {
        if !cli.is_init() {
            log!("build"; "{} not found, using defaults", config_path.display());
        }
        SiteConfig::default()
    };
    config.update_with_cli(cli);

    if cli.is_init() && config.config_path.exists() {
        bail!("Config file already exists. Remove it manually or init in a different path.");
    }

    if !cli.is_init() {
        config.validate()?;
    }

    Ok(config)
}
