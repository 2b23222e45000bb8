//! Site configuration management for `kiln.toml`.
//!
//! # Sections
//!
//! | Section           | Purpose                                        |
//! |-------------------|------------------------------------------------|
//! | `[dir]`           | Input, output, includes and layouts directories |
//! | `[templates]`     | Recognized formats and per-format engines      |
//! | `[build]`         | Clean flag and passthrough assets              |
//! | `[[collections]]` | Named document collections selected by glob    |
//! | `[data]`          | User-defined global template data              |
//!
//! Every field has a default, so a missing `kiln.toml` yields the
//! conventional `src` → `_site` layout.

pub mod defaults;
mod error;
mod section;

pub use error::ConfigError;
pub use section::{BuildConfig, CollectionConfig, DirConfig, TemplatesConfig};

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::{Path, PathBuf},
};

/// Name of the collection that always holds every document.
pub const ALL_COLLECTION: &str = "all";

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing kiln.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute project root (set after loading)
    #[serde(skip)]
    #[educe(Default = PathBuf::from("./"))]
    pub root: PathBuf,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub dir: DirConfig,

    #[serde(default)]
    pub templates: TemplatesConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default = "defaults::collections::collections")]
    #[educe(Default = defaults::collections::collections())]
    pub collections: Vec<CollectionConfig>,

    /// User-defined global template data
    #[serde(default)]
    pub data: BTreeMap<String, toml::Value>,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Absolute includes directory.
    pub fn includes_dir(&self) -> PathBuf {
        self.dir.input.join(&self.dir.includes)
    }

    /// Absolute layouts directory.
    pub fn layouts_dir(&self) -> PathBuf {
        self.dir.input.join(&self.dir.layouts)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let base = cli.root.clone().unwrap_or_else(|| PathBuf::from("./"));
        let root = match &cli.command {
            Commands::Init { name: Some(name) } => base.join(name),
            _ => base,
        };

        if let Commands::Build {
            clean,
            input,
            output,
        } = &cli.command
        {
            self.build.clean |= *clean;
            Self::update_option(&mut self.dir.input, input.as_ref());
            Self::update_option(&mut self.dir.output, output.as_ref());
        }

        self.resolve_paths(&root);
        self.config_path = Self::normalize_path(&self.root.join(&cli.config));
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Make root, input and output absolute.
    pub fn resolve_paths(&mut self, root: &Path) {
        self.root = Self::normalize_path(root);
        self.dir.input = Self::normalize_path(&self.root.join(&self.dir.input));
        self.dir.output = Self::normalize_path(&self.root.join(&self.dir.output));
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration before a build
    pub fn validate(&self) -> Result<()> {
        if self.templates.formats.is_empty() {
            bail!(ConfigError::Validation(
                "[templates.formats] must have at least one element".into()
            ));
        }

        if !self.dir.input.is_dir() {
            bail!(ConfigError::Validation(format!(
                "[dir.input] `{}` is not a directory",
                self.dir.input.display()
            )));
        }

        if self.dir.output == self.dir.input {
            bail!(ConfigError::Validation(
                "[dir.output] must differ from [dir.input]".into()
            ));
        }

        // Cleaning removes the output directory, so it must not contain the sources.
        if self.root.starts_with(&self.dir.output) || self.dir.input.starts_with(&self.dir.output) {
            bail!(ConfigError::Validation(format!(
                "[dir.output] `{}` must not contain the project root or [dir.input]",
                self.dir.output.display()
            )));
        }

        let mut seen = HashSet::new();
        for collection in &self.collections {
            if collection.name.is_empty() {
                bail!(ConfigError::Validation(
                    "[[collections]] name must not be empty".into()
                ));
            }
            if collection.name == ALL_COLLECTION {
                bail!(ConfigError::Validation(format!(
                    "[[collections]] name `{ALL_COLLECTION}` is reserved"
                )));
            }
            if collection.glob.trim().is_empty() {
                bail!(ConfigError::Validation(format!(
                    "[[collections]] `{}` has an empty glob",
                    collection.name
                )));
            }
            if !seen.insert(collection.name.as_str()) {
                bail!(ConfigError::Validation(format!(
                    "[[collections]] `{}` is declared twice",
                    collection.name
                )));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
