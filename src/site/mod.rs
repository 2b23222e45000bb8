//! Site builder configuration.
//!
//! Turns a [`SiteConfig`] into the declarations the build pipeline consumes:
//!
//! - **passthrough**: paths copied verbatim into the output tree
//! - **collection**: named document sets selected by glob
//! - **filters**: `dateReadable`, `dateIso`, `dateYMD`
//! - **globals**: `currentYear` and `buildDate`, computed once
//! - **layout**: directory roles and per-format engines
//!
//! # Architecture
//!
//! ```text
//! SiteConfig ──► SiteSetup::from_config()
//!                     │
//!                     ├── register_passthrough() ──► Vec<PassthroughRule>
//!                     ├── define_collection()    ──► CollectionDef
//!                     ├── compute_globals()      ──► SiteGlobals
//!                     ├── declare_layout()       ──► Layout
//!                     └── base_context()         ──► tera::Context (shared, read-only)
//! ```

pub mod collection;
pub mod filters;
pub mod globals;
pub mod layout;
pub mod passthrough;

use crate::config::SiteConfig;
use collection::CollectionDef;
use globals::SiteGlobals;
use layout::Layout;
use passthrough::PassthroughRule;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tera::{Context, Tera};

/// Everything the build needs, fixed for the duration of one build.
#[derive(Debug, Clone)]
pub struct SiteSetup {
    pub root: PathBuf,
    pub layout: Layout,
    pub passthrough: Vec<PassthroughRule>,
    pub collections: Vec<CollectionDef>,
    pub globals: SiteGlobals,
    /// User-defined `[data]` entries.
    pub data: Map<String, Value>,
}

impl SiteSetup {
    /// Declarations for `config`, reading the clock once for globals.
    pub fn from_config(config: &SiteConfig) -> Self {
        Self::with_globals(config, Self::compute_globals())
    }

    pub fn with_globals(config: &SiteConfig, globals: SiteGlobals) -> Self {
        let layout = Self::declare_layout(config);
        let passthrough =
            Self::register_passthrough(&config.build.passthrough, &config.root, &layout.input_dir);
        let collections = config
            .collections
            .iter()
            .map(|c| Self::define_collection(&c.name, &c.glob))
            .collect();
        let data = config
            .data
            .iter()
            .map(|(k, v)| (k.clone(), toml_to_json(v)))
            .collect();

        Self {
            root: config.root.clone(),
            layout,
            passthrough,
            collections,
            globals,
            data,
        }
    }

    /// Mark each path for verbatim copy into the output tree.
    pub fn register_passthrough(
        paths: &[PathBuf],
        root: &Path,
        input_dir: &Path,
    ) -> Vec<PassthroughRule> {
        paths
            .iter()
            .map(|p| PassthroughRule::new(p, root, input_dir))
            .collect()
    }

    pub fn define_collection(name: &str, glob: &str) -> CollectionDef {
        CollectionDef::new(name, glob)
    }

    /// Install the date filters.
    pub fn register_filters(tera: &mut Tera) {
        filters::register(tera);
    }

    pub fn compute_globals() -> SiteGlobals {
        SiteGlobals::compute()
    }

    pub fn declare_layout(config: &SiteConfig) -> Layout {
        Layout {
            input_dir: config.dir.input.clone(),
            output_dir: config.dir.output.clone(),
            includes_dir: config.includes_dir(),
            layouts_dir: config.layouts_dir(),
            template_formats: config.templates.formats.clone(),
            markdown_engine: config.templates.markdown_engine,
            html_engine: config.templates.html_engine,
        }
    }

    /// Context shared by every render: user data, then globals on top.
    pub fn base_context(&self) -> Context {
        let mut context = Context::new();
        for (key, value) in &self.data {
            context.insert(key.as_str(), value);
        }
        context.insert("currentYear", &self.globals.current_year);
        context.insert("buildDate", &self.globals.build_date);
        context
    }

    /// Whether `path` lies inside any passthrough source.
    pub fn is_passthrough(&self, path: &Path) -> bool {
        self.passthrough
            .iter()
            .any(|rule| path.starts_with(rule.source_in(&self.root)))
    }
}

/// Convert config data to template data; datetimes become their TOML string form.
fn toml_to_json(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::from(*i),
        toml::Value::Float(f) => Value::from(*f),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_json(v)))
                .collect(),
        ),
    }
}
