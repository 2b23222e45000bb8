//! `[dir]`, `[templates]`, `[build]` and `[[collections]]` sections.

use super::defaults;
use crate::site::layout::{TemplateEngine, TemplateFormat};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[dir]` section in kiln.toml - directory roles.
///
/// `includes` and `layouts` are relative to `input`; `input` and `output`
/// are relative to the project root until [`super::SiteConfig::resolve_paths`]
/// makes them absolute.
///
/// # Example
/// ```toml
/// [dir]
/// input = "src"
/// output = "_site"
/// includes = "_includes"
/// layouts = "_layouts"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct DirConfig {
    /// Source tree holding templates.
    #[serde(default = "defaults::dir::input")]
    #[educe(Default = defaults::dir::input())]
    pub input: PathBuf,

    /// Generated site.
    #[serde(default = "defaults::dir::output")]
    #[educe(Default = defaults::dir::output())]
    pub output: PathBuf,

    /// Partials available to `{% include %}`.
    #[serde(default = "defaults::dir::includes")]
    #[educe(Default = defaults::dir::includes())]
    pub includes: PathBuf,

    /// Templates named by a document's `layout` key.
    #[serde(default = "defaults::dir::layouts")]
    #[educe(Default = defaults::dir::layouts())]
    pub layouts: PathBuf,
}

/// `[templates]` section - which engine processes which file extension.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatesConfig {
    #[serde(default = "defaults::templates::formats")]
    #[educe(Default = defaults::templates::formats())]
    pub formats: Vec<TemplateFormat>,

    /// Engine run over `.md` bodies before markdown conversion.
    #[serde(default = "defaults::templates::markdown_engine")]
    #[educe(Default = defaults::templates::markdown_engine())]
    pub markdown_engine: TemplateEngine,

    /// Engine run over `.html` bodies.
    #[serde(default = "defaults::templates::html_engine")]
    #[educe(Default = defaults::templates::html_engine())]
    pub html_engine: TemplateEngine,
}

/// `[build]` section - output handling and passthrough assets.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Remove the output directory before building.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = defaults::r#false())]
    pub clean: bool,

    /// Paths (relative to the project root) copied verbatim to the output.
    #[serde(default = "defaults::build::passthrough")]
    #[educe(Default = defaults::build::passthrough())]
    pub passthrough: Vec<PathBuf>,
}

/// One `[[collections]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionConfig {
    pub name: String,
    /// Glob matched against root-relative paths, e.g. `src/blog/**/*.md`.
    pub glob: String,
}
