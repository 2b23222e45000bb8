//! Template rendering with tera, markdown conversion and layout chains.
//!
//! One `Tera` instance holds every include, layout and page body. It is
//! built once per build and then shared read-only by the rendering workers.
//!
//! ```text
//! page body ──► tera (njk) ──► markdown (md only) ──► layout ──► layout ... ──► HTML
//! ```

use crate::compiler::collect_all_files;
use crate::compiler::document::{Document, parse_front_matter, to_slash};
use crate::config::ALL_COLLECTION;
use crate::log;
use crate::site::layout::TemplateFormat;
use crate::site::{SiteSetup, collection, filters};
use anyhow::{Context as _, Result, anyhow, bail};
use pulldown_cmark::{Options, Parser, html};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tera::{Context, Tera};

/// Template names ending in these are autoescaped.
const AUTOESCAPE_SUFFIXES: &[&str] = &[".njk", ".md", ".html"];

/// Build `collections`: `all` plus every configured collection.
pub fn collections_value(setup: &SiteSetup, docs: &[Document]) -> Map<String, Value> {
    let to_array =
        |selected: Vec<&Document>| Value::Array(selected.into_iter().map(Document::collection_value).collect());

    let mut collections = Map::new();
    collections.insert(ALL_COLLECTION.into(), to_array(collection::all(docs)));
    for def in &setup.collections {
        collections.insert(def.name.clone(), to_array(def.select(docs)));
    }
    collections
}

pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}

pub struct Renderer<'a> {
    setup: &'a SiteSetup,
    tera: Tera,
    /// Layout name → its front matter
    layouts: HashMap<String, Map<String, Value>>,
    /// Globals, user data and collections
    base: Context,
}

impl<'a> Renderer<'a> {
    /// Register includes, layouts and page bodies, and freeze the shared context.
    pub fn new(
        setup: &'a SiteSetup,
        docs: &[Document],
        collections: Map<String, Value>,
    ) -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(AUTOESCAPE_SUFFIXES.to_vec());
        SiteSetup::register_filters(&mut tera);

        let mut templates = read_templates(&setup.layout.includes_dir)?;
        let include_names: Vec<String> = templates.iter().map(|(name, _)| name.clone()).collect();

        let mut layouts = HashMap::new();
        for (name, source) in read_templates(&setup.layout.layouts_dir)? {
            let (data, body) = parse_front_matter(&source)
                .with_context(|| format!("Failed to parse front matter of layout `{name}`"))?;
            if include_names.contains(&name) {
                log!("warn"; "layout `{name}` shadows an include of the same name");
            }
            layouts.insert(name.clone(), data);
            templates.push((name, body));
        }

        templates.extend(
            docs.iter()
                .filter(|doc| setup.layout.uses_engine(doc.format))
                .map(|doc| (doc.rel_path.clone(), doc.body.clone())),
        );

        let templates = templates
            .iter()
            .map(|(name, source)| (name.as_str(), filters::guard_undefined(source)));
        tera.add_raw_templates(templates)
            .context("Failed to parse templates")?;

        let mut base = setup.base_context();
        base.insert("collections", &collections);

        Ok(Self {
            setup,
            tera,
            layouts,
            base,
        })
    }

    /// Render one document through its engine, markdown and layout chain.
    pub fn render(&self, doc: &Document) -> Result<String> {
        let mut context = self.base.clone();
        for (key, value) in &doc.data {
            context.insert(key.as_str(), value);
        }
        context.insert("page", &doc.page_value());

        let mut content = if self.setup.layout.uses_engine(doc.format) {
            self.tera
                .render(&doc.rel_path, &context)
                .with_context(|| format!("Failed to render {}", doc.rel_path))?
        } else {
            doc.body.clone()
        };

        if doc.format == TemplateFormat::Md {
            content = markdown_to_html(&content);
        }

        self.apply_layouts(doc, content, context)
    }

    fn apply_layouts(&self, doc: &Document, mut content: String, mut context: Context) -> Result<String> {
        let mut chain: Vec<&str> = Vec::new();
        let mut next = doc.layout();

        while let Some(requested) = next {
            let (name, data) = self.resolve_layout(requested).ok_or_else(|| {
                anyhow!("layout `{requested}` used by {} not found", doc.rel_path)
            })?;
            if chain.contains(&name) {
                bail!(
                    "layout cycle in {}: {} -> {name}",
                    doc.rel_path,
                    chain.join(" -> ")
                );
            }
            chain.push(name);

            // Document front matter wins over layout front matter.
            for (key, value) in data {
                if key != "layout" && !doc.data.contains_key(key) {
                    context.insert(key.as_str(), value);
                }
            }
            context.insert("content", &content);

            content = self
                .tera
                .render(name, &context)
                .with_context(|| format!("Failed to render layout `{name}` for {}", doc.rel_path))?;
            next = data.get("layout").and_then(Value::as_str);
        }

        Ok(content)
    }

    /// Exact name, then with `.njk` appended.
    fn resolve_layout(&self, requested: &str) -> Option<(&str, &Map<String, Value>)> {
        self.layouts
            .get_key_value(requested)
            .or_else(|| self.layouts.get_key_value(&format!("{requested}.njk")))
            .map(|(name, data)| (name.as_str(), data))
    }
}

/// Every UTF-8 file under `dir`, named by its `/`-separated relative path.
fn read_templates(dir: &Path) -> Result<Vec<(String, String)>> {
    let mut templates = Vec::new();
    for path in collect_all_files(dir) {
        let bytes = fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let Ok(source) = String::from_utf8(bytes) else {
            continue;
        };
        let name = to_slash(path.strip_prefix(dir).unwrap_or(&path));
        templates.push((name, source));
    }
    Ok(templates)
}
