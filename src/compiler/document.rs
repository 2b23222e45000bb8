//! Template documents: front matter, dates and permalinks.
//!
//! # Permalinks
//!
//! | Input (relative to `src`) | Output (relative to `_site`) | URL        |
//! |---------------------------|------------------------------|------------|
//! | `index.njk`               | `index.html`                 | `/`        |
//! | `about.md`                | `about/index.html`           | `/about/`  |
//! | `blog/index.md`           | `blog/index.html`            | `/blog/`   |
//! | `blog/a.md`               | `blog/a/index.html`          | `/blog/a/` |
//!
//! A `permalink` string in front matter replaces the output path, and
//! `permalink: false` keeps the document out of the output tree.

use crate::site::{filters, layout::TemplateFormat};
use crate::utils::date;
use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde_json::{Map, Value, json};
use std::{
    fs,
    path::{Component, Path, PathBuf},
    sync::OnceLock,
};
use tera::Tera;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("Invalid YAML front matter: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Front matter must be a mapping")]
    NotAMapping,
}

static FRONT_MATTER_REGEX: OnceLock<Regex> = OnceLock::new();

fn front_matter_regex() -> &'static Regex {
    FRONT_MATTER_REGEX.get_or_init(|| {
        Regex::new(r"(?s)\A---[ \t]*\r?\n(?:(.*?)\r?\n)?---[ \t]*(?:\r?\n|\z)(.*)\z")
            .expect("front matter pattern is valid")
    })
}

/// Split a leading `---` YAML block from the body.
///
/// Content without a front matter block yields empty data and the whole
/// content as body.
pub fn parse_front_matter(content: &str) -> Result<(Map<String, Value>, String), FrontMatterError> {
    let Some(captures) = front_matter_regex().captures(content) else {
        return Ok((Map::new(), content.to_string()));
    };

    let yaml = captures.get(1).map_or("", |m| m.as_str());
    let body = captures.get(2).map_or("", |m| m.as_str());

    let data = if yaml.trim().is_empty() {
        Map::new()
    } else {
        match serde_yaml::from_str::<Value>(yaml)? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            _ => return Err(FrontMatterError::NotAMapping),
        }
    };

    Ok((data, body.to_string()))
}

/// Where a document is written and how it is linked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permalink {
    /// Site-absolute URL, e.g. `/blog/a/`.
    pub url: String,
    /// Output file relative to the output directory.
    pub output: PathBuf,
}

impl Permalink {
    /// Default mapping from an input-relative path.
    pub fn from_input(rel: &Path) -> Self {
        let stem = rel
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let parent = rel.parent().unwrap_or(Path::new(""));

        let dir = if stem == "index" {
            parent.to_path_buf()
        } else {
            parent.join(stem)
        };

        let url_path = to_slash(&dir);
        let url = if url_path.is_empty() {
            "/".to_string()
        } else {
            format!("/{url_path}/")
        };

        Self {
            url,
            output: dir.join("index.html"),
        }
    }

    /// Explicit `permalink` value from front matter.
    pub fn from_override(permalink: &str) -> Result<Self> {
        let trimmed = permalink.trim().trim_start_matches('/');
        let output = if trimmed.is_empty() || trimmed.ends_with('/') {
            PathBuf::from(trimmed).join("index.html")
        } else {
            PathBuf::from(trimmed)
        };

        if output
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            bail!("permalink `{permalink}` escapes the output directory");
        }

        Ok(Self {
            url: format!("/{trimmed}"),
            output,
        })
    }
}

/// One template file under the input directory.
#[derive(Debug, Clone)]
pub struct Document {
    /// Absolute source path.
    pub input_path: PathBuf,
    /// Root-relative source path with `/` separators, e.g. `src/blog/a.md`.
    pub rel_path: String,
    pub format: TemplateFormat,
    /// Front matter.
    pub data: Map<String, Value>,
    pub body: String,
    pub date: DateTime<Utc>,
    pub file_slug: String,
    /// `None` when front matter sets `permalink: false`.
    pub permalink: Option<Permalink>,
}

impl Document {
    /// Read and parse a template file.
    pub fn load(path: &Path, root: &Path, input_dir: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let modified = fs::metadata(path)
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        Self::from_source(path, &content, modified, root, input_dir)
    }

    /// Build a document from already-read content.
    ///
    /// `modified` is used as the date when front matter has no usable `date`.
    pub fn from_source(
        path: &Path,
        content: &str,
        modified: DateTime<Utc>,
        root: &Path,
        input_dir: &Path,
    ) -> Result<Self> {
        let format = TemplateFormat::from_path(path)
            .ok_or_else(|| anyhow!("{} is not a template", path.display()))?;
        let input_rel = path.strip_prefix(input_dir).with_context(|| {
            format!("{} is outside {}", path.display(), input_dir.display())
        })?;
        let rel_path = to_slash(path.strip_prefix(root).unwrap_or(path));

        let (data, body) = parse_front_matter(content)
            .with_context(|| format!("Failed to parse front matter of {rel_path}"))?;

        let date = data
            .get("date")
            .and_then(date::parse_value)
            .unwrap_or(modified);
        let file_slug = file_slug(input_rel);

        let permalink = match data.get("permalink") {
            Some(Value::Bool(false)) => None,
            Some(Value::String(s)) if is_templated(s) => {
                let page = json!({
                    "inputPath": format!("./{rel_path}"),
                    "fileSlug": file_slug,
                    "date": date.to_rfc3339_opts(SecondsFormat::Millis, true),
                });
                let rendered = render_permalink(s, &data, &page)
                    .with_context(|| format!("Failed to render permalink of {rel_path}"))?;
                Some(Permalink::from_override(&rendered).with_context(|| format!("In {rel_path}"))?)
            }
            Some(Value::String(s)) => Some(
                Permalink::from_override(s).with_context(|| format!("In {rel_path}"))?,
            ),
            _ => Some(Permalink::from_input(input_rel)),
        };

        Ok(Self {
            input_path: path.to_path_buf(),
            rel_path,
            format,
            data,
            body,
            date,
            file_slug,
            permalink,
        })
    }

    /// Document's `layout` front matter key.
    pub fn layout(&self) -> Option<&str> {
        self.data.get("layout").and_then(Value::as_str)
    }

    pub fn url(&self) -> Option<&str> {
        self.permalink.as_ref().map(|p| p.url.as_str())
    }

    /// The `page` object exposed to templates.
    pub fn page_value(&self) -> Value {
        json!({
            "url": self.url(),
            "inputPath": format!("./{}", self.rel_path),
            "outputPath": self.permalink.as_ref().map(|p| to_slash(&p.output)),
            "fileSlug": self.file_slug,
            "date": self.date.to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }

    /// A collection entry: the `page` object plus front matter under `data`.
    pub fn collection_value(&self) -> Value {
        let mut value = self.page_value();
        if let Value::Object(map) = &mut value {
            map.insert("data".into(), Value::Object(self.data.clone()));
        }
        value
    }
}

fn is_templated(permalink: &str) -> bool {
    permalink.contains("{{") || permalink.contains("{%")
}

/// Render a permalink template with the front matter and a partial `page`.
///
/// `page.url` and `page.outputPath` are not available here.
fn render_permalink(template: &str, data: &Map<String, Value>, page: &Value) -> Result<String> {
    let mut tera = Tera::default();
    filters::register(&mut tera);

    let mut context = tera::Context::new();
    for (key, value) in data {
        context.insert(key.as_str(), value);
    }
    context.insert("page", page);

    Ok(tera.render_str(&filters::guard_undefined(template), &context)?)
}

/// File stem, or the parent directory name for `index` files.
fn file_slug(input_rel: &Path) -> String {
    let stem = input_rel
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    if stem != "index" {
        return stem.to_string();
    }
    input_rel
        .parent()
        .and_then(Path::file_name)
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Join path components with `/` regardless of platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
    }

    fn doc(rel: &str, content: &str) -> Document {
        let path = Path::new("/site/src").join(rel);
        Document::from_source(&path, content, epoch(), Path::new("/site"), Path::new("/site/src"))
            .unwrap()
    }

    #[test]
    fn test_parse_front_matter() {
        let (data, body) =
            parse_front_matter("---\ntitle: Hello\ntags:\n  - a\n---\n# Body\n").unwrap();
        assert_eq!(data["title"], "Hello");
        assert_eq!(data["tags"], json!(["a"]));
        assert_eq!(body, "# Body\n");
    }

    #[test]
    fn test_parse_front_matter_absent() {
        let (data, body) = parse_front_matter("no front matter\n---\n").unwrap();
        assert!(data.is_empty());
        assert_eq!(body, "no front matter\n---\n");
    }

    #[test]
    fn test_parse_front_matter_empty_block() {
        let (data, body) = parse_front_matter("---\n---\nbody").unwrap();
        assert!(data.is_empty());
        assert_eq!(body, "body");
    }

    #[test]
    fn test_parse_front_matter_without_body() {
        let (data, body) = parse_front_matter("---\ntitle: x\n---").unwrap();
        assert_eq!(data["title"], "x");
        assert_eq!(body, "");
    }

    #[test]
    fn test_parse_front_matter_crlf() {
        let (data, body) = parse_front_matter("---\r\ntitle: x\r\n---\r\nbody").unwrap();
        assert_eq!(data["title"], "x");
        assert_eq!(body, "body");
    }

    #[test]
    fn test_parse_front_matter_errors() {
        assert!(matches!(
            parse_front_matter("---\n- a\n- b\n---\n"),
            Err(FrontMatterError::NotAMapping)
        ));
        assert!(matches!(
            parse_front_matter("---\ntitle: [unclosed\n---\n"),
            Err(FrontMatterError::Yaml(_))
        ));
    }

    #[test]
    fn test_default_permalinks() {
        let cases = [
            ("index.njk", "/", "index.html"),
            ("about.md", "/about/", "about/index.html"),
            ("blog/index.md", "/blog/", "blog/index.html"),
            ("blog/a.md", "/blog/a/", "blog/a/index.html"),
            ("blog/sub/b.md", "/blog/sub/b/", "blog/sub/b/index.html"),
        ];
        for (input, url, output) in cases {
            let permalink = Permalink::from_input(Path::new(input));
            assert_eq!(permalink.url, url, "{input}");
            assert_eq!(permalink.output, PathBuf::from(output), "{input}");
        }
    }

    #[test]
    fn test_override_permalinks() {
        let feed = Permalink::from_override("/feed.xml").unwrap();
        assert_eq!(feed.url, "/feed.xml");
        assert_eq!(feed.output, PathBuf::from("feed.xml"));

        let dir = Permalink::from_override("posts/hello/").unwrap();
        assert_eq!(dir.url, "/posts/hello/");
        assert_eq!(dir.output, PathBuf::from("posts/hello/index.html"));

        let root = Permalink::from_override("/").unwrap();
        assert_eq!(root.url, "/");
        assert_eq!(root.output, PathBuf::from("index.html"));
    }

    #[test]
    fn test_templated_permalink() {
        let doc = doc(
            "blog/hello.md",
            "---\ndate: 2024-03-05\nsection: notes\npermalink: \"/{{ section }}/{{ page.date | dateYMD }}/{{ page.fileSlug }}/\"\n---\n",
        );
        let permalink = doc.permalink.unwrap();
        assert_eq!(permalink.url, "/notes/2024-03-05/hello/");
        assert_eq!(permalink.output, PathBuf::from("notes/2024-03-05/hello/index.html"));
    }

    #[test]
    fn test_templated_permalink_errors() {
        let path = Path::new("/site/src/a.md");
        let broken = "---\npermalink: \"/{{ nope }}/\"\n---\n";
        let err = Document::from_source(path, broken, epoch(), Path::new("/site"), Path::new("/site/src"))
            .unwrap_err();
        assert!(format!("{err:#}").contains("permalink"));

        let escaping = "---\nup: \"..\"\npermalink: \"{{ up }}/x.html\"\n---\n";
        assert!(
            Document::from_source(path, escaping, epoch(), Path::new("/site"), Path::new("/site/src"))
                .is_err()
        );
    }

    #[test]
    fn test_override_cannot_escape_output() {
        assert!(Permalink::from_override("../outside.html").is_err());
        assert!(Permalink::from_override("a/../b.html").is_err());
    }

    #[test]
    fn test_document_fields() {
        let doc = doc("blog/a.md", "---\ntitle: A\ndate: 2024-03-05\nlayout: post.njk\n---\nHi");
        assert_eq!(doc.rel_path, "src/blog/a.md");
        assert_eq!(doc.format, TemplateFormat::Md);
        assert_eq!(doc.file_slug, "a");
        assert_eq!(doc.layout(), Some("post.njk"));
        assert_eq!(doc.url(), Some("/blog/a/"));
        assert_eq!(doc.body, "Hi");
        assert_eq!(doc.date, Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_document_date_falls_back_to_modified() {
        assert_eq!(doc("a.md", "no date").date, epoch());
        assert_eq!(doc("b.md", "---\ndate: someday\n---\n").date, epoch());
    }

    #[test]
    fn test_document_permalink_false() {
        let doc = doc("drafts/x.md", "---\npermalink: false\n---\n");
        assert!(doc.permalink.is_none());
        assert!(doc.url().is_none());
        assert_eq!(doc.page_value()["url"], Value::Null);
    }

    #[test]
    fn test_index_file_slug_uses_parent() {
        assert_eq!(doc("blog/index.md", "").file_slug, "blog");
        assert_eq!(doc("index.njk", "").file_slug, "");
    }

    #[test]
    fn test_page_and_collection_values() {
        let doc = doc("blog/a.md", "---\ntitle: A\ndate: 2024-03-05\n---\n");
        let page = doc.page_value();
        assert_eq!(page["url"], "/blog/a/");
        assert_eq!(page["inputPath"], "./src/blog/a.md");
        assert_eq!(page["outputPath"], "blog/a/index.html");
        assert_eq!(page["fileSlug"], "a");
        assert_eq!(page["date"], "2024-03-05T00:00:00.000Z");

        let item = doc.collection_value();
        assert_eq!(item["data"]["title"], "A");
        assert_eq!(item["url"], "/blog/a/");
    }

    #[test]
    fn test_non_template_rejected() {
        let path = Path::new("/site/src/notes.txt");
        assert!(
            Document::from_source(path, "", epoch(), Path::new("/site"), Path::new("/site/src"))
                .is_err()
        );
    }

    #[test]
    fn test_to_slash() {
        assert_eq!(to_slash(Path::new("a/b/c.md")), "a/b/c.md");
        assert_eq!(to_slash(Path::new("./a")), "a");
        assert_eq!(to_slash(Path::new("")), "");
    }
}
