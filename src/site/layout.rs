//! Directory roles and template formats handed to the build pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File extensions recognized as templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateFormat {
    Njk,
    Md,
    Html,
}

impl TemplateFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Njk => "njk",
            Self::Md => "md",
            Self::Html => "html",
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        [Self::Njk, Self::Md, Self::Html]
            .into_iter()
            .find(|format| format.extension() == ext)
    }
}

/// Engine that pre-processes a format's body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateEngine {
    /// Nunjucks-style templating (rendered by tera).
    #[default]
    Njk,
    /// Leave the body untouched.
    None,
}

/// Static record describing directory roles and format handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub includes_dir: PathBuf,
    pub layouts_dir: PathBuf,
    pub template_formats: Vec<TemplateFormat>,
    pub markdown_engine: TemplateEngine,
    pub html_engine: TemplateEngine,
}

impl Layout {
    pub fn accepts(&self, path: &Path) -> bool {
        TemplateFormat::from_path(path).is_some_and(|f| self.template_formats.contains(&f))
    }

    /// Whether a body of `format` goes through the template engine.
    pub fn uses_engine(&self, format: TemplateFormat) -> bool {
        match format {
            TemplateFormat::Njk => true,
            TemplateFormat::Md => self.markdown_engine == TemplateEngine::Njk,
            TemplateFormat::Html => self.html_engine == TemplateEngine::Njk,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(formats: Vec<TemplateFormat>, markdown: TemplateEngine) -> Layout {
        Layout {
            input_dir: "src".into(),
            output_dir: "_site".into(),
            includes_dir: "src/_includes".into(),
            layouts_dir: "src/_layouts".into(),
            template_formats: formats,
            markdown_engine: markdown,
            html_engine: TemplateEngine::Njk,
        }
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(TemplateFormat::from_path(Path::new("a/b.md")), Some(TemplateFormat::Md));
        assert_eq!(TemplateFormat::from_path(Path::new("x.njk")), Some(TemplateFormat::Njk));
        assert_eq!(TemplateFormat::from_path(Path::new("x.html")), Some(TemplateFormat::Html));
        assert_eq!(TemplateFormat::from_path(Path::new("notes.txt")), None);
        assert_eq!(TemplateFormat::from_path(Path::new("_headers")), None);
    }

    #[test]
    fn test_accepts_only_configured_formats() {
        let layout = layout(vec![TemplateFormat::Md], TemplateEngine::Njk);
        assert!(layout.accepts(Path::new("post.md")));
        assert!(!layout.accepts(Path::new("index.njk")));
    }

    #[test]
    fn test_uses_engine() {
        let layout = layout(vec![TemplateFormat::Md], TemplateEngine::None);
        assert!(layout.uses_engine(TemplateFormat::Njk));
        assert!(!layout.uses_engine(TemplateFormat::Md));
        assert!(layout.uses_engine(TemplateFormat::Html));
    }
}
