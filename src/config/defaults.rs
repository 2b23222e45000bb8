//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [dir] Section Defaults
// ============================================================================

pub mod dir {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn input() -> PathBuf {
        "src".into()
    }

    pub fn output() -> PathBuf {
        "_site".into()
    }

    pub fn includes() -> PathBuf {
        "_includes".into()
    }

    pub fn layouts() -> PathBuf {
        "_layouts".into()
    }
}

// ============================================================================
// [templates] Section Defaults
// ============================================================================

pub mod templates {
    use crate::site::layout::{TemplateEngine, TemplateFormat};

    pub fn formats() -> Vec<TemplateFormat> {
        vec![TemplateFormat::Njk, TemplateFormat::Md, TemplateFormat::Html]
    }

    pub fn markdown_engine() -> TemplateEngine {
        TemplateEngine::Njk
    }

    pub fn html_engine() -> TemplateEngine {
        TemplateEngine::Njk
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn passthrough() -> Vec<PathBuf> {
        ["src/images", "src/css", "robots.txt", "_headers"]
            .into_iter()
            .map(PathBuf::from)
            .collect()
    }
}

// ============================================================================
// [[collections]] Defaults
// ============================================================================

pub mod collections {
    use crate::config::CollectionConfig;

    pub fn collections() -> Vec<CollectionConfig> {
        vec![CollectionConfig {
            name: "posts".into(),
            glob: "src/blog/**/*.md".into(),
        }]
    }
}
