//! Turning the input tree into output files.
//!
//! - **document**: front matter, dates and permalinks for one template
//! - **render**: tera rendering, markdown conversion and layout chains
//! - **assets**: passthrough copying
//!
//! # Build Flow
//!
//! ```text
//! discover_documents() ──► Renderer::render() ──► write_page()
//!          │                                           │
//!          ▼                                           ▼
//!     Document[]                                   HTML files
//!
//! passthrough_files() ──► copy_file() ──► asset files
//! ```

pub mod assets;
pub mod document;
pub mod render;

use crate::site::SiteSetup;
use anyhow::{Result, bail};
use document::Document;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub use assets::{copy_file, passthrough_files};
pub use render::Renderer;

/// Files to ignore during directory traversal
const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Collect all files from a directory recursively, in file-name order.
///
/// A missing directory yields no files.
pub fn collect_all_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name)
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Check if destination is at least as new as the source.
pub fn is_up_to_date(src: &Path, dst: &Path) -> bool {
    let Ok(src_time) = src.metadata().and_then(|m| m.modified()) else {
        return false;
    };
    let Ok(dst_time) = dst.metadata().and_then(|m| m.modified()) else {
        return false;
    };
    src_time <= dst_time
}

/// Every template under the input directory.
///
/// Includes, layouts, the output directory and passthrough sources are skipped.
pub fn discover_documents(setup: &SiteSetup) -> Result<Vec<Document>> {
    let layout = &setup.layout;
    collect_all_files(&layout.input_dir)
        .into_par_iter()
        .filter(|path| layout.accepts(path))
        .filter(|path| {
            !path.starts_with(&layout.includes_dir)
                && !path.starts_with(&layout.layouts_dir)
                && !path.starts_with(&layout.output_dir)
                && !setup.is_passthrough(path)
        })
        .map(|path| Document::load(&path, &setup.root, &layout.input_dir))
        .collect()
}

/// Fail if two documents claim the same output file.
pub fn check_output_conflicts(docs: &[Document]) -> Result<()> {
    let mut claimed: HashMap<&Path, &str> = HashMap::new();
    for doc in docs {
        let Some(permalink) = &doc.permalink else {
            continue;
        };
        if let Some(first) = claimed.insert(permalink.output.as_path(), &doc.rel_path) {
            bail!(
                "`{}` and `{}` both write {}",
                first,
                doc.rel_path,
                permalink.output.display()
            );
        }
    }
    Ok(())
}

/// Write rendered HTML to the document's output path.
///
/// Returns `false` for documents with `permalink: false`.
pub fn write_page(doc: &Document, html: &str, output_dir: &Path) -> Result<bool> {
    let Some(permalink) = &doc.permalink else {
        return Ok(false);
    };
    let dest = output_dir.join(&permalink.output);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&dest, html)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn doc(rel: &str, content: &str) -> Document {
        let path = Path::new("/site/src").join(rel);
        Document::from_source(&path, content, Utc::now(), Path::new("/site"), Path::new("/site/src"))
            .unwrap()
    }

    #[test]
    fn test_collect_all_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("b/z.md"), "").unwrap();
        fs::write(dir.path().join("a.md"), "").unwrap();
        fs::write(dir.path().join(".DS_Store"), "").unwrap();

        let files = collect_all_files(dir.path());
        assert_eq!(files, vec![dir.path().join("a.md"), dir.path().join("b/z.md")]);
    }

    #[test]
    fn test_collect_all_files_missing_dir() {
        assert!(collect_all_files(Path::new("/definitely/not/here")).is_empty());
    }

    #[test]
    fn test_is_up_to_date() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.txt");
        let dst = dir.path().join("dst.txt");
        fs::write(&src, "a").unwrap();
        assert!(!is_up_to_date(&src, &dst));
        fs::write(&dst, "a").unwrap();
        assert!(is_up_to_date(&src, &dst));
    }

    #[test]
    fn test_output_conflicts() {
        let docs = vec![
            doc("a.md", "---\npermalink: /same.html\n---\n"),
            doc("b.njk", "---\npermalink: same.html\n---\n"),
        ];
        let err = check_output_conflicts(&docs).unwrap_err();
        assert!(err.to_string().contains("same.html"));

        let fine = vec![
            doc("a.md", ""),
            doc("b.md", "---\npermalink: false\n---\n"),
            doc("c.md", "---\npermalink: false\n---\n"),
        ];
        assert!(check_output_conflicts(&fine).is_ok());
    }

    #[test]
    fn test_write_page() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_page(&doc("blog/a.md", ""), "<p>a</p>", dir.path()).unwrap();
        assert!(written);
        assert_eq!(
            fs::read_to_string(dir.path().join("blog/a/index.html")).unwrap(),
            "<p>a</p>"
        );

        let skipped = doc("draft.md", "---\npermalink: false\n---\n");
        assert!(!write_page(&skipped, "x", dir.path()).unwrap());
    }
}
