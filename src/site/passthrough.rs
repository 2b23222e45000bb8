//! Passthrough asset rules.
//!
//! A rule maps a root-relative source onto a location under the output
//! directory. Sources inside the input directory lose that prefix, so
//! `src/images` lands at `_site/images`; anything else keeps its path, so
//! `robots.txt` lands at `_site/robots.txt`.

use std::path::{Component, Path, PathBuf};

/// A file or directory copied byte-for-byte into the output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassthroughRule {
    /// Source path as configured, relative to the project root.
    pub source: PathBuf,
    /// Destination relative to the output directory.
    pub dest: PathBuf,
}

impl PassthroughRule {
    /// Build a rule for `path`, given the project root and the absolute input directory.
    ///
    /// Existence is not checked here.
    pub fn new(path: &Path, root: &Path, input_dir: &Path) -> Self {
        let source = clean(path.strip_prefix(root).unwrap_or(path));
        let input_rel = clean(input_dir.strip_prefix(root).unwrap_or(input_dir));

        let dest = if source.is_absolute() {
            source.file_name().map(PathBuf::from).unwrap_or_default()
        } else {
            source
                .strip_prefix(&input_rel)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| source.clone())
        };

        Self { source, dest }
    }

    /// Absolute source location.
    pub fn source_in(&self, root: &Path) -> PathBuf {
        root.join(&self.source)
    }

    /// Absolute destination location.
    pub fn dest_in(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.dest)
    }
}

/// Drop `.` components so `./src/css` and `src/css` compare equal.
fn clean(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
