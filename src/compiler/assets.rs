use crate::compiler::{collect_all_files, is_up_to_date};
use crate::log;
use crate::site::SiteSetup;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Expand passthrough rules into `(source, destination)` file pairs.
///
/// Missing sources are reported and skipped.
pub fn passthrough_files(setup: &SiteSetup) -> Vec<(PathBuf, PathBuf)> {
    let output = &setup.layout.output_dir;
    let mut files = Vec::new();

    for rule in &setup.passthrough {
        let source = rule.source_in(&setup.root);
        let dest = rule.dest_in(output);

        if source.is_file() {
            files.push((source, dest));
        } else if source.is_dir() {
            files.extend(collect_all_files(&source).into_iter().filter_map(|file| {
                let rel = file.strip_prefix(&source).ok()?.to_path_buf();
                Some((file, dest.join(rel)))
            }));
        } else {
            log!("warn"; "passthrough `{}` not found, skipping", rule.source.display());
        }
    }

    files
}

/// Copy one file byte-for-byte.
///
/// Returns `false` when the destination is already up to date and `clean` is off.
pub fn copy_file(source: &Path, dest: &Path, clean: bool) -> Result<bool> {
    if !clean && is_up_to_date(source, dest) {
        return Ok(false);
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::copy(source, dest).with_context(|| {
        format!("Failed to copy {} to {}", source.display(), dest.display())
    })?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::site::globals::SiteGlobals;

    fn setup(root: &Path) -> SiteSetup {
        let mut config = SiteConfig::default();
        config.resolve_paths(root);
        SiteSetup::with_globals(
            &config,
            SiteGlobals {
                current_year: 2024,
                build_date: "2024-03-05".into(),
            },
        )
    }

    #[test]
    fn test_passthrough_files_expands_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/images/icons")).unwrap();
        fs::write(root.join("src/images/logo.png"), [0x89, b'P', b'N', b'G']).unwrap();
        fs::write(root.join("src/images/icons/a.svg"), "<svg/>").unwrap();
        fs::write(root.join("robots.txt"), "User-agent: *").unwrap();

        let setup = setup(root);
        let output = &setup.layout.output_dir;
        let files = passthrough_files(&setup);
        let dests: Vec<_> = files.iter().map(|(_, d)| d.clone()).collect();

        assert_eq!(
            dests,
            vec![
                output.join("images/icons/a.svg"),
                output.join("images/logo.png"),
                output.join("robots.txt"),
            ]
        );
    }

    #[test]
    fn test_copy_file_is_byte_identical_and_skips_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("logo.png");
        let dest = dir.path().join("out/images/logo.png");
        let bytes = [0x89, b'P', b'N', b'G', 0x00, 0xff];
        fs::write(&source, bytes).unwrap();

        assert!(copy_file(&source, &dest, false).unwrap());
        assert_eq!(fs::read(&dest).unwrap(), bytes);

        assert!(!copy_file(&source, &dest, false).unwrap());
        assert!(copy_file(&source, &dest, true).unwrap());
    }
}
