//! Site building orchestration.
//!
//! Coordinates template rendering and passthrough copying.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── prepare_output()      ──► clear output when cleaning
//!     │
//!     ├── discover_documents()  ──► Document[] + collections
//!     │
//!     ├── Renderer::new()       ──► one shared, read-only Tera
//!     │
//!     └── rayon::join
//!             ├── render + write pages (par_iter)
//!             └── copy passthrough files (par_iter)
//! ```

use crate::{
    compiler::{
        check_output_conflicts, copy_file, discover_documents, passthrough_files,
        render::collections_value, write_page, Renderer,
    },
    config::SiteConfig,
    log,
    logger::ProgressBars,
    site::SiteSetup,
};
use anyhow::{Context, Result, anyhow, bail};
use rayon::prelude::*;
use std::{
    fs,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

/// What a build wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildReport {
    pub pages_written: usize,
    pub assets_copied: usize,
}

/// Build the entire site, rendering pages and copying assets in parallel.
///
/// If `config.build.clean` is true, clears the entire output directory first.
pub fn build_site(config: &SiteConfig) -> Result<BuildReport> {
    let setup = SiteSetup::from_config(config);
    build_with_setup(&setup, config.build.clean)
}

pub fn build_with_setup(setup: &SiteSetup, clean: bool) -> Result<BuildReport> {
    let output = &setup.layout.output_dir;
    prepare_output(setup, clean)?;

    let docs = discover_documents(setup)?;
    check_output_conflicts(&docs)?;

    let collections = collections_value(setup, &docs);
    for (name, items) in &collections {
        let count = items.as_array().map_or(0, Vec::len);
        log!("collection"; "{name}: {count} documents");
    }

    let renderer = Renderer::new(setup, &docs, collections)?;
    let asset_files = passthrough_files(setup);

    let progress =
        ProgressBars::new_filtered(&[("pages", docs.len()), ("assets", asset_files.len())]);
    let inc = |name: &str| {
        if let Some(progress) = &progress {
            progress.inc_by_name(name);
        }
    };

    let has_error = AtomicBool::new(false);
    let first_error: Mutex<Option<anyhow::Error>> = Mutex::new(None);
    let pages_written = AtomicUsize::new(0);
    let assets_copied = AtomicUsize::new(0);

    let fail = |what: &str, err: anyhow::Error| {
        if !has_error.swap(true, Ordering::Relaxed) {
            log!("error"; "{what}: {err:#}");
            if let Ok(mut slot) = first_error.lock() {
                *slot = Some(err.context(what.to_string()));
            }
        }
        anyhow!("Build failed")
    };

    log!("build"; "rendering {} pages...", docs.len());

    let (pages_result, assets_result) = rayon::join(
        || {
            docs.par_iter().try_for_each(|doc| {
                if has_error.load(Ordering::Relaxed) {
                    return Err(anyhow!("Aborted"));
                }
                let written = renderer
                    .render(doc)
                    .and_then(|html| write_page(doc, &html, output))
                    .map_err(|e| fail(&doc.input_path.display().to_string(), e))?;
                if written {
                    pages_written.fetch_add(1, Ordering::Relaxed);
                }
                inc("pages");
                Ok(())
            })
        },
        || {
            asset_files.par_iter().try_for_each(|(source, dest)| {
                if has_error.load(Ordering::Relaxed) {
                    return Err(anyhow!("Aborted"));
                }
                let copied = copy_file(source, dest, clean)
                    .map_err(|e| fail(&source.display().to_string(), e))?;
                if copied {
                    assets_copied.fetch_add(1, Ordering::Relaxed);
                }
                inc("assets");
                Ok(())
            })
        },
    );

    if let Some(progress) = &progress {
        progress.finish();
    }

    // "Aborted" only comes from a worker that stopped after another failed.
    if has_error.load(Ordering::Relaxed) {
        let cause = first_error
            .into_inner()
            .ok()
            .flatten()
            .unwrap_or_else(|| anyhow!("Aborted"));
        return Err(cause.context("Build failed"));
    }
    pages_result?;
    assets_result?;

    let report = BuildReport {
        pages_written: pages_written.into_inner(),
        assets_copied: assets_copied.into_inner(),
    };
    log_build_result(&report, asset_files.len());

    Ok(report)
}

/// Ensure the output directory exists, clearing it first when `clean` is set.
///
/// Refuses to clear a directory that holds the project root or the input.
fn prepare_output(setup: &SiteSetup, clean: bool) -> Result<()> {
    let output = &setup.layout.output_dir;
    if clean && (setup.root.starts_with(output) || setup.layout.input_dir.starts_with(output)) {
        bail!(
            "Refusing to clear {}: it contains the site sources",
            output.display()
        );
    }
    if clean && output.exists() {
        fs::remove_dir_all(output).with_context(|| {
            format!("Failed to clear output directory: {}", output.display())
        })?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))
}

fn log_build_result(report: &BuildReport, asset_total: usize) {
    if report.pages_written == 0 && asset_total == 0 {
        log!("warn"; "output is empty, check the input directory for templates");
        return;
    }
    let skipped = asset_total - report.assets_copied;
    log!(
        "build";
        "done: {} pages, {} assets copied, {} up to date",
        report.pages_written,
        report.assets_copied,
        skipped
    );
}
