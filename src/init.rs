//! Site initialization module.
//!
//! Creates new site structure with default configuration.

use crate::{config::SiteConfig, log};
use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Files to write ignore patterns to
const IGNORE_FILES: &[&str] = &[".gitignore"];

/// Default site directory structure
const SITE_DIRS: &[&str] = &[
    "src/_includes",
    "src/_layouts",
    "src/blog",
    "src/images",
    "src/css",
];

/// Starter files, relative to the root
const STARTER_FILES: &[(&str, &str)] = &[
    (
        "src/_layouts/base.njk",
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{{ title | default(value="My site") }}</title>
</head>
<body>
{{ content | safe }}
<footer>&copy; {{ currentYear }} · built {{ buildDate | dateReadable }}</footer>
</body>
</html>
"#,
    ),
    (
        "src/index.njk",
        r#"---
layout: base.njk
title: Home
---
<h1>{{ title }}</h1>
<ul>
{% for post in collections.posts %}
  <li><time datetime="{{ post.date | dateYMD }}">{{ post.date | dateReadable }}</time> {{ post.data.title | default(value=post.fileSlug) }}</li>
{% endfor %}
</ul>
"#,
    ),
];

/// Create a new site with default structure
pub fn new_site(config: &SiteConfig, has_name: bool) -> Result<()> {
    let root = config.root.as_path();

    // Without a name the site is created in place, which needs an empty directory.
    if !has_name && !is_dir_empty(root)? {
        bail!(
            "Current directory is not empty. Use `kiln init <SITE_NAME>` to create in a subdirectory."
        );
    }

    if config.config_path.exists() {
        bail!("Config file `{}` already exists.", config.config_path.display());
    }

    init_site_structure(root)?;
    init_default_config(&config.config_path)?;
    init_starter_files(root)?;

    let output = config.dir.output.strip_prefix(root).unwrap_or(&config.dir.output);
    init_ignored_files(root, &[output])?;

    log!("init"; "created site at {}", root.display());
    Ok(())
}

/// Check if a directory is completely empty
fn is_dir_empty(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Write default configuration file
fn init_default_config(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&SiteConfig::default())?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Create site directory structure
fn init_site_structure(root: &Path) -> Result<()> {
    for dir in SITE_DIRS {
        let path = root.join(dir);
        if path.exists() {
            bail!(
                "Path `{}` already exists. Try `kiln init <SITE_NAME>` instead.",
                path.display()
            );
        }
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
    }
    Ok(())
}

fn init_starter_files(root: &Path) -> Result<()> {
    for (rel, content) in STARTER_FILES {
        let path = root.join(rel);
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

/// Initialize ignore files with specified paths
pub fn init_ignored_files(root: &Path, paths: &[&Path]) -> Result<()> {
    let content = paths
        .iter()
        .filter_map(|p| p.to_str())
        .map(|p| format!("{p}\n"))
        .collect::<String>();

    for filename in IGNORE_FILES {
        let path = root.join(filename);
        if !path.exists() {
            fs::write(&path, &content)?;
        }
    }

    Ok(())
}
