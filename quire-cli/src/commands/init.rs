//! Init command implementation.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = include_str!("../../../quire.yml.example");

/// Initialize a new quire project
pub fn init_project(path: Option<&Path>) -> Result<()> {
    let root = path.unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(root).with_context(|| format!("Failed to create {:?}", root))?;

    write_config(root)?;
    scaffold_site(root)?;

    println!("✓ quire initialized in {:?}", root);
    println!("  - Edit quire.yml to customize site metadata");
    println!("  - Write articles in site/articles/ and references in site/_data/bibliography.bib");
    Ok(())
}

fn write_config(root: &Path) -> Result<()> {
    let config_path = root.join("quire.yml");
    if config_path.exists() {
        println!("quire.yml already exists at {:?}", config_path);
        return Ok(());
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {:?}", config_path))?;
    println!("Created {:?}", config_path);
    Ok(())
}

fn scaffold_site(root: &Path) -> Result<()> {
    let site_root = root.join("site");
    let articles = site_root.join("articles");
    let data = site_root.join("_data");

    for dir in [&site_root, &articles, &data] {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    }

    write_if_missing(&site_root.join("index.md"), INDEX_PAGE)?;
    write_if_missing(&articles.join("welcome.md"), SAMPLE_ARTICLE)?;
    write_if_missing(&data.join("bibliography.bib"), EMPTY_BIBLIOGRAPHY)?;
    Ok(())
}

fn write_if_missing(path: &Path, contents: &str) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    fs::write(path, contents).with_context(|| format!("Failed to write {:?}", path))?;
    println!("Created {:?}", path);
    Ok(())
}

const INDEX_PAGE: &str = r#"---
title: Home
---

# Welcome

Articles in `site/articles/` are listed below, newest first.
"#;

const SAMPLE_ARTICLE: &str = r#"---
title: Welcome to quire
description: A tour of the built-in shortcodes
date: 2025-01-01
tags: [quire, intro]
---

# Welcome

Inline math such as {% math "e^{i\\pi} + 1 = 0" %} renders in place, and
display math gets its own block:

{% mathblock %}
\sum_{k=0}^{n} \binom{n}{k} = 2^n
{% endmathblock %}

Footnotes are numbered across the build.{% footnote %}Like this one.{% endfootnote %}

{% codeblock "rust" %}
fn main() {
    println!("hello");
}
{% endcodeblock %}

Drag the knob or use the arrow keys:

{% slider "momentum" min=0 max=1 step=0.01 value=0.9 ticks %}

Add entries to `site/_data/bibliography.bib` and cite them with
`{% raw %}{% cite "key" %}{% endraw %}`.
"#;

const EMPTY_BIBLIOGRAPHY: &str = "@comment{BibTeX entries cited from articles go here}\n";
