//! End-to-end builds over a temporary site.

use quire_core::{BuildError, Config, SiteBuilder, SourceKind};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CONFIG: &str = r#"
site:
  title: "Momentum Notes"
bibliography:
  - refs.bib
ignore_patterns:
  - "\\.draft\\.md$"
"#;

const BIB: &str = r#"
@article{goh2017,
  author = {Goh, Gabriel},
  title = {Why Momentum Really Works},
  journal = {Distill},
  year = {2017}
}

@article{olah2017,
  author = {Olah, Chris and Mordvintsev, Alexander and Schubert, Ludwig},
  title = {Feature Visualization},
  year = {2017}
}
"#;

const MOMENTUM: &str = r#"---
title: Momentum
date: 2017-04-04
tags: [optimization]
---
# Momentum

Gradient descent {% cite "goh2017" %} with {% math "\\beta" %} and
features {% cite "olah2017" %}.

{% slider "beta" min=0 max=1 step=0.1 value=0.5 ticks %}

Second{% footnote %}Note <em>two</em>{% endfootnote %}

{% bibliography %}
"#;

const OLDER: &str = r#"---
title: Older Post
date: 2016-01-01
---
Nothing to see.
"#;

const INDEX: &str = r#"---
title: Home
---
# Welcome

Intro{% footnote %}First note{% endfootnote %}, {% cite "nobody" %} and {% youtube "x" %}.
"#;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn site() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "refs.bib", BIB);
    write(root, "site/articles/momentum.md", MOMENTUM);
    write(root, "site/articles/older.md", OLDER);
    write(root, "site/articles/wip.draft.md", "# ignored");
    write(root, "site/index.md", INDEX);
    write(root, "site/about.html", "<p>About {% code \"sh\" \"ls\" %}</p>");
    write(root, "site/_includes/partial.md", "{% footnote %}never built{% endfootnote %}");
    dir
}

fn builder(root: &Path) -> SiteBuilder {
    let config = Config::from_yaml(CONFIG).unwrap().with_root(root);
    SiteBuilder::new(config)
}

#[test]
fn builds_pages_in_path_order() {
    let dir = site();
    let index = builder(dir.path()).build().unwrap();

    let sources: Vec<_> = index.pages.iter().map(|p| p.source_path.as_str()).collect();
    assert_eq!(
        sources,
        vec![
            "about.html",
            "articles/momentum.md",
            "articles/older.md",
            "index.md"
        ]
    );

    let about = index.find_by_slug("about").unwrap();
    assert_eq!(about.kind, SourceKind::Html);
    assert_eq!(about.title, "about");
    assert_eq!(
        about.content_html,
        r#"<p>About <code class="language-sh">ls</code></p>"#
    );
}

#[test]
fn footnote_ids_restart_every_build() {
    let dir = site();
    let builder = builder(dir.path());

    for _ in 0..2 {
        let index = builder.build().unwrap();
        let ids: Vec<_> = index.footnotes.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 2]);

        let momentum = index.find_by_slug("articles/momentum").unwrap();
        assert_eq!(momentum.footnotes.len(), 1);
        assert_eq!(momentum.footnotes[0].id, 1);
        assert_eq!(momentum.footnotes[0].tooltip, "Note two");

        let home = index.find_by_slug("index").unwrap();
        assert_eq!(home.footnotes[0].id, 2);
        assert!(home
            .content_html
            .contains(r##"<a href="#fn2" id="fnref2" title="First note">[2]</a>"##));
        assert!(home.content_html.contains(r#"<li id="fn2">First note"#));
    }
}

#[test]
fn citations_inside_footnotes_get_tooltips() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "refs.bib", BIB);
    write(
        root,
        "site/notes.md",
        "Text{% footnote %}See {% cite \"goh2017\" %}{% endfootnote %}\n",
    );

    let index = builder(root).build().unwrap();
    let notes = index.find_by_slug("notes").unwrap();
    let (_, section) = notes
        .content_html
        .split_once(r#"<section class="footnotes">"#)
        .unwrap();
    assert!(section.contains(r#"class="reference tooltip""#));
    assert!(section.contains(r#"data-tooltip="Goh (2017). Why Momentum Really Works.""#));
    assert!(!section.contains(r#"class="citation""#));
}

#[test]
fn citations_get_tooltips() {
    let dir = site();
    let index = builder(dir.path()).build().unwrap();
    let momentum = index.find_by_slug("articles/momentum").unwrap();
    let html = &momentum.content_html;

    assert!(html.contains(
        r#"data-cite="goh2017" class="reference tooltip" data-tooltip="Goh (2017). Why Momentum Really Works.">[1]</a>"#
    ));
    assert!(html.contains(
        r#"data-tooltip="Olah et al. (2017). Feature Visualization.">[2]</a>"#
    ));
    assert!(html.contains(r#"<ol class="references"><li id="ref-goh2017">"#));
    assert_eq!(momentum.citations, vec!["goh2017", "olah2017"]);

    let home = index.find_by_slug("index").unwrap();
    assert!(home
        .content_html
        .contains(r#"data-tooltip="Citation not found""#));
    // No bibliography shortcode on the page: the list is appended
    assert!(home.content_html.contains("Missing entry: nobody"));
}

#[test]
fn shortcodes_render_into_markdown_output() {
    let dir = site();
    let index = builder(dir.path()).build().unwrap();
    let html = &index.find_by_slug("articles/momentum").unwrap().content_html;

    assert!(html.contains(r#"<h1 id="momentum">Momentum</h1>"#));
    assert!(html.contains(r"\(\beta\)"));
    assert!(html.contains(r#"<div id="beta" class="slider-host" data-slider"#));
    assert!(html.contains(r#"data-value="0.5""#));
    assert!(html.contains(r#"<div class="d-slider-knob" style="left: 50%"></div>"#));
    assert!(!html.contains("<p><div"));
    assert!(!html.contains('\u{27E6}'));
}

#[test]
fn articles_collection_is_newest_first() {
    let dir = site();
    let index = builder(dir.path()).build().unwrap();
    let titles: Vec<_> = index.articles().iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Momentum", "Older Post"]);

    let summaries = index.article_summaries("/");
    assert_eq!(summaries[0].url, "/articles/momentum.html");
    assert_eq!(summaries[0].tags, vec!["optimization"]);
}

#[test]
fn content_problems_become_diagnostics() {
    let dir = site();
    write(dir.path(), "site/broken.md", "---\ntitle: [oops\n---\nbody");
    let index = builder(dir.path()).build().unwrap();

    assert!(index.find_by_slug("broken").is_none());
    let codes: Vec<_> = index.diagnostics.iter().map(|d| d.code.as_str()).collect();
    assert!(codes.contains(&"frontmatter.invalid"));
    assert!(codes.contains(&"shortcode.unknown"));
    assert!(index.has_errors());

    let unknown = index
        .diagnostics
        .iter()
        .find(|d| d.code == "shortcode.unknown")
        .unwrap();
    assert_eq!(unknown.page.as_deref(), Some("index"));
}

#[test]
fn missing_bibliography_is_reported() {
    let dir = site();
    fs::remove_file(dir.path().join("refs.bib")).unwrap();
    let index = builder(dir.path()).build().unwrap();
    assert!(index
        .diagnostics
        .iter()
        .any(|d| d.code == "bibliography.load_failed"));
}

#[test]
fn duplicate_slugs_fail_the_build() {
    let dir = site();
    write(dir.path(), "site/articles/older.html", "<p>clash</p>");
    let err = builder(dir.path()).build().unwrap_err();
    assert!(matches!(err, BuildError::DuplicateSlug { ref slug, .. } if slug == "articles/older"));
}

#[test]
fn missing_input_directory() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        builder(dir.path()).build(),
        Err(BuildError::MissingInput(_))
    ));
}
