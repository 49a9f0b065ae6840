//! Configuration parsing and management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Main configuration struct matching the quire.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub site: SiteConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// BibTeX files consulted by citations, later files win on key conflicts
    #[serde(default)]
    pub bibliography: Vec<PathBuf>,

    /// Files and directories copied verbatim into the output
    #[serde(default)]
    pub passthrough: Vec<PassthroughCopy>,

    /// Regexes matched against source paths relative to the input directory
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    #[serde(default)]
    pub math: MathConfig,

    #[serde(default)]
    pub server: ServerConfig,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_base_url() -> String {
    String::from("/")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub title: String,

    #[serde(default)]
    pub author: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_input")]
    pub input: PathBuf,

    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Directory under `input` whose pages form the `articles` collection
    #[serde(default = "default_articles")]
    pub articles: PathBuf,
}

fn default_input() -> PathBuf {
    PathBuf::from("site")
}

fn default_output() -> PathBuf {
    PathBuf::from("_site")
}

fn default_articles() -> PathBuf {
    PathBuf::from("articles")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: default_output(),
            articles: default_articles(),
        }
    }
}

/// A passthrough copy rule: either a path copied to the same relative
/// location, or an explicit `from`/`to` rename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PassthroughCopy {
    Same(PathBuf),
    Renamed { from: PathBuf, to: PathBuf },
}

impl PassthroughCopy {
    /// Source path (relative to the config file) and target (relative to output).
    pub fn endpoints(&self) -> (&Path, &Path) {
        match self {
            PassthroughCopy::Same(path) => (path, path),
            PassthroughCopy::Renamed { from, to } => (from, to),
        }
    }
}

/// Which math renderer the `math` and `mathblock` shortcodes use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MathBackend {
    /// Leave TeX in delimiters for MathJax to typeset in the browser
    #[default]
    MathJax,
    /// Translate TeX to Typst and embed SVG at build time
    Typst,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MathConfig {
    #[serde(default)]
    pub backend: MathBackend,

    /// Typst source prepended to every formula (Typst backend only)
    #[serde(default)]
    pub preamble: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Parse configuration text; relative paths resolve against the
    /// working directory until a config path is known.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Anchor relative paths at `root` as if the config file lived there.
    pub fn with_root(mut self, root: &Path) -> Self {
        self.config_path = Some(root.join("quire.yml"));
        self
    }

    pub fn input_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.input)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.output)
    }

    /// Directory of the `articles` collection
    pub fn articles_dir(&self) -> PathBuf {
        self.input_dir().join(&self.paths.articles)
    }

    /// Resolve an arbitrary path relative to the config file location
    pub fn resolve_relative(&self, path: &Path) -> PathBuf {
        self.resolve_path(path)
    }

    /// Get bibliography files, resolved relative to config file
    pub fn bibliography_paths(&self) -> Vec<PathBuf> {
        self.bibliography
            .iter()
            .map(|p| self.resolve_path(p))
            .collect()
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match self.config_path.as_deref().and_then(Path::parent) {
            Some(parent) => parent.join(path),
            None => path.to_path_buf(),
        }
    }

    /// Normalized base URL with leading and trailing slash ("/foo/" or "/")
    pub fn normalized_base_url(&self) -> String {
        normalize_base_url(&self.base_url)
    }
}

/// Ensure base URLs have a leading and trailing slash
pub fn normalize_base_url(raw: &str) -> String {
    let segments: Vec<&str> = raw
        .trim()
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", segments.join("/"))
    }
}
