//! TOML configuration parsing and validation.
//!
//! ```toml
//! [db]
//! path = "./data/corpora.sqlite"
//!
//! [extraction]
//! pdf_max_pages = 30
//!
//! [search]
//! mode = "fulltext"   # or "substring"
//! ```
//!
//! Only `[db]` is required; the other sections fall back to defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::search::MatchMode;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractionConfig {
    /// PDFs longer than this are cut to their first `pdf_max_pages` pages
    /// before any text is decoded.
    #[serde(default = "default_pdf_max_pages")]
    pub pdf_max_pages: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            pdf_max_pages: default_pdf_max_pages(),
        }
    }
}

fn default_pdf_max_pages() -> usize {
    30
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SearchConfig {
    #[serde(default)]
    pub mode: MatchMode,
}

impl Config {
    /// Builds a configuration with defaults for everything but the database path.
    pub fn default_with_db(path: impl Into<PathBuf>) -> Self {
        Self {
            db: DbConfig { path: path.into() },
            extraction: ExtractionConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.db.path.as_os_str().is_empty() {
        anyhow::bail!("db.path must not be empty");
    }

    if config.extraction.pdf_max_pages == 0 {
        anyhow::bail!("extraction.pdf_max_pages must be >= 1");
    }

    Ok(config)
}
