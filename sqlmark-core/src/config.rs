//! Configuration loading from sqlmark.toml.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

use crate::error::{IoResultExt, SqlmarkError};

/// Name of the configuration file looked up at the analysed root.
pub const CONFIG_FILE: &str = "sqlmark.toml";

/// Main configuration structure for sqlmark.toml.
#[derive(Debug, Deserialize, Default)]
pub struct SqlmarkConfig {
    /// Fully qualified name of the data-access class, e.g. "com.example.DBUtils".
    pub tool_class: Option<String>,
    /// Directory names to skip while scanning.
    pub exclude: Option<Vec<String>>,
    /// Output configuration.
    pub output: Option<OutputConfig>,
}

/// Output format configuration.
#[derive(Debug, Deserialize, Default)]
pub struct OutputConfig {
    /// Output format: "plain" or "json".
    pub format: Option<String>,
}

impl SqlmarkConfig {
    /// The configured tool class, if present and not blank.
    pub fn tool_class(&self) -> Option<&str> {
        self.tool_class
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// True when the output section asks for JSON.
    pub fn wants_json(&self) -> bool {
        self.output
            .as_ref()
            .and_then(|o| o.format.as_deref())
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }
}

/// Loads configuration from sqlmark.toml if it exists.
pub fn load_config(root: &Path) -> Result<Option<SqlmarkConfig>> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path).with_path(&path)?;
    let cfg = toml::from_str(&content)
        .map_err(|e| SqlmarkError::config(&path, e.message()))
        .context("Invalid sqlmark.toml")?;
    Ok(Some(cfg))
}
