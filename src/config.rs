//! YAML run configuration (`conf.yaml`).
//!
//! ```yaml
//! config:
//!   input: ./excel
//!   format: json
//!   excludes: "draft,old/"
//! output:
//!   client: ./output/client
//!   server: ./output/server
//! engine:
//!   on_error: abort
//!   leniency: lenient
//!   shorthand_groups: keep_last
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::convert::{ConvertOptions, Leniency, ShorthandGroups};
use crate::error::{Result, ToolError};
use crate::io::export::ExportFormat;
use crate::run::{ErrorPolicy, RunOptions};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "conf.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub config: InputConfig,
    pub output: OutputConfig,
    pub engine: EngineConfig,
}

/// Where workbooks are read from and how records are serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Directory scanned for workbooks.
    pub input: PathBuf,
    pub format: ExportFormat,
    /// Path substrings excluding a workbook.
    pub excludes: Excludes,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("excel"),
            format: ExportFormat::Json,
            excludes: Excludes::default(),
        }
    }
}

/// Exclusion patterns, either a comma-separated string or a YAML list. A
/// bare `excludes:` key is accepted as no patterns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Excludes {
    List(Vec<String>),
    Joined(String),
    Unset,
}

impl Default for Excludes {
    fn default() -> Self {
        Excludes::List(Vec::new())
    }
}

impl Excludes {
    /// Non-empty, trimmed patterns.
    pub fn patterns(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            Excludes::List(items) => items.iter().map(String::as_str).collect(),
            Excludes::Joined(joined) => joined.split(',').collect(),
            Excludes::Unset => Vec::new(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|pattern| !pattern.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub client: PathBuf,
    pub server: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            client: PathBuf::from("output/client"),
            server: PathBuf::from("output/server"),
        }
    }
}

/// Failure policies of the extraction engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub on_error: ErrorPolicy,
    pub leniency: Leniency,
    pub shorthand_groups: ShorthandGroups,
}

impl EngineConfig {
    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            leniency: self.leniency,
            shorthand_groups: self.shorthand_groups,
        }
    }
}

impl RunConfig {
    /// Reads and parses the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ToolError::MissingInput(path.to_path_buf()));
        }
        let source = fs::read_to_string(path)?;
        Self::from_yaml(&source)
    }

    pub fn from_yaml(source: &str) -> Result<Self> {
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(source)?)
    }

    /// Options for [`crate::run::run_directory`].
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            excludes: self.config.excludes.patterns(),
            on_error: self.engine.on_error,
            convert: self.engine.convert_options(),
        }
    }
}
