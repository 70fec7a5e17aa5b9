//! Configuration types for layout resolution and output.
//!
//! This module provides configuration structures that control how expression
//! failures are handled and how resolved layouts are printed. All types
//! implement [`serde::Deserialize`] for flexible loading from external
//! sources.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level application configuration combining resolve and output settings.
//! - [`ResolveConfig`] - Controls what happens when an expression fails to evaluate.
//! - [`OutputConfig`] - Controls the [`OutputFormat`] and whether group nodes are listed.
//!
//! # Example
//!
//! ```
//! # use trellis::config::{AppConfig, OnError, OutputFormat};
//! let config: AppConfig = serde_json::from_str(
//!     r#"{"resolve": {"on_error": "default"}, "output": {"format": "flat"}}"#,
//! ).unwrap();
//!
//! assert_eq!(config.resolve().on_error(), OnError::Default);
//! assert_eq!(config.output().format(), OutputFormat::Flat);
//! assert!(config.output().include_groups());
//! ```

use std::{fmt, str::FromStr};

use serde::Deserialize;

/// Top-level application configuration combining resolve and output settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Expression resolution section.
    #[serde(default)]
    resolve: ResolveConfig,

    /// Output section.
    #[serde(default)]
    output: OutputConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified sections.
    ///
    /// # Arguments
    ///
    /// * `resolve` - Expression failure policy.
    /// * `output` - Output format settings.
    pub fn new(resolve: ResolveConfig, output: OutputConfig) -> Self {
        Self { resolve, output }
    }

    /// Returns the resolve configuration.
    pub fn resolve(&self) -> &ResolveConfig {
        &self.resolve
    }

    /// Returns the output configuration.
    pub fn output(&self) -> &OutputConfig {
        &self.output
    }
}

/// What to do when an expression cannot be evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    /// Abort resolution of the whole layout set.
    #[default]
    Fail,
    /// Log a warning and use the attribute's default value.
    Default,
}

/// Expression resolution settings.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ResolveConfig {
    #[serde(default)]
    on_error: OnError,
}

impl ResolveConfig {
    pub fn new(on_error: OnError) -> Self {
        Self { on_error }
    }

    /// Returns the expression failure policy.
    pub fn on_error(&self) -> OnError {
        self.on_error
    }
}

/// How a resolved layout is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Indented node tree with row indices.
    #[default]
    Tree,
    /// One node id per line, in traversal order.
    Flat,
    /// The row-expanded hierarchy as JSON.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tree" => Ok(Self::Tree),
            "flat" => Ok(Self::Flat),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "Unknown output format `{other}` (expected tree, flat or json)"
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tree => write!(f, "tree"),
            Self::Flat => write!(f, "flat"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OutputConfig {
    /// Output format.
    #[serde(default)]
    format: OutputFormat,

    /// Whether group nodes are listed in flat output.
    #[serde(default = "default_include_groups")]
    include_groups: bool,
}

fn default_include_groups() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            include_groups: default_include_groups(),
        }
    }
}

impl OutputConfig {
    /// Creates a new [`OutputConfig`].
    ///
    /// # Arguments
    ///
    /// * `format` - Output format.
    /// * `include_groups` - Whether group nodes are listed in flat output.
    pub fn new(format: OutputFormat, include_groups: bool) -> Self {
        Self {
            format,
            include_groups,
        }
    }

    /// Returns the output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Returns whether group nodes are listed in flat output.
    pub fn include_groups(&self) -> bool {
        self.include_groups
    }
}
