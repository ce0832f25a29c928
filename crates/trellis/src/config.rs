//! Configuration types for Trellis diagram generation.
//!
//! This module provides the configuration structures that seed every
//! diagram. All types implement [`serde::Deserialize`] for loading from
//! external sources.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level application configuration.
//! - [`OptionsConfig`] - Option rules applied before any type or view rule.
//! - [`OutputConfig`] - Where diagrams are written.
//!
//! # Example
//!
//! ```
//! # use trellis::config::AppConfig;
//! let config: AppConfig = toml::from_str(r#"
//!     [options]
//!     rules = ["inferrel", "collpackages java\\.util\\..*"]
//!
//!     [output]
//!     dir = "diagrams"
//! "#).unwrap();
//!
//! assert!(config.base_options().infer_relationships());
//! assert_eq!(config.output().dir().to_str(), Some("diagrams"));
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::options::ResolvedOptions;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Option rules section.
    #[serde(default)]
    options: OptionsConfig,

    /// Output section.
    #[serde(default)]
    output: OutputConfig,
}

impl AppConfig {
    pub fn new(options: OptionsConfig, output: OutputConfig) -> Self {
        Self { options, output }
    }

    pub fn options(&self) -> &OptionsConfig {
        &self.options
    }

    pub fn output(&self) -> &OutputConfig {
        &self.output
    }

    /// The root options of every diagram: the defaults with the configured
    /// rules applied in order. Invalid rules are logged and skipped.
    pub fn base_options(&self) -> ResolvedOptions {
        let mut opts = ResolvedOptions::default();
        for rule in &self.options.rules {
            opts.apply_str("configuration", rule);
        }
        opts
    }
}

/// Option rules, written as in `@opt` tags.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptionsConfig {
    #[serde(default)]
    rules: Vec<String>,
}

impl OptionsConfig {
    pub fn new(rules: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            rules: rules.into_iter().map(Into::into).collect(),
        }
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }
}

/// Output settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory diagram paths are relative to.
    #[serde(default = "default_dir")]
    dir: PathBuf,
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dir: default_dir() }
    }
}

impl OutputConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(config.options().rules().is_empty());
        assert_eq!(config.output().dir(), Path::new("."));
        assert_eq!(config.base_options(), ResolvedOptions::default());
    }

    #[test]
    fn test_rules_apply_in_order() {
        let config = AppConfig::new(
            OptionsConfig::new(["attributes", "!attributes", "operations", "nosuchoption"]),
            OutputConfig::default(),
        );
        let opts = config.base_options();
        assert!(!opts.show_attributes());
        assert!(opts.show_operations());
    }

    #[test]
    fn test_partial_file() {
        let config: AppConfig = toml::from_str("[output]\n").unwrap();
        assert_eq!(config.output().dir(), Path::new("."));
    }
}
