//! Command-line argument definitions for the Trellis CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the model file, the diagrams to write,
//! the output directory, the configuration file and the logging verbosity.

use clap::Parser;

/// Command-line arguments for the Trellis class diagram tool
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input model file
    #[arg(help = "Path to the TOML model file")]
    pub input: String,

    /// Directory the DOT files are written to, overriding the configuration
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Write the named view only
    #[arg(long, conflicts_with = "views")]
    pub view: Option<String>,

    /// Write every view the model defines
    #[arg(long)]
    pub views: bool,

    /// Also write one diagram per package
    #[arg(long)]
    pub packages: bool,

    /// Also write one context diagram per type
    #[arg(long)]
    pub contexts: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Option rules the flags stand for, applied after the configured ones.
    pub fn option_rules(&self) -> Vec<String> {
        let mut rules = Vec::new();
        if let Some(view) = &self.view {
            rules.push(format!("view {view}"));
        }
        if self.views {
            rules.push("views".to_string());
        }
        rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = Args::parse_from(["trellis", "model.toml", "-o", "out", "--views", "--packages"]);
        assert_eq!(args.input, "model.toml");
        assert_eq!(args.output.as_deref(), Some("out"));
        assert!(args.views && args.packages && !args.contexts);
        assert_eq!(args.log_level, "info");
        assert_eq!(args.option_rules(), vec!["views".to_string()]);
    }

    #[test]
    fn test_view_conflicts_with_views() {
        let result = Args::try_parse_from(["trellis", "model.toml", "--view", "A", "--views"]);
        assert!(result.is_err());

        let args = Args::parse_from(["trellis", "model.toml", "--view", "Shapes"]);
        assert_eq!(args.option_rules(), vec!["view Shapes".to_string()]);
    }
}
