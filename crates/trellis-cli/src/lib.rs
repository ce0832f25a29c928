//! CLI logic for the Trellis class diagram tool.
//!
//! This module contains the core CLI logic: it reads a model file and
//! writes the requested diagrams as DOT files.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{fs, path::PathBuf};

use log::{error, info};

use trellis::{
    DiagramBuilder, TrellisError,
    config::{AppConfig, OptionsConfig, OutputConfig},
    model::TypeModel,
    resolver::ConfigurationResolver,
};

/// Run the Trellis CLI application
///
/// This function loads the model, then writes the main diagram (or the
/// requested views instead) and optionally one diagram per package and one
/// context diagram per type.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `TrellisError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Model parsing errors
/// - Unknown views
/// - Diagrams that could not be written
pub fn run(args: &Args) -> Result<(), TrellisError> {
    info!(
        input_path = args.input,
        output_dir:? = args.output;
        "Processing model"
    );

    let app_config = with_arguments(config::load_config(args.config.as_ref())?, args);

    let source = fs::read_to_string(&args.input)?;

    let builder = DiagramBuilder::new(app_config);
    let model = builder.load(&source)?;
    let base = builder.base_options(&model);
    let views = builder.build_views(&model, &base)?;

    let mut writer = DiagramWriter::new(&builder, &model);
    if views.is_empty() {
        writer.write(&base);
    } else {
        for view in &views {
            writer.write(view);
        }
    }
    if args.packages {
        for view in builder.package_views(&model, &base) {
            writer.write(view);
        }
    }
    if args.contexts {
        for view in builder.context_views(&model, &base) {
            writer.write(view);
        }
    }

    writer.finish()
}

/// Applies the command-line overrides on top of the loaded configuration.
fn with_arguments(config: AppConfig, args: &Args) -> AppConfig {
    let rules = config
        .options()
        .rules()
        .iter()
        .cloned()
        .chain(args.option_rules());
    let dir = args
        .output
        .as_ref()
        .map_or_else(|| config.output().dir().to_path_buf(), PathBuf::from);
    AppConfig::new(OptionsConfig::new(rules), OutputConfig::new(dir))
}

/// Writes diagrams one after the other; a diagram that fails is logged and
/// does not stop the others.
struct DiagramWriter<'a> {
    builder: &'a DiagramBuilder,
    model: &'a TypeModel,
    written: usize,
    failed: usize,
}

impl<'a> DiagramWriter<'a> {
    fn new(builder: &'a DiagramBuilder, model: &'a TypeModel) -> Self {
        Self {
            builder,
            model,
            written: 0,
            failed: 0,
        }
    }

    fn write<R: ConfigurationResolver>(&mut self, resolver: R) {
        let name = resolver.display_name();
        match self.builder.write_dot(self.model, resolver) {
            Ok(_) => self.written += 1,
            Err(err) => {
                error!(resolver = name, err:%; "Failed to write diagram");
                self.failed += 1;
            }
        }
    }

    fn finish(self) -> Result<(), TrellisError> {
        info!(written = self.written, failed = self.failed; "Diagrams done");
        if self.failed > 0 {
            let total = self.written + self.failed;
            return Err(TrellisError::Export(
                format!("{} of {total} diagrams could not be written", self.failed).into(),
            ));
        }
        Ok(())
    }
}
