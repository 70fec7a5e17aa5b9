//! CLI logic for the Trellis layout tool.
//!
//! Loads one or more layout files as pages, expands repeating groups with
//! the given row state, optionally resolves expressions, and prints the
//! resulting node structure.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{fs, path::Path};

use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;

use trellis::{
    DataSources, LayoutBuilder, RepeatingGroups, TrellisError,
    config::{AppConfig, OutputConfig},
};

/// Run the Trellis CLI application
///
/// Every layout file becomes a page named after its file stem. The rendered
/// output goes to the output file when one is given, otherwise to stdout.
///
/// # Errors
///
/// Returns `TrellisError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Malformed layout, row state or data files
/// - Expression failures while resolving
pub fn run(args: &Args) -> Result<(), TrellisError> {
    info!(
        layouts = args.layouts.len(),
        resolve = args.resolve;
        "Processing layouts"
    );

    let mut app_config = config::load_config(args.config.as_ref())?;
    if let Some(format) = args.format {
        let output = OutputConfig::new(format, app_config.output().include_groups());
        app_config = AppConfig::new(*app_config.resolve(), output);
    }

    let builder = LayoutBuilder::new(app_config);

    let mut layouts = IndexMap::with_capacity(args.layouts.len());
    for path in &args.layouts {
        let name = page_name(path);
        let source = fs::read_to_string(path)?;
        let document = builder.parse(&source)?;
        if layouts.insert(name.clone(), document.into_components()).is_some() {
            warn!(page = name.as_str(), path = path.as_str(); "Page name used twice, keeping the last file");
        }
    }

    let current = args
        .current
        .clone()
        .or_else(|| layouts.keys().next().cloned())
        .unwrap_or_default();
    debug!(current = current.as_str(); "Current page selected");

    let repeating_groups: RepeatingGroups = match &args.repeating_groups {
        Some(path) => read_json(path)?,
        None => RepeatingGroups::new(),
    };

    let pages = if args.resolve {
        let data_sources: DataSources = match &args.data {
            Some(path) => read_json(path)?,
            None => DataSources::default(),
        };
        builder.resolve_pages(&layouts, &current, &repeating_groups, &data_sources)?
    } else {
        if args.data.is_some() {
            warn!("Data sources are only read with --resolve");
        }
        builder.build_pages(&layouts, &current, &repeating_groups)
    };

    let rendered = builder.render(&pages)?;

    match &args.output {
        Some(path) => {
            fs::write(path, rendered)?;
            info!(output_file = path.as_str(); "Output written");
        }
        None => print!("{rendered}"),
    }

    Ok(())
}

fn page_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, TrellisError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
