//! Command-line interface for `chartmerge`, a nautical chart merge-and-normalize tool.
//!
//! This binary provides a thin CLI over the [`chartmerge_core`] library: it
//! merges a directory of chart datasets into one product per feature class
//! and geometry kind, shifts single datasets into `[0, 360]` longitude space,
//! and lists the known store drivers.
//!
//! # Architecture
//!
//! The CLI is built using [`clap`] for argument parsing and [`tracing`] for structured logging.
//! Library crates log through the `log` facade, bridged into `tracing` at startup.
//!
//! # Available Commands
//!
//! - `merge` - Merge every chart of a directory into per-kind artifacts
//! - `shift` - Shift a single dataset into 0-360 longitude space
//! - `drivers` - List all known store drivers and their capabilities

mod display;

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use tracing::{Level, info, warn};
use tracing_log::LogTracer;
use tracing_subscriber::FmtSubscriber;

use chartmerge_core::drivers::get_drivers;
use chartmerge_core::operations::{self, DEFAULT_DRIVER, MergeRequest, ShiftRequest};
use chartmerge_core::{ChartMergeError, ExcludedFields, MergeOptions, S57_OPTIONS_ENV, S57Options};
use chartmerge_core_common::LayerOptions;

#[derive(Parser)]
#[command(
    name = "chartmerge",
    version,
    about = "Merge nautical chart datasets into normalized per-feature-class products",
    long_about = "chartmerge reads a directory of chart datasets, discovers every feature class \
                  and geometry kind across them, and writes one artifact per (feature class, kind) \
                  with longitudes renormalized into 0-360."
)]
/// Command-line arguments and options for the `chartmerge` CLI.
///
/// This struct defines the top-level CLI interface, including global flags for
/// logging verbosity and the subcommand to execute.
struct Cli {
    /// Enable verbose (INFO level) logging output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug (DEBUG level) logging output with detailed diagnostics.
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands for the `chartmerge` CLI.
#[derive(Subcommand)]
enum Commands {
    /// Merges every chart in a directory into one artifact per feature class and kind.
    ///
    /// Artifacts are named `<PREFIX><CLASS>_<Kind>.<ext>` where kind is one of
    /// `Point`, `Arc` or `Polygon`. Existing artifacts are replaced.
    ///
    /// When the OGR_S57_OPTIONS environment variable is set and non-empty, its
    /// KEY=VALUE list replaces the reader switches (--no-soundg-depth,
    /// --no-lnam-refs, --no-split-multipoint, --return-linkages). Unset it to
    /// let the switches apply.
    Merge {
        /// Directory holding the input charts.
        #[arg(value_name = "SOURCE_DIR")]
        source_dir: PathBuf,

        /// Directory receiving the merged artifacts; created when missing.
        #[arg(value_name = "DEST_DIR")]
        dest_dir: PathBuf,

        /// Prefix prepended to every artifact file name.
        #[arg(short, long, default_value = "")]
        prefix: String,

        /// Store driver used for inputs and outputs.
        #[arg(long, value_name = "DRIVER", default_value = DEFAULT_DRIVER)]
        driver: String,

        /// Additional field to drop from merged schemas (repeatable).
        #[arg(long = "exclude", value_name = "FIELD")]
        exclude: Vec<String>,

        /// Keep every field, including record-management attributes.
        #[arg(long)]
        keep_all_fields: bool,

        /// Do not add a DEPTH attribute to split soundings.
        #[arg(long)]
        no_soundg_depth: bool,

        /// Drop linkage reference attributes on read.
        #[arg(long)]
        no_lnam_refs: bool,

        /// Keep multipoint soundings as single features.
        #[arg(long)]
        no_split_multipoint: bool,

        /// Ask the reader to return feature-to-spatial linkages.
        #[arg(long)]
        return_linkages: bool,

        /// Layer creation option for every artifact, as KEY=VALUE (repeatable).
        #[arg(long = "layer-option", value_name = "KEY=VALUE")]
        layer_options: Vec<String>,
    },

    /// Shifts a dataset's longitudes into 0-360 space.
    ///
    /// The source should use a geographic coordinate system; otherwise a
    /// warning is printed and the shift proceeds.
    Shift {
        /// Input dataset.
        #[arg(value_name = "SRC")]
        source: PathBuf,

        /// Output dataset; replaced when it exists.
        #[arg(value_name = "DST")]
        destination: PathBuf,

        /// Encoding passed to the output layer.
        #[arg(short, long, value_name = "ENCODING")]
        encoding: Option<String>,

        /// Store driver used for input and output.
        #[arg(long, value_name = "DRIVER", default_value = DEFAULT_DRIVER)]
        driver: String,
    },

    /// Lists all known store drivers and their capabilities.
    Drivers,
}

/// Entry point for the `chartmerge` command-line interface.
///
/// This function parses command-line arguments, configures the logging system based on
/// verbosity flags, and dispatches to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if command execution fails or if the logging system cannot be initialized.
fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity flags
    let log_level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    // Bridge logs from the `log` crate to the `tracing` ecosystem.
    LogTracer::init()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Merge {
            source_dir,
            dest_dir,
            prefix,
            driver,
            exclude,
            keep_all_fields,
            no_soundg_depth,
            no_lnam_refs,
            no_split_multipoint,
            return_linkages,
            layer_options,
        } => {
            let excluded = if keep_all_fields {
                ExcludedFields::none()
            } else {
                ExcludedFields::default()
            }
            .with(exclude);
            let s57 = S57Options {
                add_soundg_depth: !no_soundg_depth,
                lnam_refs: !no_lnam_refs,
                split_multipoint: !no_split_multipoint,
                return_linkages,
            };
            let options = MergeOptions::default()
                .with_prefix(prefix)
                .with_excluded(excluded)
                .with_layer_options(parse_layer_options(&layer_options));
            let env_options = std::env::var(S57_OPTIONS_ENV).ok();
            if env_options.as_deref().is_some_and(|v| !v.trim().is_empty()) {
                warn!("{S57_OPTIONS_ENV} is set; it replaces the reader switches");
            }
            let request = MergeRequest::new(source_dir, dest_dir)
                .with_driver(driver)
                .with_options(options)
                .with_open_options(s57.resolve(env_options.as_deref()));
            handle_merge(&request)?;
        },
        Commands::Shift {
            source,
            destination,
            encoding,
            driver,
        } => {
            let mut request = ShiftRequest::new(source, destination).with_driver(driver);
            request.encoding = encoding;
            handle_shift(&request)?;
        },
        Commands::Drivers => {
            handle_drivers();
        },
    }

    Ok(())
}

fn parse_layer_options(entries: &[String]) -> LayerOptions {
    entries.iter().fold(LayerOptions::new(), |options, entry| {
        options.merged_with(&LayerOptions::parse(entry))
    })
}

/// Turns a library error into a message carrying its recovery hint.
fn cli_error(err: &ChartMergeError) -> anyhow::Error {
    match err.recovery_suggestion() {
        Some(hint) => anyhow!("{}\n\n{hint}", err.user_message()),
        None => anyhow!("{}", err.user_message()),
    }
}

fn handle_merge(request: &MergeRequest) -> Result<()> {
    info!(
        "Merging {} into {}",
        request.source_dir.display(),
        request.dest_dir.display()
    );
    let report = operations::merge_charts(request).map_err(|e| cli_error(&e))?;
    display::display_merge_report(&report, &request.dest_dir);
    Ok(())
}

fn handle_shift(request: &ShiftRequest) -> Result<()> {
    info!(
        "Shifting {} to {}",
        request.source.display(),
        request.destination.display()
    );
    let report = operations::shift_dataset(request).map_err(|e| cli_error(&e))?;
    display::display_shift_report(&report);
    Ok(())
}

/// Handles the `drivers` subcommand by displaying a formatted table of known drivers.
fn handle_drivers() {
    display::display_drivers(&get_drivers());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_layer_options_later_entries_win() {
        let options = parse_layer_options(&[
            "ENCODING=LATIN1".to_string(),
            "coordinate_precision=7,ENCODING=UTF-8".to_string(),
        ]);
        assert_eq!(options.get("ENCODING"), Some("UTF-8"));
        assert_eq!(options.get("COORDINATE_PRECISION"), Some("7"));
    }

    #[test]
    fn test_cli_error_carries_hint() {
        let err = chartmerge_core::drivers::resolve_read_write("KML").unwrap_err();
        let message = cli_error(&err).to_string();
        assert!(message.contains("Driver 'KML' not found."));
        assert!(message.contains("chartmerge drivers"));
    }

    #[test]
    fn test_merge_help_names_environment_override() {
        use clap::CommandFactory;
        let mut command = Cli::command();
        let help = command
            .find_subcommand_mut("merge")
            .unwrap()
            .render_long_help()
            .to_string();
        assert!(help.contains(S57_OPTIONS_ENV));
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
