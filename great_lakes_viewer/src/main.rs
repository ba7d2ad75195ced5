//! Great Lakes viewer command line: compose layers, resolve a feature click,
//! or verify the workspace and NWPS reaches. Output is JSON on stdout.

use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};
use std::path::PathBuf;

use great_lakes_viewer::config::{self, ViewerConfig};
use great_lakes_viewer::logging::{self, DataSource};
use great_lakes_viewer::map_layout::{self, MapView};
use great_lakes_viewer::model::{host_triple, ViewerError};
use great_lakes_viewer::resolver::FeaturePlotResolver;
use great_lakes_viewer::verify;

#[derive(Parser)]
#[command(
    name = "great_lakes_viewer",
    version,
    about = "Great Lakes water level and streamflow viewer"
)]
struct Cli {
    /// Config file (default: $GREAT_LAKES_VIEWER_CONFIG or viewer.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the map view, vector styles and layer groups
    Layers,

    /// Resolve a feature click into a [title, series, layout] triple
    Plot {
        /// Layer the feature belongs to
        #[arg(short, long)]
        layer: String,

        /// Feature identifier, for logging
        #[arg(short = 'i', long, default_value = "")]
        feature_id: String,

        /// Feature properties as a JSON object
        #[arg(short, long)]
        props: String,

        /// Layer data as a JSON object
        #[arg(long, default_value = "{}")]
        layer_data: String,
    },

    /// Check workspace files and, optionally, every reach against NWPS
    Verify {
        /// Query NWPS for every reach on the points layer
        #[arg(long)]
        check_reaches: bool,

        /// Print the full report as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

fn parse_object(flag: &str, text: &str) -> Result<Map<String, Value>, ViewerError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        other => Err(ViewerError::Parse(format!(
            "--{} must be a JSON object, got {}",
            flag, other
        ))),
    }
}

fn run(cli: Cli) -> Result<(), ViewerError> {
    let config_path = cli.config.unwrap_or_else(config::config_path);
    let config = ViewerConfig::from_file(&config_path)?;
    logging::init_logger(
        config.logging.level,
        config.logging.file.as_deref(),
        config.logging.console_timestamps,
    );
    logging::debug(
        DataSource::System,
        None,
        &format!("loaded configuration from {}", config_path.display()),
    );

    match cli.command {
        Command::Layers => {
            let groups = map_layout::compose_layers(&config.app_workspace())?;
            let output = json!({
                "map_view": MapView::from_config(&config),
                "vector_style_map": map_layout::vector_style_map(),
                "layer_groups": groups,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Plot {
            layer,
            feature_id,
            props,
            layer_data,
        } => {
            let props = parse_object("props", &props)?;
            let layer_data = parse_object("layer-data", &layer_data)?;
            let client = config.http_client()?;
            let resolver = FeaturePlotResolver::new(&client, config.nwps.clone());

            let plot = resolver.get_plot_for_layer_feature(
                &layer,
                &feature_id,
                &layer_data,
                &props,
                &config.app_workspace(),
            )?;
            println!("{}", serde_json::to_string_pretty(&host_triple(plot.as_ref()))?);
        }
        Command::Verify {
            check_reaches,
            json,
        } => {
            let report = verify::run_verification(&config, check_reaches)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                verify::print_summary(&report);
            }
        }
    }

    Ok(())
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}
