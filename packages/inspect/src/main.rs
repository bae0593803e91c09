#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI for checking the dashboard inputs.
//!
//! ```text
//! idp_map_inspect datasets
//! idp_map_inspect totals --province Kabul --period 2021
//! idp_map_inspect map --period all --measure net
//! idp_map_inspect unmatched --period 2022
//! idp_map_inspect heatmap --measure Fatalities
//! idp_map_inspect trend
//! idp_map_inspect issues
//! ```
//!
//! Every command prints JSON to stdout. Logging goes to stderr and is
//! controlled by `RUST_LOG`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use idp_map_analytics_models::Period;
use idp_map_dataset::registry;
use idp_map_session::config::{DashboardConfig, MapMeasure};
use idp_map_session::loader::load_dashboard;
use serde::Serialize;

#[derive(Parser)]
#[command(
    name = "idp_map_inspect",
    about = "Inspect Afghan IDP and conflict dashboard inputs"
)]
struct Cli {
    /// Dashboard config file (TOML). Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the dataset files (overrides the config).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the registered datasets
    Datasets,
    /// Totals of one province in one period
    Totals {
        /// Province name, matched exactly
        #[arg(long)]
        province: String,
        /// Period: YYYY, YYYY_YY or all
        #[arg(long, default_value = "all")]
        period: Period,
    },
    /// Province boundaries annotated with a measure, as GeoJSON
    Map {
        /// Period: YYYY, YYYY_YY or all
        #[arg(long, default_value = "all")]
        period: Period,
        /// arrivals, departures or net
        #[arg(long, default_value = "arrivals")]
        measure: MapMeasure,
    },
    /// Boundary names and data keys that failed to match
    Unmatched {
        /// Period: YYYY, YYYY_YY or all
        #[arg(long, default_value = "all")]
        period: Period,
        /// arrivals, departures or net
        #[arg(long, default_value = "arrivals")]
        measure: MapMeasure,
    },
    /// Month-by-year heatmap of the national conflict series
    Heatmap {
        /// Conflict measure (Events or Fatalities)
        #[arg(long, default_value = "Fatalities")]
        measure: String,
    },
    /// Yearly conflict figures alongside national IDP totals
    Trend,
    /// Number of defaulted values per dataset
    Issues,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DatasetListing<'a> {
    id: &'a str,
    name: &'a str,
    file: PathBuf,
    measures: Vec<&'a str>,
}

fn print_json(value: &impl Serialize) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_config(cli: &Cli) -> Result<DashboardConfig, Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => DashboardConfig::from_file(path)?,
        None => DashboardConfig::default().with_env_overrides(),
    };
    Ok(match &cli.data_dir {
        Some(dir) => config.with_data_dir(dir.clone()),
        None => config,
    })
}

fn print_datasets(config: &DashboardConfig) -> Result<(), Box<dyn std::error::Error>> {
    let definitions = registry::all_datasets();
    let listing: Vec<DatasetListing<'_>> = definitions
        .iter()
        .map(|definition| DatasetListing {
            id: &definition.id,
            name: &definition.name,
            file: config.dataset_path(definition),
            measures: definition.measures(),
        })
        .collect();
    print_json(&listing)
}

async fn run(command: Commands, config: &DashboardConfig) -> Result<(), Box<dyn std::error::Error>> {
    if matches!(command, Commands::Datasets) {
        return print_datasets(config);
    }

    let data = load_dashboard(config).await?;
    log::info!("Loaded {} provinces", data.provinces().len());

    match command {
        Commands::Datasets => print_datasets(config),
        Commands::Totals { province, period } => {
            print_json(&data.totals_for_entity_and_period(&province, period))
        }
        Commands::Map { period, measure } => {
            let joined = data.annotated_geometry(period, measure);
            print_json(&joined.to_feature_collection(measure.as_ref()))
        }
        Commands::Unmatched { period, measure } => {
            print_json(&data.annotated_geometry(period, measure).report)
        }
        Commands::Heatmap { measure } => print_json(&data.heatmap(&measure)),
        Commands::Trend => print_json(&data.national_trend().entries()),
        Commands::Issues => print_json(data.coercion_issues()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    run(cli.command, &config).await
}
