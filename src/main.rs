//! CLI entry point for the ridership flow tool.
//!
//! Provides subcommands for aggregating weekly ridership into monthly series,
//! building the full flow chart plan for a renderer, and listing the event
//! timeline.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ridership_flow::{
    aggregate::aggregate_monthly,
    config::FlowConfig,
    ingest::load_records,
    model::Direction,
    output::{print_json, print_pretty, print_timeline, write_chart_json, write_series_csv},
    pipeline::build_chart,
    timeline::TimelineRegistry,
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "ridership_flow")]
#[command(about = "Turn weekly ridership exports into two-direction flow band charts", long_about = None)]
struct Cli {
    /// JSON config file; defaults to the built-in reference chart
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate weekly rows into a gap-free monthly series per direction
    Aggregate {
        /// Path to CSV (optionally .gz) or URL to fetch
        #[arg(short, long, value_name = "FILE_OR_URL")]
        input: String,

        /// CSV file to write the monthly series to
        #[arg(short, long, default_value = "monthly.csv")]
        output: String,
    },
    /// Build the full chart plan (bands, timeline, labels) as JSON
    Plan {
        /// Path to CSV (optionally .gz) or URL to fetch
        #[arg(short, long, value_name = "FILE_OR_URL")]
        input: String,

        /// JSON file to write the chart plan to
        #[arg(short, long, default_value = "flow_chart.json")]
        output: String,

        /// Also log the whole plan as JSON
        #[arg(long, default_value_t = false)]
        print: bool,
    },
    /// List the event timeline for the configured window
    Timeline,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/ridership_flow.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("ridership_flow.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Aggregate { input, output } => {
            let records = load_records(&input, &config)?;
            let aggregation = aggregate_monthly(&records, &config)?;

            write_series_csv(
                &output,
                &[
                    (&aggregation.outbound, config.outbound.station_id.as_str()),
                    (&aggregation.inbound, config.inbound.station_id.as_str()),
                ],
            )?;

            if !aggregation.warnings.is_empty() {
                warn!(
                    count = aggregation.warnings.len(),
                    "Series written with data quality warnings"
                );
            }
        }
        Commands::Plan {
            input,
            output,
            print,
        } => {
            let records = load_records(&input, &config)?;
            let chart = build_chart(&records, &config)?;

            for direction in Direction::ALL {
                let series = chart.series(direction);
                info!(
                    direction = %direction,
                    name = %config.direction(direction).name,
                    months = series.len(),
                    observed = series.entries().iter().filter(|m| m.is_observed()).count(),
                    "Direction summary"
                );
            }

            if print {
                print_json(&chart)?;
            } else {
                print_pretty(&chart);
            }
            write_chart_json(&output, &chart)?;

            if !chart.warnings.is_empty() {
                warn!(
                    count = chart.warnings.len(),
                    "Chart built with data quality warnings"
                );
            }
        }
        Commands::Timeline => {
            let registry = TimelineRegistry::new(config.window, &config.timeline);
            print_timeline(&registry.entries());
        }
    }

    Ok(())
}

/// Loads the config file if given, otherwise the reference defaults.
fn load_config(path: Option<&str>) -> Result<FlowConfig> {
    match path {
        Some(path) => {
            FlowConfig::load(path).with_context(|| format!("loading config from {path}"))
        }
        None => {
            let config = FlowConfig::default();
            config.validate()?;
            Ok(config)
        }
    }
}
