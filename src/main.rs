//! CLI entry point for the water-quality metrics tool.
//!
//! Provides subcommands for building dashboard snapshots, reporting daily
//! delivery metrics, weekly LPCD and window means, exporting the history
//! table, and polling the sensor API on a fixed interval.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand, ValueEnum};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use water_metrics::{
    config::DashboardConfig,
    dashboard::DashboardSnapshot,
    fetch::load_source,
    ingest::parse_readings,
    metrics::{
        self, AggregatorOptions, NegativeFlow, Population, TrailingInterval, Window,
        format::{format_duration, format_optional},
    },
    model::{Parameter, ReadingSeries, TIMESTAMP_FORMAT},
    output::{EXPORT_TIMESTAMP_FORMAT, print_json, write_daily_records, write_history},
};

const DEFAULT_API_URL: &str = "https://mongodb-api-hmeu.onrender.com";

#[derive(Parser)]
#[command(name = "water_metrics")]
#[command(about = "Daily water-delivery metrics from a sensor API", long_about = None)]
struct Cli {
    /// Sensor API URL or path to a JSON file
    #[arg(long, global = true, env = "SENSOR_API_URL", default_value = DEFAULT_API_URL)]
    source: String,

    /// Dashboard config JSON file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Population served; overrides the config file
    #[arg(long, global = true, env = "POPULATION")]
    population: Option<i64>,

    /// Handling of a pumping interval still open at the end of its day
    #[arg(long, global = true, value_enum, default_value_t = TrailingArg::Discard)]
    trailing: TrailingArg,

    /// Handling of negative flow readings
    #[arg(long, global = true, value_enum, default_value_t = NegativeFlowArg::Zero)]
    negative_flow: NegativeFlowArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum TrailingArg {
    Discard,
    Close,
}

#[derive(Clone, Copy, ValueEnum)]
enum NegativeFlowArg {
    Zero,
    Ignore,
}

#[derive(Subcommand)]
enum Commands {
    /// Build one dashboard snapshot and print or save it as JSON
    Snapshot {
        /// File to write the snapshot JSON to
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Report pumping time, flow and LPCD for every day in the series
    Daily {
        /// CSV file holding one row per date; existing dates are updated
        #[arg(short, long)]
        output: Option<String>,

        /// Only report this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Weekly average LPCD for the seven days ending at a date
    Weekly {
        /// Reference date (YYYY-MM-DD); defaults to the latest reading's date
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Mean TDS, pH and pressure over [start, end)
    Stats {
        #[arg(long, value_parser = parse_datetime)]
        start: NaiveDateTime,

        #[arg(long, value_parser = parse_datetime)]
        end: NaiveDateTime,
    },
    /// Show the most recent value of every parameter
    Latest,
    /// Export the history table as CSV
    Export {
        #[arg(short, long, default_value = "history.csv")]
        output: String,

        #[arg(long, value_parser = parse_datetime, requires = "end")]
        start: Option<NaiveDateTime>,

        #[arg(long, value_parser = parse_datetime, requires = "start")]
        end: Option<NaiveDateTime>,

        /// Gzip compress the CSV
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Poll the sensor API and rebuild the snapshot on every round
    Watch {
        /// Number of rounds (0 = infinite)
        #[arg(short = 'n', long, default_value_t = 0)]
        num_samples: usize,

        /// File the latest snapshot JSON is written to after each round
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Everything a subcommand needs, resolved once from flags, env and config.
struct Runtime {
    source: String,
    api_key: Option<String>,
    config: DashboardConfig,
    options: AggregatorOptions,
}

impl Runtime {
    #[tracing::instrument(skip(self), fields(source = %self.source))]
    async fn load_series(&self) -> Result<ReadingSeries> {
        let bytes = load_source(&self.source, self.api_key.as_deref()).await?;
        let series = parse_readings(&bytes).context("failed to normalize sensor payload")?;
        if series.is_empty() {
            warn!("Sensor payload contained no readings");
        }
        info!(readings = series.len(), "Readings loaded");
        Ok(series)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/water_metrics.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("water_metrics.log"));

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

    let mut config = match &cli.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::default(),
    };
    if let Some(count) = cli.population {
        config.population = Population::new(count)?;
    }

    let ctx = Runtime {
        source: cli.source,
        api_key: std::env::var("SENSOR_API_KEY").ok(),
        config,
        options: AggregatorOptions {
            trailing: match cli.trailing {
                TrailingArg::Discard => TrailingInterval::Discard,
                TrailingArg::Close => TrailingInterval::CloseAtLastReading,
            },
            negative_flow: match cli.negative_flow {
                NegativeFlowArg::Zero => NegativeFlow::TreatAsZero,
                NegativeFlowArg::Ignore => NegativeFlow::Ignore,
            },
        },
    };

    match cli.command {
        Commands::Snapshot { output } => {
            let snapshot = match ctx.load_series().await {
                Ok(series) => DashboardSnapshot::from_series(&series, &ctx.config, ctx.options),
                Err(e) => {
                    error!(error = %e, "Failed to load readings");
                    DashboardSnapshot::from_error(&ctx.config, &e.to_string())
                }
            };
            emit_snapshot(&snapshot, output.as_deref())?;
        }
        Commands::Daily { output, date } => {
            let series = ctx.load_series().await?;
            let series = match date {
                Some(date) => series.for_date(date),
                None => series,
            };
            let daily = metrics::daily_metrics(&series, ctx.config.population, ctx.options);
            if daily.is_empty() {
                info!("No days with timed readings");
            }
            for day in daily.values() {
                info!(
                    date = %day.date,
                    pumping_time = %format_duration(day.pumping_duration),
                    flow_total_kl = day.flow_total,
                    lpcd = %format_optional(Some(day.lpcd), 2),
                    "Daily metrics"
                );
            }
            if let Some(path) = &output {
                write_daily_records(path, &daily)?;
                info!(path, days = daily.len(), "Daily CSV written");
            }
        }
        Commands::Weekly { date } => {
            let series = ctx.load_series().await?;
            let reference = date.or_else(|| series.dates().last().copied());
            let Some(reference) = reference else {
                info!("No dated readings; weekly LPCD unknown");
                return Ok(());
            };
            let daily = metrics::daily_metrics(&series, ctx.config.population, ctx.options);
            let weekly = metrics::weekly_lpcd(&daily, reference);
            info!(
                reference = %reference,
                population = ctx.config.population.get(),
                weekly_lpcd = %format_optional(weekly, 2),
                "Weekly LPCD"
            );
        }
        Commands::Stats { start, end } => {
            let window = Window::new(start, end)?;
            let series = ctx.load_series().await?;
            let stats = metrics::window_stats(&series, &window);
            info!(
                start = %window.start(),
                end = %window.end(),
                samples = stats.samples,
                mean_tds = %format_optional(stats.mean_tds, 2),
                mean_ph = %format_optional(stats.mean_ph, 2),
                mean_pressure = %format_optional(stats.mean_pressure, 2),
                "Window stats"
            );
        }
        Commands::Latest => {
            let series = ctx.load_series().await?;
            match series.latest() {
                Some(latest) => {
                    for param in Parameter::ALL {
                        info!(
                            parameter = param.label(),
                            value = %format_optional(latest.value(param), 2),
                            "Latest value"
                        );
                    }
                }
                None => info!("No data available"),
            }
        }
        Commands::Export {
            output,
            start,
            end,
            gzip,
        } => {
            let series = ctx.load_series().await?;
            let series = match (start, end) {
                (Some(start), Some(end)) => {
                    let window = Window::new(start, end)?;
                    info!(start = %window.start(), end = %window.end(), "Restricting export");
                    series.within(&window)
                }
                _ => series,
            };
            write_history(&output, &series, gzip)?;
        }
        Commands::Watch {
            num_samples,
            output,
        } => {
            watch(&ctx, num_samples, output.as_deref()).await?;
        }
    }

    Ok(())
}

/// Re-fetches the series every `refresh_secs`, merges it into the running
/// store and rebuilds the snapshot from scratch. A failed round is logged and
/// the loop carries on.
#[tracing::instrument(skip(ctx), fields(refresh_secs = ctx.config.refresh_secs))]
async fn watch(ctx: &Runtime, num_samples: usize, output: Option<&str>) -> Result<()> {
    if num_samples == 0 {
        info!("Polling indefinitely. Press Ctrl+C to stop.");
    }

    let mut store = ReadingSeries::default();
    let mut round = 0;

    loop {
        if num_samples > 0 && round >= num_samples {
            break;
        }
        round += 1;

        let snapshot = match ctx.load_series().await {
            Ok(fresh) => {
                store = store.merge(&fresh);
                info!(round, stored = store.len(), "Data updated");
                DashboardSnapshot::from_series(&store, &ctx.config, ctx.options)
            }
            Err(e) => {
                error!(round, error = %e, "Refresh failed");
                DashboardSnapshot::from_error(&ctx.config, &e.to_string())
            }
        };

        if let Err(e) = emit_snapshot(&snapshot, output) {
            error!(round, error = %e, "Failed to write snapshot");
        }

        if num_samples == 0 || round < num_samples {
            tokio::time::sleep(tokio::time::Duration::from_secs(ctx.config.refresh_secs)).await;
        }
    }

    info!(rounds = round, "Finished polling");
    Ok(())
}

fn emit_snapshot(snapshot: &DashboardSnapshot, output: Option<&str>) -> Result<()> {
    match output {
        Some(path) => {
            let body = serde_json::to_vec_pretty(snapshot)?;
            std::fs::write(path, body).with_context(|| format!("failed to write {path}"))?;
            info!(
                path,
                weekly_lpcd = %format_optional(snapshot.weekly_lpcd, 2),
                "Snapshot written"
            );
            Ok(())
        }
        None => print_json(snapshot),
    }
}

/// Accepts both the sensor API layout and the export layout.
fn parse_datetime(raw: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, EXPORT_TIMESTAMP_FORMAT))
        .map_err(|e| {
            format!(
                "expected '{}' or '{}': {}",
                TIMESTAMP_FORMAT, EXPORT_TIMESTAMP_FORMAT, e
            )
        })
}
