//! CLI entry point for the journey delay engine.
//!
//! Loads journey snapshots from a file or URL, runs the pure delay and
//! rollup queries over them, and writes the results as JSON or CSV.

use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use journey_delay::analyzers::{Thresholds, build_fleet_report};
use journey_delay::fetch::{BasicClient, load_source};
use journey_delay::model::Journey;
use journey_delay::output::{append_sla_rows, print_json, write_json};
use journey_delay::parser::parse_journeys;
use journey_delay::rollup::aggregate_journey;
use journey_delay::stop_detail::detail_journey_stops;
use journey_delay::time::parse_timestamp;
use serde::Serialize;
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
#[command(name = "journey_delay")]
#[command(about = "Delay analytics for delivery journeys", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the fleet delay report for a window of days
    Report {
        /// Path to file or URL with the journey snapshot
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// First day of the window (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,

        /// Last day of the window, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,

        /// JSON file overriding SLA grace and top-N caps
        #[arg(short, long)]
        thresholds: Option<String>,

        /// JSON file to write the report to (logged when omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// CSV file to append daily SLA rows to
        #[arg(long)]
        sla_csv: Option<String>,
    },
    /// Show the rollup and stop details of one journey
    Journey {
        /// Path to file or URL with the journey snapshot
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Journey id
        #[arg(long)]
        id: String,

        /// Evaluate as of this time instead of the local clock
        #[arg(long)]
        now: Option<String>,
    },
    /// Poll a journey and recompute its rollup until it stops being active
    Watch {
        /// Path to file or URL with the journey snapshot
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Journey id
        #[arg(long)]
        id: String,

        /// Seconds between polls
        #[arg(short = 'r', long, default_value_t = 5)]
        interval: u64,

        /// Number of polls (0 = until the journey is no longer active)
        #[arg(short = 'n', long, default_value_t = 0)]
        num_samples: usize,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JourneyView {
    rollup: journey_delay::JourneyRollup,
    stops: Vec<journey_delay::stop_detail::StopDetail>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/journey_delay.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("journey_delay.log"));

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
    let client = BasicClient::new().context("failed to build HTTP client")?;

    match cli.command {
        Commands::Report {
            source,
            from,
            to,
            thresholds,
            output,
            sla_csv,
        } => {
            let thresholds = match thresholds {
                Some(path) => Thresholds::load(&path)
                    .with_context(|| format!("failed to load thresholds from {}", path))?,
                None => Thresholds::default(),
            };

            let journeys = parse_journeys(&load_source(&client, &source).await?)?;
            let report = build_fleet_report(&journeys, from, to, &thresholds)?;

            info!(
                journeys = report.summary.journeys,
                stops = report.summary.stops,
                delayed = report.summary.delayed_stops,
                sla_rate_pct = report.summary.sla_rate_pct,
                "Fleet report built"
            );

            if let Some(path) = sla_csv {
                append_sla_rows(&path, &report.sla_compliance)?;
            }

            match output {
                Some(path) => {
                    write_json(&path, &report)?;
                    info!(path = %path, "Report written");
                }
                None => print_json(&report)?,
            }
        }
        Commands::Journey { source, id, now } => {
            let now = match now {
                Some(raw) => {
                    parse_timestamp(&raw).ok_or_else(|| anyhow!("invalid --now: {}", raw))?
                }
                None => Local::now().naive_local(),
            };

            let journeys = parse_journeys(&load_source(&client, &source).await?)?;
            let journey = find_journey(&journeys, &id)?;

            let view = JourneyView {
                rollup: aggregate_journey(journey, &now)?,
                stops: detail_journey_stops(journey),
            };
            print_json(&view)?;
        }
        Commands::Watch {
            source,
            id,
            interval,
            num_samples,
        } => {
            watch_journey(&client, &source, &id, interval, num_samples).await?;
        }
    }

    Ok(())
}

fn find_journey<'a>(journeys: &'a [Journey], id: &str) -> Result<&'a Journey> {
    journeys
        .iter()
        .find(|j| j.id == id)
        .ok_or_else(|| anyhow!("journey {} not found in snapshot", id))
}

/// Re-fetches the snapshot on a fixed interval and recomputes the rollup of
/// one journey each round. The engine holds no state between rounds.
#[tracing::instrument(skip(client))]
async fn watch_journey(
    client: &BasicClient,
    source: &str,
    id: &str,
    interval: u64,
    num_samples: usize,
) -> Result<()> {
    let mut sample_count = 0;

    loop {
        // Check if we've reached the sample limit (0 = until inactive)
        if num_samples > 0 && sample_count >= num_samples {
            break;
        }
        sample_count += 1;

        let snapshot = match load_source(client, source).await {
            Ok(bytes) => parse_journeys(&bytes),
            Err(e) => Err(e),
        };

        // A bad round is logged and retried on the next tick.
        let journeys = match snapshot {
            Ok(journeys) => journeys,
            Err(e) => {
                warn!(error = %e, "Snapshot fetch failed");
                pause(interval, sample_count, num_samples).await;
                continue;
            }
        };

        let now = Local::now().naive_local();
        let rolled = find_journey(&journeys, id)
            .and_then(|journey| Ok((journey, aggregate_journey(journey, &now)?)));

        match rolled {
            Ok((journey, rollup)) => {
                info!(
                    sample = sample_count,
                    status = %rollup.status,
                    progress_pct = rollup.overall_progress_pct,
                    completed = rollup.completed_count,
                    failed = rollup.failed_count,
                    delayed = rollup.delayed_stop_count,
                    max_delay = rollup.max_actual_delay_minutes,
                    can_complete = rollup.can_complete,
                    "Journey recomputed"
                );

                if rollup.needs_reoptimization {
                    warn!("Journey route changed since start, estimates may be stale");
                }

                if !journey.status.is_active() && num_samples == 0 {
                    info!(status = %journey.status, "Journey no longer active, stopping");
                    break;
                }
            }
            Err(e) => warn!(error = %e, "Journey could not be recomputed from snapshot"),
        }

        pause(interval, sample_count, num_samples).await;
    }

    Ok(())
}

async fn pause(interval: u64, sample_count: usize, num_samples: usize) {
    if num_samples == 0 || sample_count < num_samples {
        tokio::time::sleep(tokio::time::Duration::from_secs(interval)).await;
    }
}
