use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use fleet_api::WeatherLookup;
use fleet_pipeline::config::{DEFAULT_TIRE_PRESSURE_THRESHOLD, SinkEndpoint};
use fleet_pipeline::{AlarmPolicy, EnrichmentStage, HttpWeatherLookup, MockWeatherLookup};

// ═══════════════════════════════════════════════════════════════
//  CLI
// ═══════════════════════════════════════════════════════════════

/// Each stdin line is one inbound bus payload; the hosting system that
/// would normally deliver and redeliver messages is out of scope, so a
/// failed invocation is logged and the next line is processed.
#[derive(Parser)]
#[command(
    name = "sensor-handler",
    about = "Consumes fleet metrics, raises alarms, enriches with weather"
)]
struct Cli {
    /// Alarm sink endpoint
    #[arg(long, default_value = "stdout:alarms", env = "SENSOR_ALARM_SINK")]
    alarm_sink: String,

    /// Enriched-data sink endpoint
    #[arg(long, default_value = "stdout:enriched", env = "SENSOR_ENRICHED_SINK")]
    enriched_sink: String,

    /// Weather service URL (ignored with --mock-weather)
    #[arg(long, default_value = "http://127.0.0.1:8080", env = "SENSOR_WEATHER_URL")]
    weather_url: String,

    /// Use the in-process mock weather lookup instead of HTTP
    #[arg(long)]
    mock_weather: bool,

    /// Seed for the mock lookup (0 = current time)
    #[arg(long, default_value_t = 0)]
    seed: i64,

    /// Low tire pressure threshold
    #[arg(long, default_value_t = DEFAULT_TIRE_PRESSURE_THRESHOLD)]
    threshold: f32,

    /// Alarm failure policy: fatal | continue
    #[arg(long, default_value = "fatal")]
    alarm_policy: String,

    /// Per-send deadline in milliseconds (0 = none)
    #[arg(long, default_value_t = 0)]
    send_timeout_ms: u64,
}

#[derive(Debug, thiserror::Error)]
enum HandlerError {
    #[error("{0}")]
    Config(String),

    #[error("stdin: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

// ═══════════════════════════════════════════════════════════════
//  Handler loop
// ═══════════════════════════════════════════════════════════════

async fn run(cli: &Cli) -> Result<(), HandlerError> {
    let stage = build_stage(cli)?;

    tracing::info!(
        alarm_sink = %cli.alarm_sink,
        enriched_sink = %cli.enriched_sink,
        threshold = cli.threshold,
        "sensor-handler ready, reading metrics from stdin"
    );

    let cancel = CancellationToken::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut processed = 0u64;
    let mut failed = 0u64;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("stopping");
                cancel.cancel();
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break; // EOF
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match stage.handle(line.as_bytes(), &cancel).await {
                    Ok(()) => processed += 1,
                    Err(e) => {
                        failed += 1;
                        tracing::error!(error = %e, "invocation failed");
                    }
                }
            }
        }
    }

    tracing::info!(processed, failed, "handler stopped");
    Ok(())
}

fn build_stage(cli: &Cli) -> Result<EnrichmentStage, HandlerError> {
    let alarm_sink = SinkEndpoint::parse(&cli.alarm_sink)
        .map_err(|e| HandlerError::Config(e.to_string()))?
        .build();
    let enriched_sink = SinkEndpoint::parse(&cli.enriched_sink)
        .map_err(|e| HandlerError::Config(e.to_string()))?
        .build();

    let lookup: Arc<dyn WeatherLookup> = if cli.mock_weather {
        Arc::new(MockWeatherLookup::new(cli.seed))
    } else {
        Arc::new(
            HttpWeatherLookup::new(&cli.weather_url)
                .map_err(|e| HandlerError::Config(e.to_string()))?,
        )
    };

    let policy = match cli.alarm_policy.as_str() {
        "fatal" => AlarmPolicy::Fatal,
        "continue" => AlarmPolicy::LogAndContinue,
        other => {
            return Err(HandlerError::Config(format!("unknown alarm policy: {other}")));
        }
    };

    let mut stage = EnrichmentStage::new(alarm_sink, enriched_sink, lookup)
        .with_threshold(cli.threshold)
        .with_alarm_policy(policy);
    if cli.send_timeout_ms > 0 {
        stage = stage.with_send_timeout(Duration::from_millis(cli.send_timeout_ms));
    }
    Ok(stage)
}
