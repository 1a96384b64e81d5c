use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use fleet_pipeline::MockWeatherLookup;
use fleet_pipeline::config::WeatherProfile;

// ═══════════════════════════════════════════════════════════════
//  CLI
// ═══════════════════════════════════════════════════════════════

/// Reference implementation of the weather lookup contract: every POST
/// is answered with a uniformly sampled weather, whatever the body says.
#[derive(Parser)]
#[command(name = "weather-sim", about = "Mock weather lookup service")]
struct Cli {
    /// Listen address
    #[arg(long, default_value = "0.0.0.0:8080", env = "WEATHER_SIM_LISTEN")]
    listen: String,

    /// Seed for the PRNG (0 = current time)
    #[arg(long, default_value_t = 0)]
    seed: i64,

    /// Minimum temperature (inclusive)
    #[arg(long, default_value_t = -10)]
    temp_min: i32,

    /// Maximum temperature (exclusive)
    #[arg(long, default_value_t = 50)]
    temp_max: i32,
}

#[derive(Clone)]
struct AppState {
    lookup: Arc<MockWeatherLookup>,
}

#[derive(Debug, thiserror::Error)]
enum WeatherSimError {
    #[error("{0}")]
    Config(String),

    #[error("bind {addr}: {source}")]
    Bind { addr: String, source: std::io::Error },

    #[error("serve: {0}")]
    Serve(#[source] std::io::Error),
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
//  Server
// ═══════════════════════════════════════════════════════════════

async fn run(cli: &Cli) -> Result<(), WeatherSimError> {
    let profile = WeatherProfile {
        temp_min: cli.temp_min,
        temp_max: cli.temp_max,
        ..WeatherProfile::default()
    };
    let lookup = MockWeatherLookup::with_profile(profile, cli.seed)
        .map_err(|e| WeatherSimError::Config(e.to_string()))?;

    let state = AppState { lookup: Arc::new(lookup) };

    let app = Router::new().route("/", post(handle_weather)).with_state(state);

    let listener = tokio::net::TcpListener::bind(&cli.listen)
        .await
        .map_err(|source| WeatherSimError::Bind { addr: cli.listen.clone(), source })?;
    tracing::info!(listen = %cli.listen, "weather-sim listening");

    let token = CancellationToken::new();
    let shutdown = token.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        shutdown.cancel();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(token.cancelled_owned())
        .await
        .map_err(WeatherSimError::Serve)?;

    Ok(())
}

async fn handle_weather(State(state): State<AppState>, body: String) -> impl IntoResponse {
    tracing::info!(body = %body, "received event");
    axum::Json(state.lookup.sample().await)
}
