use clap::Args;
use serde::Deserialize;

use fleet_pipeline::config::{DEFAULT_COUNT, DEFAULT_WORKERS, SinkEndpoint};

use super::error::FleetSimError;

// ═══════════════════════════════════════════════════════════════
//  Config file (TOML)
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    pub count: Option<usize>,
    pub workers: Option<usize>,
    pub seed: Option<i64>,
    pub interval: Option<u64>,
    pub send_timeout_ms: Option<u64>,
    pub sink: Option<SinkEndpoint>,
}

pub fn load_config(path: &str) -> Result<Config, FleetSimError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| FleetSimError::Config(format!("cannot read config {path}: {e}")))?;
    toml::from_str(&content).map_err(|e| FleetSimError::Config(format!("bad config {path}: {e}")))
}

// ═══════════════════════════════════════════════════════════════
//  CLI args
// ═══════════════════════════════════════════════════════════════

#[derive(Args, Clone, Debug)]
pub struct SimArgs {
    /// Path to config.toml
    #[arg(long, default_value = "fleet-sim.toml", env = "FLEET_SIM_CONFIG")]
    pub config: String,

    /// Metrics per run (fleet size)
    #[arg(long)]
    pub count: Option<usize>,

    /// Dispatch pool workers
    #[arg(long)]
    pub workers: Option<usize>,

    /// Seed for the PRNG (0 = current time)
    #[arg(long)]
    pub seed: Option<i64>,

    /// Seconds between runs (0 = run once)
    #[arg(long)]
    pub interval: Option<u64>,

    /// Per-send deadline in milliseconds (0 = none)
    #[arg(long)]
    pub send_timeout_ms: Option<u64>,

    /// Sink endpoint: stdout, stdout:<label>, or tcp://host:port
    #[arg(long)]
    pub sink: Option<String>,
}

// ═══════════════════════════════════════════════════════════════
//  Effective — merged config
// ═══════════════════════════════════════════════════════════════

/// Final configuration after merging: config.toml < env/CLI.
pub struct Effective {
    pub count: usize,
    pub workers: usize,
    pub seed: i64,
    pub interval: u64,
    pub send_timeout_ms: u64,
    pub sink: SinkEndpoint,
}

impl Effective {
    pub fn new(args: &SimArgs) -> Result<Self, FleetSimError> {
        let cfg = match load_config(&args.config) {
            Ok(c) => c,
            Err(e) => {
                if std::path::Path::new(&args.config).exists() {
                    return Err(e);
                }
                Config::default()
            }
        };

        let sink = match &args.sink {
            Some(s) => {
                SinkEndpoint::parse(s).map_err(|e| FleetSimError::Config(e.to_string()))?
            }
            None => cfg.sink.unwrap_or(SinkEndpoint::Stdout { label: None }),
        };

        Ok(Self {
            count: args.count.or(cfg.count).unwrap_or(DEFAULT_COUNT),
            workers: args.workers.or(cfg.workers).unwrap_or(DEFAULT_WORKERS).max(1),
            seed: args.seed.or(cfg.seed).unwrap_or(0),
            interval: args.interval.or(cfg.interval).unwrap_or(0),
            send_timeout_ms: args.send_timeout_ms.or(cfg.send_timeout_ms).unwrap_or(0),
            sink,
        })
    }
}
