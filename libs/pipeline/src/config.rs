use std::sync::Arc;

use serde::Deserialize;

use fleet_api::{CapabilityError, MessageSink, WeatherCondition};

use crate::sink::{StdoutSink, TcpLineSink};

// ═══════════════════════════════════════════════════════════════
//  Defaults
// ═══════════════════════════════════════════════════════════════

/// Fleet size per generation run.
pub const DEFAULT_COUNT: usize = 10;
/// Dispatch pool width.
pub const DEFAULT_WORKERS: usize = 1;
/// Tire pressure below this raises a low-tire-pressure alarm.
pub const DEFAULT_TIRE_PRESSURE_THRESHOLD: f32 = 2.0;

// ═══════════════════════════════════════════════════════════════
//  Sink endpoints
// ═══════════════════════════════════════════════════════════════

/// One sink endpoint as written in config files and CLI flags:
/// `stdout`, `stdout:<label>`, or `tcp://host:port`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum SinkEndpoint {
    Stdout { label: Option<String> },
    Tcp { addr: String },
}

impl SinkEndpoint {
    pub fn parse(s: &str) -> Result<Self, CapabilityError> {
        if let Some(addr) = s.strip_prefix("tcp://") {
            if addr.is_empty() {
                return Err(CapabilityError::config(format!("empty tcp address: {s}")));
            }
            return Ok(SinkEndpoint::Tcp { addr: addr.to_string() });
        }
        if s == "stdout" {
            return Ok(SinkEndpoint::Stdout { label: None });
        }
        s.strip_prefix("stdout:")
            .map(|label| SinkEndpoint::Stdout { label: Some(label.to_string()) })
            .ok_or_else(|| CapabilityError::config(format!("unknown sink endpoint: {s}")))
    }

    /// Build the sink this endpoint names.
    pub fn build(&self) -> Arc<dyn MessageSink> {
        match self {
            SinkEndpoint::Stdout { label: None } => Arc::new(StdoutSink::new()),
            SinkEndpoint::Stdout { label: Some(label) } => {
                Arc::new(StdoutSink::labeled(label.clone()))
            }
            SinkEndpoint::Tcp { addr } => Arc::new(TcpLineSink::new(addr.clone())),
        }
    }
}

impl TryFrom<String> for SinkEndpoint {
    type Error = CapabilityError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        SinkEndpoint::parse(&s)
    }
}

impl std::fmt::Display for SinkEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkEndpoint::Stdout { label: None } => f.write_str("stdout"),
            SinkEndpoint::Stdout { label: Some(label) } => write!(f, "stdout:{label}"),
            SinkEndpoint::Tcp { addr } => write!(f, "tcp://{addr}"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Weather profile
// ═══════════════════════════════════════════════════════════════

/// Value ranges for the mock weather source. Temperature is half-open:
/// [temp_min, temp_max).
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherProfile {
    #[serde(default = "default_temp_min")]
    pub temp_min: i32,
    #[serde(default = "default_temp_max")]
    pub temp_max: i32,
    #[serde(default = "default_conditions")]
    pub conditions: Vec<WeatherCondition>,
}

impl Default for WeatherProfile {
    fn default() -> Self {
        Self {
            temp_min: default_temp_min(),
            temp_max: default_temp_max(),
            conditions: default_conditions(),
        }
    }
}

impl WeatherProfile {
    pub fn validate(&self) -> Result<(), CapabilityError> {
        if self.temp_max <= self.temp_min {
            return Err(CapabilityError::config(format!(
                "temp_max ({}) must be greater than temp_min ({})",
                self.temp_max, self.temp_min
            )));
        }
        if self.conditions.is_empty() {
            return Err(CapabilityError::config("empty weather condition set"));
        }
        Ok(())
    }
}

fn default_temp_min() -> i32 {
    -10
}

fn default_temp_max() -> i32 {
    50
}

fn default_conditions() -> Vec<WeatherCondition> {
    WeatherCondition::ALL.to_vec()
}
