use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════
//  Metric
// ═══════════════════════════════════════════════════════════════

/// One telemetry sample flowing through the pipeline.
///
/// Wire format is UTF-8 JSON with camelCase field names. The two weather
/// fields stay absent until the enrichment stage fills them in, and are
/// omitted from the serialized form while absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub id: String,
    /// Reserved for geocoordinates; the generator emits these empty.
    #[serde(default)]
    pub latitude: String,
    #[serde(default)]
    pub longitude: String,
    pub tire_pressure: f32,
    pub fuel_efficiency_percentage: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_condition: Option<WeatherCondition>,
}

impl Metric {
    /// Consume the metric and return a new value with the weather merged in.
    /// Enrichment never mutates a shared metric.
    pub fn with_weather(self, weather: Weather) -> Metric {
        Metric {
            temperature: Some(weather.temperature),
            weather_condition: Some(weather.weather_condition),
            ..self
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Alarm
// ═══════════════════════════════════════════════════════════════

/// Threshold-violation event derived from one metric. Fire-and-forget:
/// sent once to the alarm sink, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarm {
    pub id: String,
    pub kind: AlarmKind,
}

impl Alarm {
    pub fn low_tire_pressure(metric: &Metric) -> Self {
        Self {
            id: metric.id.clone(),
            kind: AlarmKind::LowTirePressure,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlarmKind {
    LowTirePressure,
}

// ═══════════════════════════════════════════════════════════════
//  Weather
// ═══════════════════════════════════════════════════════════════

/// Response schema of the weather lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    pub temperature: i32,
    pub weather_condition: WeatherCondition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCondition {
    Clear,
    Cloudy,
    Rain,
    Snow,
}

impl WeatherCondition {
    pub const ALL: [WeatherCondition; 4] = [
        WeatherCondition::Clear,
        WeatherCondition::Cloudy,
        WeatherCondition::Rain,
        WeatherCondition::Snow,
    ];
}
