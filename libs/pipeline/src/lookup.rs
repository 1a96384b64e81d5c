use std::future::Future;
use std::pin::Pin;

use tokio::sync::Mutex;

use fleet_api::{CapabilityError, Metric, Rng, Weather, WeatherCondition, WeatherLookup};

use crate::config::WeatherProfile;

// ═══════════════════════════════════════════════════════════════
//  HTTP weather lookup
// ═══════════════════════════════════════════════════════════════

/// Calls the weather service over HTTP: one POST of the metric JSON per
/// fetch, expecting a success status and a weather body. No retry and no
/// fallback value — a failed lookup is the caller's problem.
pub struct HttpWeatherLookup {
    http: reqwest::Client,
    url: String,
}

impl HttpWeatherLookup {
    pub fn new(url: impl Into<String>) -> Result<Self, CapabilityError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| CapabilityError::config(format!("HTTP client: {e}")))?;
        Ok(Self { http, url: url.into() })
    }
}

impl WeatherLookup for HttpWeatherLookup {
    fn fetch<'a>(
        &'a self,
        metric: &'a Metric,
    ) -> Pin<Box<dyn Future<Output = Result<Weather, CapabilityError>> + Send + 'a>> {
        Box::pin(async move {
            tracing::debug!(url = %self.url, id = %metric.id, "calling weather service");

            let resp = self
                .http
                .post(&self.url)
                .json(metric)
                .send()
                .await
                .map_err(|e| CapabilityError::io(format!("weather request: {e}")))?;

            let status = resp.status();
            if !status.is_success() {
                return Err(CapabilityError::status(status.as_u16()));
            }

            resp.json::<Weather>()
                .await
                .map_err(|e| CapabilityError::format_err(format!("weather response: {e}")))
        })
    }
}

// ═══════════════════════════════════════════════════════════════
//  Mock weather lookup
// ═══════════════════════════════════════════════════════════════

/// In-process reference lookup: uniform temperature and condition from a
/// seeded generator. Stands in for the real service in tests and demos;
/// anything honoring the same response schema can replace it.
pub struct MockWeatherLookup {
    profile: WeatherProfile,
    rng: Mutex<Rng>,
}

impl MockWeatherLookup {
    pub fn new(seed: i64) -> Self {
        Self {
            profile: WeatherProfile::default(),
            rng: Mutex::new(Rng::new(seed)),
        }
    }

    /// A bad range or an empty condition set fails here, at construction,
    /// never inside sampling.
    pub fn with_profile(profile: WeatherProfile, seed: i64) -> Result<Self, CapabilityError> {
        profile.validate()?;
        Ok(Self {
            profile,
            rng: Mutex::new(Rng::new(seed)),
        })
    }

    pub async fn sample(&self) -> Weather {
        let mut rng = self.rng.lock().await;
        Weather {
            temperature: rng.next_i32(self.profile.temp_min, self.profile.temp_max),
            weather_condition: self.profile.conditions[rng.next_intn(self.profile.conditions.len())],
        }
    }
}

impl WeatherLookup for MockWeatherLookup {
    fn fetch<'a>(
        &'a self,
        _metric: &'a Metric,
    ) -> Pin<Box<dyn Future<Output = Result<Weather, CapabilityError>> + Send + 'a>> {
        Box::pin(async move { Ok(self.sample().await) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn metric() -> Metric {
        Metric {
            id: "0".to_string(),
            latitude: String::new(),
            longitude: String::new(),
            tire_pressure: 2.5,
            fuel_efficiency_percentage: 60.0,
            temperature: None,
            weather_condition: None,
        }
    }

    #[tokio::test]
    async fn mock_samples_stay_inside_the_profile() {
        let lookup = MockWeatherLookup::new(21);
        for _ in 0..200 {
            let weather = lookup.fetch(&metric()).await.unwrap();
            assert!((-10..50).contains(&weather.temperature));
            assert!(WeatherCondition::ALL.contains(&weather.weather_condition));
        }
    }

    #[tokio::test]
    async fn mock_respects_a_narrow_profile() {
        let profile = WeatherProfile {
            temp_min: 0,
            temp_max: 1,
            conditions: vec![WeatherCondition::Snow],
        };
        let lookup = MockWeatherLookup::with_profile(profile, 4).unwrap();

        let weather = lookup.sample().await;
        assert_eq!(weather.temperature, 0);
        assert_eq!(weather.weather_condition, WeatherCondition::Snow);
    }

    #[test]
    fn mock_rejects_an_invalid_profile() {
        let empty = WeatherProfile { conditions: Vec::new(), ..WeatherProfile::default() };
        assert!(MockWeatherLookup::with_profile(empty, 4).is_err());

        let inverted = WeatherProfile { temp_min: 50, temp_max: -10, ..WeatherProfile::default() };
        assert!(MockWeatherLookup::with_profile(inverted, 4).is_err());
    }

    /// One-shot HTTP server answering every request with a canned response.
    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await;
            stream.write_all(response.as_bytes()).await.unwrap();
            // Drain until the client closes so no unread request bytes
            // turn the close into a reset.
            while let Ok(n) = stream.read(&mut buf).await {
                if n == 0 {
                    break;
                }
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn http_lookup_parses_a_success_response() {
        let url = serve_once(concat!(
            "HTTP/1.1 200 OK\r\n",
            "content-type: application/json\r\n",
            "content-length: 43\r\n",
            "connection: close\r\n",
            "\r\n",
            r#"{"temperature":7,"weatherCondition":"rain"}"#,
        ))
        .await;

        let lookup = HttpWeatherLookup::new(url).unwrap();
        let weather = lookup.fetch(&metric()).await.unwrap();
        assert_eq!(weather.temperature, 7);
        assert_eq!(weather.weather_condition, WeatherCondition::Rain);
    }

    #[tokio::test]
    async fn http_lookup_maps_a_non_success_status() {
        let url = serve_once(
            "HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        )
        .await;

        let lookup = HttpWeatherLookup::new(url).unwrap();
        let err = lookup.fetch(&metric()).await.unwrap_err();
        assert_eq!(err.kind(), fleet_api::ErrorKind::Status);
        assert_eq!(err.message(), "unexpected status code: 503");
    }
}
