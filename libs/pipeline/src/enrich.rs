use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use fleet_api::{Alarm, CapabilityError, MessageSink, Metric, WeatherLookup};

use crate::config::DEFAULT_TIRE_PRESSURE_THRESHOLD;
use crate::error::EnrichError;
use crate::sink::send_with_cancel;

// ═══════════════════════════════════════════════════════════════
//  Enrichment stage — threshold alarm, weather merge, republish
// ═══════════════════════════════════════════════════════════════

/// What an alarm-sink failure does to the rest of the invocation.
///
/// The alarm dispatch and the enrichment forward are logically
/// independent side effects; this policy makes their coupling explicit
/// instead of implicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlarmPolicy {
    /// Abort the invocation. The enriched metric is never forwarded.
    #[default]
    Fatal,
    /// Log the failure and still enrich and forward the metric.
    LogAndContinue,
}

/// Per-invocation pipeline over exactly one inbound metric payload.
///
/// Stateless across invocations: the hosting system may call `handle`
/// concurrently for independent payloads. Capabilities are injected at
/// construction — two independent sinks (alarms, enriched data) and one
/// lookup.
pub struct EnrichmentStage {
    alarm_sink: Arc<dyn MessageSink>,
    enriched_sink: Arc<dyn MessageSink>,
    lookup: Arc<dyn WeatherLookup>,
    threshold: f32,
    alarm_policy: AlarmPolicy,
    send_timeout: Option<Duration>,
}

impl EnrichmentStage {
    pub fn new(
        alarm_sink: Arc<dyn MessageSink>,
        enriched_sink: Arc<dyn MessageSink>,
        lookup: Arc<dyn WeatherLookup>,
    ) -> Self {
        Self {
            alarm_sink,
            enriched_sink,
            lookup,
            threshold: DEFAULT_TIRE_PRESSURE_THRESHOLD,
            alarm_policy: AlarmPolicy::default(),
            send_timeout: None,
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_alarm_policy(mut self, policy: AlarmPolicy) -> Self {
        self.alarm_policy = policy;
        self
    }

    /// Bound every send with a deadline.
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = Some(timeout);
        self
    }

    /// Process one inbound payload end to end: deserialize, raise a
    /// low-tire-pressure alarm if the threshold is crossed, fetch
    /// weather, merge, republish. The first failing stage aborts the
    /// invocation; an already-sent alarm is not retracted. Success
    /// returns no payload — this stage only dispatches side effects.
    pub async fn handle(
        &self,
        payload: &[u8],
        cancel: &CancellationToken,
    ) -> Result<(), EnrichError> {
        let metric: Metric =
            serde_json::from_slice(payload).map_err(EnrichError::Deserialize)?;

        if metric.tire_pressure < self.threshold {
            let alarm = Alarm::low_tire_pressure(&metric);
            match self.send_alarm(&alarm, cancel).await {
                Ok(()) => tracing::debug!(id = %alarm.id, "alarm sent"),
                Err(e) => match self.alarm_policy {
                    AlarmPolicy::Fatal => return Err(EnrichError::AlarmSink(e)),
                    AlarmPolicy::LogAndContinue => {
                        tracing::warn!(id = %alarm.id, error = ?e, "alarm send failed, continuing");
                    }
                },
            }
        }

        let weather = self
            .lookup
            .fetch(&metric)
            .await
            .map_err(EnrichError::Lookup)?;
        tracing::debug!(
            id = %metric.id,
            temperature = weather.temperature,
            condition = ?weather.weather_condition,
            "got weather"
        );

        let enriched = metric.with_weather(weather);
        let payload = serde_json::to_vec(&enriched).map_err(EnrichError::Serialize)?;
        send_with_cancel(&*self.enriched_sink, &payload, cancel, self.send_timeout)
            .await
            .map_err(EnrichError::EnrichedSink)?;

        Ok(())
    }

    async fn send_alarm(
        &self,
        alarm: &Alarm,
        cancel: &CancellationToken,
    ) -> Result<(), CapabilityError> {
        let payload = serde_json::to_vec(alarm)?;
        send_with_cancel(&*self.alarm_sink, &payload, cancel, self.send_timeout).await
    }
}
