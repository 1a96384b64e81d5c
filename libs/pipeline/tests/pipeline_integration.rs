//! End-to-end runs of both pipelines against in-memory sinks.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use fleet_api::{CapabilityError, MessageSink, Metric};
use fleet_pipeline::{DispatchPool, EnrichmentStage, MockWeatherLookup, spawn_generator};

/// Sink that records every payload it receives.
#[derive(Default)]
struct RecordingSink {
    payloads: Mutex<Vec<Vec<u8>>>,
}

impl RecordingSink {
    fn payloads(&self) -> Vec<Vec<u8>> {
        self.payloads.lock().unwrap().clone()
    }
}

impl MessageSink for RecordingSink {
    fn send<'a>(
        &'a self,
        payload: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), CapabilityError>> + Send + 'a>> {
        let payload = payload.to_vec();
        Box::pin(async move {
            self.payloads.lock().unwrap().push(payload);
            Ok(())
        })
    }
}

#[tokio::test]
async fn generation_pipeline_fans_out_the_whole_fleet() {
    const FLEET: usize = 100;

    let sink = Arc::new(RecordingSink::default());
    let pool = DispatchPool::new(sink.clone(), 4);

    let (rx, generator) = spawn_generator(FLEET, 7);
    let report = pool.run(rx, CancellationToken::new()).await;
    generator.await.unwrap();

    assert_eq!(report.attempted, FLEET as u64);
    assert_eq!(report.sent, FLEET as u64);
    assert_eq!(report.skipped_serialize, 0);
    assert_eq!(report.failed_send, 0);

    let ids: HashSet<String> = sink
        .payloads()
        .iter()
        .map(|p| serde_json::from_slice::<Metric>(p).unwrap().id)
        .collect();
    assert_eq!(ids.len(), FLEET, "duplicate or missing delivery");
    for idx in 0..FLEET {
        assert!(ids.contains(&idx.to_string()), "missing id {idx}");
    }
}

#[tokio::test]
async fn generated_metrics_flow_through_the_enrichment_stage() {
    // Stage one: generate a small fleet into a recording sink.
    let bus = Arc::new(RecordingSink::default());
    let (rx, generator) = spawn_generator(10, 3);
    let report = DispatchPool::new(bus.clone(), 2)
        .run(rx, CancellationToken::new())
        .await;
    generator.await.unwrap();
    assert_eq!(report.sent, 10);

    // Stage two: replay each bus payload through the enrichment stage.
    let alarms = Arc::new(RecordingSink::default());
    let enriched = Arc::new(RecordingSink::default());
    let stage = EnrichmentStage::new(
        alarms.clone(),
        enriched.clone(),
        Arc::new(MockWeatherLookup::new(11)),
    );

    let cancel = CancellationToken::new();
    for payload in bus.payloads() {
        stage.handle(&payload, &cancel).await.unwrap();
    }

    let enriched = enriched.payloads();
    assert_eq!(enriched.len(), 10);
    for payload in &enriched {
        let metric: Metric = serde_json::from_slice(payload).unwrap();
        assert!(metric.temperature.is_some());
        assert!(metric.weather_condition.is_some());
    }

    // Every alarm corresponds to a low-pressure metric.
    let low = bus
        .payloads()
        .iter()
        .filter(|p| serde_json::from_slice::<Metric>(p).unwrap().tire_pressure < 2.0)
        .count();
    assert_eq!(alarms.payloads().len(), low);
}
