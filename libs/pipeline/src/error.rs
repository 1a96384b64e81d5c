use fleet_api::CapabilityError;

/// Failure of one enrichment invocation, named after the stage that
/// failed. The first failing stage aborts the invocation; nothing already
/// sent is rolled back.
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error("deserialize inbound metric: {0}")]
    Deserialize(#[source] serde_json::Error),

    #[error("alarm sink: {0}")]
    AlarmSink(#[source] CapabilityError),

    #[error("weather lookup: {0}")]
    Lookup(#[source] CapabilityError),

    #[error("serialize enriched metric: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("enriched sink: {0}")]
    EnrichedSink(#[source] CapabilityError),
}
