//! Capability doubles shared by the unit tests.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use fleet_api::{CapabilityError, MessageSink, Metric, Weather, WeatherLookup};

/// Sink that records every payload it receives.
#[derive(Default)]
pub(crate) struct RecordingSink {
    payloads: Mutex<Vec<Vec<u8>>>,
}

impl RecordingSink {
    pub(crate) fn payloads(&self) -> Vec<Vec<u8>> {
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

/// Sink that fails every send.
pub(crate) struct FailingSink;

impl MessageSink for FailingSink {
    fn send<'a>(
        &'a self,
        _payload: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), CapabilityError>> + Send + 'a>> {
        Box::pin(async { Err(CapabilityError::io("sink down")) })
    }
}

/// Lookup that answers every fetch with the same weather.
pub(crate) struct FixedLookup(pub(crate) Weather);

impl WeatherLookup for FixedLookup {
    fn fetch<'a>(
        &'a self,
        _metric: &'a Metric,
    ) -> Pin<Box<dyn Future<Output = Result<Weather, CapabilityError>> + Send + 'a>> {
        Box::pin(async move { Ok(self.0) })
    }
}

/// Lookup that fails like a service answering 503.
pub(crate) struct FailingLookup;

impl WeatherLookup for FailingLookup {
    fn fetch<'a>(
        &'a self,
        _metric: &'a Metric,
    ) -> Pin<Box<dyn Future<Output = Result<Weather, CapabilityError>> + Send + 'a>> {
        Box::pin(async { Err(CapabilityError::status(503)) })
    }
}
