use std::future::Future;
use std::pin::Pin;

use crate::error::CapabilityError;
use crate::types::{Metric, Weather};

// ═══════════════════════════════════════════════════════════════
//  Capability traits
// ═══════════════════════════════════════════════════════════════

/// Abstract message-publish operation — the message-bus seam.
///
/// One call is one best-effort publish of an opaque payload; there is no
/// delivery guarantee and no retry inside the capability. Implementations
/// must be shareable across worker tasks. This crate defines only the
/// trait, without a tokio dependency; callers race the returned future
/// against their own cancellation token or deadline.
pub trait MessageSink: Send + Sync {
    fn send<'a>(
        &'a self,
        payload: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), CapabilityError>> + Send + 'a>>;
}

/// Abstract synchronous data-fetch operation — the weather-service seam.
pub trait WeatherLookup: Send + Sync {
    /// Fetch weather for one metric. The whole metric is the request body.
    fn fetch<'a>(
        &'a self,
        metric: &'a Metric,
    ) -> Pin<Box<dyn Future<Output = Result<Weather, CapabilityError>> + Send + 'a>>;
}
