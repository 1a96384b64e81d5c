pub mod config;
pub mod error;
mod dispatch;
mod enrich;
mod generator;
mod lookup;
mod sink;

#[cfg(test)]
pub(crate) mod testutil;

pub use dispatch::{DispatchPool, DispatchReport};
pub use enrich::{AlarmPolicy, EnrichmentStage};
pub use error::EnrichError;
pub use generator::spawn_generator;
pub use lookup::{HttpWeatherLookup, MockWeatherLookup};
pub use sink::{StdoutSink, TcpLineSink};
