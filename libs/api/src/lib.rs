pub mod capability;
pub mod error;
pub mod rng;
pub mod types;

pub use capability::{MessageSink, WeatherLookup};
pub use error::{CapabilityError, ErrorKind};
pub use rng::Rng;
pub use types::{Alarm, AlarmKind, Metric, Weather, WeatherCondition};
