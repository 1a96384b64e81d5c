use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use fleet_api::{Metric, Rng};

// ═══════════════════════════════════════════════════════════════
//  Generator — synthetic fleet metrics
// ═══════════════════════════════════════════════════════════════

/// Tire pressure is sampled uniformly from this range.
pub const TIRE_PRESSURE_RANGE: (f32, f32) = (0.0, 5.0);
/// Fuel efficiency percentage is sampled uniformly from this range.
pub const FUEL_EFFICIENCY_RANGE: (f32, f32) = (0.0, 100.0);

/// Spawn the generator task: `count` metrics with ids "0".."count-1"
/// pushed into a bounded channel.
///
/// The channel holds a single slot, so the producer suspends until a
/// worker claims the previous metric — a synchronous handoff. Dropping
/// the sender closes the channel; consumers observe end-of-stream
/// without a sentinel value. The sequence is lazy and non-restartable.
pub fn spawn_generator(count: usize, seed: i64) -> (mpsc::Receiver<Metric>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(1);

    let handle = tokio::spawn(async move {
        let mut rng = Rng::new(seed);

        for idx in 0..count {
            let metric = Metric {
                id: idx.to_string(),
                latitude: String::new(),
                longitude: String::new(),
                tire_pressure: rng.next_f32(TIRE_PRESSURE_RANGE.0, TIRE_PRESSURE_RANGE.1),
                fuel_efficiency_percentage: rng
                    .next_f32(FUEL_EFFICIENCY_RANGE.0, FUEL_EFFICIENCY_RANGE.1),
                temperature: None,
                weather_condition: None,
            };

            if tx.send(metric).await.is_err() {
                // Every receiver is gone; nobody is draining this run.
                tracing::warn!(idx, "dispatch queue closed, stopping generation");
                return;
            }
        }

        drop(tx);
        tracing::debug!(count, "generated metrics");
    });

    (rx, handle)
}
