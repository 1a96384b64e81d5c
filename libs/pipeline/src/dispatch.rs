use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use fleet_api::{MessageSink, Metric};

use crate::sink::send_with_cancel;

// ═══════════════════════════════════════════════════════════════
//  Dispatch pool — W workers drain one queue into one sink
// ═══════════════════════════════════════════════════════════════

/// Tallies of one pool run. Per-item failures are counted here, never
/// returned as errors — the run succeeds once the queue is drained.
/// `attempted` counts metrics claimed from the queue and always equals
/// `sent + skipped_serialize + failed_send`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub attempted: u64,
    pub sent: u64,
    pub skipped_serialize: u64,
    pub failed_send: u64,
}

impl DispatchReport {
    fn merge(&mut self, other: DispatchReport) {
        self.attempted += other.attempted;
        self.sent += other.sent;
        self.skipped_serialize += other.skipped_serialize;
        self.failed_send += other.failed_send;
    }
}

/// Fixed-size worker pool forwarding generated metrics to one sink.
///
/// The sink is injected at construction; workers claim metrics from a
/// shared queue, so any worker may take any item and no ordering is
/// guaranteed across workers.
pub struct DispatchPool {
    sink: Arc<dyn MessageSink>,
    workers: usize,
    send_timeout: Option<Duration>,
}

impl DispatchPool {
    pub fn new(sink: Arc<dyn MessageSink>, workers: usize) -> Self {
        Self {
            sink,
            workers: workers.max(1),
            send_timeout: None,
        }
    }

    /// Bound every send with a deadline.
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = Some(timeout);
        self
    }

    /// Run the pool until the queue closes and every worker has observed
    /// end-of-stream (join-all barrier). Guarantees each queued metric
    /// was attempted exactly once; failures are logged and tallied, not
    /// surfaced.
    pub async fn run(
        &self,
        rx: mpsc::Receiver<Metric>,
        cancel: CancellationToken,
    ) -> DispatchReport {
        let queue = Arc::new(Mutex::new(rx));
        let mut handles = Vec::with_capacity(self.workers);

        for idx in 0..self.workers {
            let queue = queue.clone();
            let sink = self.sink.clone();
            let cancel = cancel.clone();
            let send_timeout = self.send_timeout;

            handles.push(tokio::spawn(
                worker_loop(queue, sink, cancel, send_timeout)
                    .instrument(tracing::debug_span!("worker", idx)),
            ));
        }

        let mut report = DispatchReport::default();
        for handle in handles {
            match handle.await {
                Ok(tally) => report.merge(tally),
                Err(e) => tracing::error!(error = %e, "worker panicked"),
            }
        }

        tracing::debug!(
            attempted = report.attempted,
            sent = report.sent,
            skipped = report.skipped_serialize,
            failed = report.failed_send,
            "dispatch complete"
        );
        report
    }
}

async fn worker_loop(
    queue: Arc<Mutex<mpsc::Receiver<Metric>>>,
    sink: Arc<dyn MessageSink>,
    cancel: CancellationToken,
    send_timeout: Option<Duration>,
) -> DispatchReport {
    let mut tally = DispatchReport::default();

    loop {
        // Hold the lock only across one claim; sends run unlocked so
        // workers publish concurrently.
        let metric = {
            let mut rx = queue.lock().await;
            rx.recv().await
        };
        let Some(metric) = metric else {
            break; // queue closed and drained
        };
        tally.attempted += 1;

        let payload = match serde_json::to_vec(&metric) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(id = %metric.id, error = %e, "serialize failed, skipping");
                tally.skipped_serialize += 1;
                continue;
            }
        };

        match send_with_cancel(&*sink, &payload, &cancel, send_timeout).await {
            Ok(()) => {
                tracing::debug!(id = %metric.id, "sent");
                tally.sent += 1;
            }
            Err(e) => {
                tracing::warn!(id = %metric.id, error = ?e, "send failed, dropping");
                tally.failed_send += 1;
            }
        }
    }

    tally
}
