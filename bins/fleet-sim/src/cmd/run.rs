use std::time::Duration;

use tokio_util::sync::CancellationToken;

use fleet_pipeline::{DispatchPool, spawn_generator};

use super::config::Effective;
use super::error::FleetSimError;

// ═══════════════════════════════════════════════════════════════
//  Main dispatch
// ═══════════════════════════════════════════════════════════════

pub async fn run(args: &Effective) -> Result<(), FleetSimError> {
    tracing::info!(
        sink = %args.sink,
        count = args.count,
        workers = args.workers,
        interval = args.interval,
        "fleet-sim starting"
    );

    let mut pool = DispatchPool::new(args.sink.build(), args.workers);
    if args.send_timeout_ms > 0 {
        pool = pool.with_send_timeout(Duration::from_millis(args.send_timeout_ms));
    }

    let cancel = CancellationToken::new();

    if args.interval == 0 {
        run_once(&pool, args, &cancel).await;
        return Ok(());
    }

    // Periodic mode: regenerate the fleet every interval until Ctrl+C.
    let mut interval = tokio::time::interval(Duration::from_secs(args.interval));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("stopping");
                cancel.cancel();
                break;
            }
            _ = interval.tick() => {
                run_once(&pool, args, &cancel).await;
            }
        }
    }

    Ok(())
}

async fn run_once(pool: &DispatchPool, args: &Effective, cancel: &CancellationToken) {
    let (rx, generator) = spawn_generator(args.count, args.seed);
    let report = pool.run(rx, cancel.clone()).await;
    let _ = generator.await;

    tracing::info!(
        attempted = report.attempted,
        sent = report.sent,
        skipped = report.skipped_serialize,
        failed = report.failed_send,
        "send complete"
    );
}
