//! Periodic expiry sweeper
//!
//! Ticks every `sweep_interval_ms` and asks the ledger to evict tickets
//! older than the TTL. Spawned once at engine start, stopped through the
//! shared shutdown token.

use crate::tickets::ledger::TicketLedger;
use crate::utils::time;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct TicketSweeper {
    ledger: Arc<TicketLedger>,
    interval_ms: u64,
    shutdown: CancellationToken,
}

impl TicketSweeper {
    pub fn new(ledger: Arc<TicketLedger>, interval_ms: u64, shutdown: CancellationToken) -> Self {
        Self {
            ledger,
            interval_ms,
            shutdown,
        }
    }

    /// Main loop: sweep on every tick until shutdown
    pub async fn run(self) {
        tracing::info!(interval_ms = self.interval_ms, "Ticket sweeper started");

        let mut interval = tokio::time::interval(Duration::from_millis(self.interval_ms));
        // A stalled runtime should not trigger a burst of catch-up sweeps
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let evicted = self.ledger.sweep_expired(time::now_millis());
                    if evicted > 0 {
                        tracing::info!(evicted, "Swept expired tickets");
                    }
                }
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Ticket sweeper received shutdown signal");
                    break;
                }
            }
        }

        tracing::info!("Ticket sweeper stopped");
    }
}
