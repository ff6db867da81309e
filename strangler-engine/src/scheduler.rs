use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use strangler_broker::BrokerGateway;
use strangler_integration::CancellationToken;

use crate::cycle::Cycle;
use crate::error::EngineError;

/// Fixed-interval driver for [`Cycle::run`] ("default 15 min,
/// optionally 1 min"). Cycles never overlap: the interval tick is skipped if
/// the previous cycle is still running ("cycles never overlap"),
/// which `MissedTickBehavior::Skip` gives us for free since we only ever
/// await one cycle at a time on this task.
///
/// Grounded on `barter/src/engine/trader.rs`'s `Trader::run` for the
/// tick-driven single-worker loop shape; the overlap-guard and shutdown
/// semantics are this crate's own.
pub struct Scheduler<G> {
    cycle: Arc<Cycle<G>>,
    interval: Duration,
}

impl<G> Scheduler<G>
where
    G: BrokerGateway + 'static,
{
    pub fn new(cycle: Arc<Cycle<G>>, interval: Duration) -> Self {
        Self { cycle, interval }
    }

    /// Runs cycles on a fixed tick until `cancel` fires. A fatal error (spec
    /// §7: credentials invalid) stops the loop and is returned to the
    /// caller; any other cycle error, or a cycle that panics, is logged and
    /// the loop continues on the next tick (spec §7: "a cycle that panics is
    /// treated as a failed cycle").
    pub async fn run(&self, cancel: &CancellationToken) -> Result<(), EngineError> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("scheduler shutting down on cancellation");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    let cycle = Arc::clone(&self.cycle);
                    let cycle_cancel = cancel.clone();
                    let outcome = tokio::spawn(async move { cycle.run(&cycle_cancel).await }).await;

                    match outcome {
                        Ok(Ok(report)) => {
                            info!(
                                market_open = report.market_open,
                                reconciled = report.reconciled,
                                exits_submitted = report.exits_submitted,
                                entry_submitted = report.entry_submitted,
                                skipped_entry_reason = report.skipped_entry_reason,
                                "cycle complete"
                            );
                        }
                        Ok(Err(err)) if err.is_fatal() => {
                            error!(%err, "fatal cycle error, shutting down");
                            return Err(err);
                        }
                        Ok(Err(err)) => {
                            warn!(%err, "cycle failed, will retry next tick");
                        }
                        Err(join_err) => {
                            error!(error = %join_err, "cycle panicked, treating as a failed cycle");
                        }
                    }
                }
            }
        }
    }
}
