use crate::infra_memory::PurgeExpired;
use crate::logger::*;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Periodic cleanup for the memory-backed stores. Redis expires keys itself;
/// the dashmap adapters only drop expired entries lazily on read, so an idle
/// deployment needs this to stay bounded.
pub struct Sweeper {
    stores: Vec<Arc<dyn PurgeExpired>>,
    period: Duration,
    cancel: CancellationToken,
}

impl Sweeper {
    pub fn new(
        stores: Vec<Arc<dyn PurgeExpired>>,
        period: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            stores,
            period,
            cancel,
        }
    }

    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = interval.tick() => {
                    let purged: usize = self.stores.iter().map(|s| s.purge_expired()).sum();
                    if purged > 0 {
                        debug!(purged, "swept expired store entries");
                    }
                }
            }
        }
    }
}
