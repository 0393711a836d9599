//! Per-account delivery scheduler.

pub(crate) mod sweep;

use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use serde::Deserialize;
use tokio::sync::{Notify, broadcast};
use tracing::{debug, error, warn};

use driftmail_common::{Signal, internal};
use driftmail_outbox::Outbox;

use crate::{
    bounce::BounceNotifier,
    channel::SecureChannel,
    error::DeliveryError,
    network::KeylessInserter,
    types::SweepStats,
};

const fn default_min_sweep_secs() -> u64 {
    60
}

const fn default_max_tries() -> u32 {
    10
}

const fn default_slot_count() -> u32 {
    1
}

/// Scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Minimum wall-clock duration of one full sweep cycle (in seconds).
    /// If a sweep finishes early the scheduler sleeps out the remainder;
    /// an enqueue wake cuts the sleep short.
    #[serde(default = "default_min_sweep_secs")]
    pub min_sweep_secs: u64,

    /// Delivery attempts per message before it is bounced.
    #[serde(default = "default_max_tries")]
    pub max_tries: u32,

    /// Slot count handed to the keyless insert primitive.
    #[serde(default = "default_slot_count")]
    pub slot_count: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_sweep_secs: default_min_sweep_secs(),
            max_tries: default_max_tries(),
            slot_count: default_slot_count(),
        }
    }
}

/// Background delivery worker for one account.
///
/// Sweeps the account's outbox, dispatching each entry to the keyless or
/// secure-channel path and applying retry and bounce policy. One scheduler
/// per account; accounts share no mutable state.
#[derive(Debug)]
pub struct DeliveryScheduler {
    pub(crate) config: SchedulerConfig,
    pub(crate) account_id: String,
    pub(crate) account_dir: PathBuf,
    pub(crate) outbox: Arc<Outbox>,
    pub(crate) channel: Arc<dyn SecureChannel>,
    pub(crate) inserter: Arc<dyn KeylessInserter>,
    pub(crate) bouncer: Arc<dyn BounceNotifier>,
    wake: Arc<Notify>,
}

impl DeliveryScheduler {
    #[must_use]
    #[allow(clippy::too_many_arguments, reason = "plain constructor over the collaborator seams")]
    pub fn new(
        config: SchedulerConfig,
        account_id: String,
        account_dir: PathBuf,
        outbox: Arc<Outbox>,
        channel: Arc<dyn SecureChannel>,
        inserter: Arc<dyn KeylessInserter>,
        bouncer: Arc<dyn BounceNotifier>,
        wake: Arc<Notify>,
    ) -> Self {
        Self {
            config,
            account_id,
            account_dir,
            outbox,
            channel,
            inserter,
            bouncer,
            wake,
        }
    }

    /// Run one sweep over the outbox.
    ///
    /// # Errors
    /// `NetworkError::ConnectionTerminated` aborts the sweep early; entries
    /// already processed keep their outcomes.
    pub async fn sweep(&self) -> Result<SweepStats, DeliveryError> {
        sweep::sweep_outbox(self).await
    }

    /// Run the delivery loop until shutdown.
    ///
    /// Each cycle sweeps the outbox, then waits out the remainder of
    /// `min_sweep_secs` so an idle account does not busy-loop. The wait is
    /// interruptible by the new-mail wake signal and by the shutdown
    /// broadcast. A terminated node connection ends the worker; everything
    /// else is logged and retried next cycle.
    ///
    /// # Errors
    /// Currently none; fatal conditions stop the worker cleanly.
    pub async fn serve(
        &self,
        mut shutdown: broadcast::Receiver<Signal>,
    ) -> Result<(), DeliveryError> {
        internal!(level = INFO, "delivery scheduler starting for {}", self.account_id);

        loop {
            let start = Instant::now();

            tokio::select! {
                swept = self.sweep() => match swept {
                    Ok(stats) if stats.total() > 0 => {
                        debug!(account = %self.account_id, ?stats, "sweep finished");
                    }
                    Ok(_) => {}
                    Err(e) if e.is_fatal() => {
                        warn!(
                            account = %self.account_id,
                            "node connection terminated, stopping delivery worker"
                        );
                        return Ok(());
                    }
                    Err(e) => {
                        error!(account = %self.account_id, error = %e, "sweep failed");
                    }
                },
                sig = shutdown.recv() => {
                    // Dropping the in-flight sweep cancels it at an await
                    // point; completed entries keep their outcomes.
                    let _ = sig;
                    break;
                }
            }

            let min = Duration::from_secs(self.config.min_sweep_secs);
            let remaining = min.saturating_sub(start.elapsed());

            tokio::select! {
                () = self.wake.notified() => {
                    debug!(account = %self.account_id, "woken by new mail");
                }
                () = tokio::time::sleep(remaining) => {}
                sig = shutdown.recv() => {
                    let _ = sig;
                    break;
                }
            }
        }

        internal!(level = INFO, "delivery scheduler stopped for {}", self.account_id);
        Ok(())
    }
}
