//! Pending-recipient reconciler.
//!
//! Messages composed for recipients with no known network identity wait in
//! the pending store. On a coarse period (much slower than the delivery
//! sweep, to avoid hammering the identity directory) this pass re-asks the
//! directory about every still-pending recipient and fans the resolved
//! ones into the outbox.

use std::{sync::Arc, time::Duration};

use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use driftmail_common::{Signal, address::RecipientAddress, identity::OwnIdentity, internal};

use crate::{
    error::DeliveryError,
    pending::PendingStore,
    resolver::{IdentityResolver, MatchMethod, partition_matches},
    sender::MessageSender,
    types::ReconcileStats,
};

const fn default_retry_interval_secs() -> u64 {
    3600
}

/// Reconciler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconcilerConfig {
    /// Seconds between reconciliation passes.
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            retry_interval_secs: default_retry_interval_secs(),
        }
    }
}

/// Periodic pass resolving not-yet-known recipients for one account.
#[derive(Debug)]
pub struct PendingReconciler {
    config: ReconcilerConfig,
    account_id: String,
    owner: OwnIdentity,
    store: Arc<dyn PendingStore>,
    resolver: Arc<dyn IdentityResolver>,
    sender: MessageSender,
}

impl PendingReconciler {
    #[must_use]
    pub fn new(
        config: ReconcilerConfig,
        account_id: String,
        owner: OwnIdentity,
        store: Arc<dyn PendingStore>,
        resolver: Arc<dyn IdentityResolver>,
        sender: MessageSender,
    ) -> Self {
        Self {
            config,
            account_id,
            owner,
            store,
            resolver,
            sender,
        }
    }

    /// Run one reconciliation pass.
    ///
    /// For each pending record the directory is asked about the whole
    /// still-pending set, by every supported matching method. A recipient
    /// resolves only on exactly one candidate. Resolved recipients are
    /// fanned into the outbox before the record is mutated, so a crash can
    /// duplicate a message but never lose one.
    ///
    /// # Errors
    /// Directory unavailability aborts the pass without modifying any
    /// record. Outbox or store failures abort likewise.
    pub async fn run_once(&self) -> Result<ReconcileStats, DeliveryError> {
        let mut stats = ReconcileStats::default();

        let records = self
            .store
            .list_pending()
            .await
            .map_err(DeliveryError::Pending)?;

        for record in records {
            let matches = self
                .resolver
                .match_identities(&record.pending_recipients, &self.owner, &MatchMethod::ALL)
                .await?;

            let outcome = partition_matches(&record.pending_recipients, matches);

            if outcome.resolved.is_empty() {
                stats.untouched += 1;
                continue;
            }

            // Rebuild routable addresses from the matched identities: the
            // original local part, the identity's hash domain.
            let recipients: Vec<RecipientAddress> = outcome
                .resolved
                .iter()
                .map(|(raw, identity)| RecipientAddress {
                    local: RecipientAddress::parse(raw).local,
                    domain: identity.mail_domain(),
                })
                .collect();

            self.sender.send(&recipients, &record.content).await?;
            debug!(
                account = %self.account_id,
                id = %record.id,
                resolved = recipients.len(),
                still_pending = outcome.unresolved.len(),
                "fanned resolved recipients into the outbox"
            );

            if outcome.unresolved.is_empty() {
                self.store
                    .delete(record.id)
                    .await
                    .map_err(DeliveryError::Pending)?;
                stats.completed += 1;
            } else {
                self.store
                    .update_pending(record.id, &outcome.unresolved)
                    .await
                    .map_err(DeliveryError::Pending)?;
                stats.narrowed += 1;
            }
        }

        Ok(stats)
    }

    /// Run the reconciliation loop until shutdown.
    ///
    /// # Errors
    /// Currently none; pass failures are logged and retried next tick.
    pub async fn serve(
        &self,
        mut shutdown: broadcast::Receiver<Signal>,
    ) -> Result<(), DeliveryError> {
        internal!(level = INFO, "pending reconciler starting for {}", self.account_id);

        let mut timer =
            tokio::time::interval(Duration::from_secs(self.config.retry_interval_secs));
        // Skip the immediate first tick.
        timer.tick().await;

        loop {
            tokio::select! {
                _ = timer.tick() => match self.run_once().await {
                    Ok(stats) => {
                        debug!(account = %self.account_id, ?stats, "reconciliation pass finished");
                    }
                    Err(e) => {
                        warn!(account = %self.account_id, error = %e, "reconciliation pass aborted");
                    }
                },
                sig = shutdown.recv() => {
                    let _ = sig;
                    break;
                }
            }
        }

        internal!(level = INFO, "pending reconciler stopped for {}", self.account_id);
        Ok(())
    }
}
