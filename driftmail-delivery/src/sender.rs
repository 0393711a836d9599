//! Compose-side fan-out into the outbox.

use std::sync::Arc;

use tokio::sync::Notify;

use driftmail_common::address::RecipientAddress;
use driftmail_outbox::Outbox;

use crate::error::DeliveryError;

/// Hands composed messages to an account's delivery subsystem.
///
/// Fans a message out into one queue entry per recipient through the
/// outbox's serialized `enqueue`, then wakes the scheduler so fresh mail is
/// not delayed by a full idle cycle. Cloneable; the composition front end
/// and the reconciler share the same instance.
#[derive(Debug, Clone)]
pub struct MessageSender {
    outbox: Arc<Outbox>,
    wake: Arc<Notify>,
}

impl MessageSender {
    #[must_use]
    pub fn new(outbox: Arc<Outbox>, wake: Arc<Notify>) -> Self {
        Self { outbox, wake }
    }

    /// The wake handle the scheduler's idle wait listens on.
    #[must_use]
    pub fn wake_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.wake)
    }

    /// Queue `message` for every recipient and wake the scheduler.
    ///
    /// Returns the number of entries queued.
    ///
    /// # Errors
    /// If an enqueue fails; entries already queued stay queued.
    pub async fn send(
        &self,
        recipients: &[RecipientAddress],
        message: &[u8],
    ) -> Result<usize, DeliveryError> {
        for recipient in recipients {
            self.outbox
                .enqueue(&recipient.to_string(), message.to_vec())
                .await?;
        }

        // A single permit is enough; one sweep covers every new entry.
        self.wake.notify_one();

        Ok(recipients.len())
    }
}
