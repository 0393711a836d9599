//! Bounce notification seam.
//!
//! Producing the notification (and landing it in the sender's mailbox) is
//! the mailbox engine's job; the delivery engine only decides when to
//! bounce and what reason to attach. Deletion of the original entry is
//! gated strictly on the collaborator confirming the bounce, so a bounce
//! is never silently lost.

use async_trait::async_trait;

use driftmail_common::address::RecipientAddress;

/// Returns a delivery-failure notification to the original sender.
#[async_trait]
pub trait BounceNotifier: Send + Sync + std::fmt::Debug {
    /// Bounce `message` back into `account_id`'s mailbox with a
    /// human-readable reason.
    ///
    /// `true` means the notification is reliably queued and the original
    /// message may be deleted.
    async fn bounce(&self, message: &[u8], account_id: &str, reason: &str) -> bool;
}

pub(crate) fn ceiling_exceeded_reason() -> String {
    "Tried too many times to deliver this message, but it doesn't appear that this \
     address even exists. If you're sure that it does, check your network connection."
        .to_owned()
}

pub(crate) fn bad_address_reason(address: &RecipientAddress) -> String {
    format!(
        "The address that this message was destined for ({address}) is not a valid \
         driftmail address."
    )
}
