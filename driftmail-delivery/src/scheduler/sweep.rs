//! One sweep over an account's outbox.
//!
//! State machine per entry: Queued -> Delivered | Retrying | Bounced |
//! Discarded, with Deferred meaning the entry is left untouched for the
//! next sweep. Deletion is gated strictly behind a confirmed delivery or a
//! confirmed bounce.

use tracing::{debug, warn};

use driftmail_common::{
    address::{AddressKind, RecipientAddress},
    outgoing,
};
use driftmail_outbox::QueueEntry;

use crate::{
    bounce::{bad_address_reason, ceiling_exceeded_reason},
    error::{ChannelError, DeliveryError, NetworkError},
    network::todays_slot_key_prefix,
    scheduler::DeliveryScheduler,
    types::{EntryOutcome, SweepStats},
};

pub(crate) async fn sweep_outbox(
    scheduler: &DeliveryScheduler,
) -> Result<SweepStats, DeliveryError> {
    let mut stats = SweepStats::default();

    // Corrupt entries were already discarded by the scan itself.
    for entry in scheduler.outbox.entries().await? {
        let outcome = deliver_entry(scheduler, &entry).await?;
        stats.record(outcome);
    }

    Ok(stats)
}

async fn deliver_entry(
    scheduler: &DeliveryScheduler,
    entry: &QueueEntry,
) -> Result<EntryOutcome, DeliveryError> {
    let address = RecipientAddress::parse(&entry.message.recipient);

    if !address.is_deliverable() {
        warn!(
            account = %scheduler.account_id,
            recipient = %entry.message.recipient,
            "unroutable recipient, discarding entry"
        );
        scheduler.outbox.delete(entry).await?;
        return Ok(EntryOutcome::Discarded);
    }

    match address.kind() {
        AddressKind::Keyless => deliver_keyless(scheduler, entry, &address).await,
        AddressKind::Identity => deliver_secure(scheduler, entry, &address).await,
    }
}

/// Slot-based insert keyed by the sender's local part plus the sending
/// day. A terminated connection means no attempt completed, so the entry
/// is left untouched with its retry count unchanged.
async fn deliver_keyless(
    scheduler: &DeliveryScheduler,
    entry: &QueueEntry,
    address: &RecipientAddress,
) -> Result<EntryOutcome, DeliveryError> {
    let key_prefix = todays_slot_key_prefix(&address.local);

    match scheduler
        .inserter
        .slot_insert(
            &entry.message.data,
            &key_prefix,
            scheduler.config.slot_count,
            "",
        )
        .await
    {
        Ok(index) if index >= 0 => {
            outgoing!(
                level = INFO,
                "[{}] keyless insert delivered to {} (slot {index})",
                scheduler.account_id,
                address
            );
            scheduler.outbox.delete(entry).await?;
            Ok(EntryOutcome::Delivered)
        }
        Ok(_) => Ok(EntryOutcome::Deferred),
        Err(NetworkError::ConnectionTerminated) => Ok(EntryOutcome::Deferred),
    }
}

async fn deliver_secure(
    scheduler: &DeliveryScheduler,
    entry: &QueueEntry,
    address: &RecipientAddress,
) -> Result<EntryOutcome, DeliveryError> {
    debug!(account = %scheduler.account_id, recipient = %address, "sending secure");

    let contact = match scheduler
        .channel
        .open(&scheduler.account_dir, address)
        .await
    {
        Ok(contact) => contact,
        Err(ChannelError::BadAddress) => {
            return bounce(scheduler, entry, &bad_address_reason(address)).await;
        }
        Err(ChannelError::FatalContact(reason)) => {
            return bounce(scheduler, entry, &reason).await;
        }
        Err(ChannelError::Unavailable(reason)) => {
            // Not a completed attempt; the retry count stays put.
            debug!(
                account = %scheduler.account_id,
                recipient = %address,
                reason,
                "contact not yet establishable"
            );
            return Ok(EntryOutcome::Deferred);
        }
    };

    // ConnectionTerminated propagates and aborts the sweep.
    if contact.send(&entry.message.data).await? {
        scheduler.outbox.delete(entry).await?;
        outgoing!(level = INFO, "[{}] delivered to {}", scheduler.account_id, address);
        return Ok(EntryOutcome::Delivered);
    }

    let tries = entry.message.retries + 1;
    if tries >= scheduler.config.max_tries {
        bounce(scheduler, entry, &ceiling_exceeded_reason()).await
    } else {
        scheduler.outbox.requeue(entry).await?;
        Ok(EntryOutcome::Retrying)
    }
}

/// The entry is deleted only on a confirmed bounce; otherwise it stays
/// queued and the bounce itself is retried like any transient failure.
async fn bounce(
    scheduler: &DeliveryScheduler,
    entry: &QueueEntry,
    reason: &str,
) -> Result<EntryOutcome, DeliveryError> {
    if scheduler
        .bouncer
        .bounce(&entry.message.data, &scheduler.account_id, reason)
        .await
    {
        outgoing!(
            level = INFO,
            "[{}] bounced message for {}: {reason}",
            scheduler.account_id,
            entry.message.recipient
        );
        scheduler.outbox.delete(entry).await?;
        Ok(EntryOutcome::Bounced)
    } else {
        warn!(
            account = %scheduler.account_id,
            recipient = %entry.message.recipient,
            "bounce not confirmed, keeping entry queued"
        );
        Ok(EntryOutcome::Deferred)
    }
}
