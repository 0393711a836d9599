//! Pending store seam.
//!
//! Messages whose recipients could not be mapped to network identities at
//! compose time wait in a per-account pending store owned by the mailbox
//! engine. The reconciler is its only consumer here.

use std::sync::Arc;

use async_trait::async_trait;
use ulid::Ulid;

/// A message held back because one or more recipients could not yet be
/// resolved to a network identity.
#[derive(Debug, Clone)]
pub struct PendingMessage {
    /// Stable unique id within the store.
    pub id: Ulid,
    /// Recipient strings still awaiting resolution. Always a subset of the
    /// original recipient set; the record is removed once this is empty.
    pub pending_recipients: Vec<String>,
    /// The underlying message content, header and body.
    pub content: Arc<[u8]>,
}

/// Per-account store of pending messages, provided by the mailbox engine.
#[async_trait]
pub trait PendingStore: Send + Sync + std::fmt::Debug {
    /// All pending records for this account.
    ///
    /// # Errors
    /// If the store cannot be read.
    async fn list_pending(&self) -> anyhow::Result<Vec<PendingMessage>>;

    /// Rewrite a record with its reduced pending-recipient set.
    ///
    /// # Errors
    /// If the record cannot be rewritten.
    async fn update_pending(&self, id: Ulid, remaining: &[String]) -> anyhow::Result<()>;

    /// Remove a fully-resolved record.
    ///
    /// # Errors
    /// If the record cannot be removed.
    async fn delete(&self, id: Ulid) -> anyhow::Result<()>;
}
