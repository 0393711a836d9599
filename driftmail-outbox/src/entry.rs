use serde::{Deserialize, Serialize};

/// One queued outbound message, bound to exactly one recipient.
///
/// This is the on-disk record: it is bincode-encoded and committed under
/// `{ordinal}.msg` in the account's outbox directory. The retry count is
/// part of the record, not the filename, so a requeue rewrites the record
/// in place instead of renaming the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedMessage {
    /// The raw recipient string this copy of the message is destined for.
    pub recipient: String,
    /// Completed-but-failed delivery attempts so far.
    pub retries: u32,
    /// Seconds since the Unix epoch when the entry was first enqueued.
    pub queued_at: u64,
    /// Raw message bytes, header and body.
    pub data: Vec<u8>,
}

impl QueuedMessage {
    #[must_use]
    pub fn new(recipient: &str, data: Vec<u8>) -> Self {
        Self {
            recipient: recipient.to_owned(),
            retries: 0,
            queued_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            data,
        }
    }
}

/// A committed outbox entry: the record plus the ordinal that names its
/// file. The ordinal is stable for the entry's whole lifetime; only the
/// record behind it changes on requeue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub ordinal: u64,
    pub message: QueuedMessage,
}
