//! Keyless ("no-identity-message") insert seam and slot key derivation.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::NetworkError;

/// Prefix of every keyless slot key. The sender's local part and the
/// sending day are appended, so each day yields a fresh slot key that only
/// the intended recipient knows to poll.
pub const KEYLESS_KEY_PREFIX: &str = "KSK@driftmail-anon-";

/// Slot-based network insert primitive, provided by the network layer.
#[async_trait]
pub trait KeylessInserter: Send + Sync + std::fmt::Debug {
    /// Insert `payload` under `key_prefix` into one of `slot_count` slots.
    ///
    /// Returns the slot index the payload landed in; any index >= 0 is a
    /// successful insert.
    ///
    /// # Errors
    /// `NetworkError::ConnectionTerminated` if the node connection died
    /// before the insert completed.
    async fn slot_insert(
        &self,
        payload: &[u8],
        key_prefix: &str,
        slot_count: u32,
        extra: &str,
    ) -> Result<i64, NetworkError>;
}

/// The slot key prefix for a given recipient local part and sending day.
#[must_use]
pub fn slot_key_prefix(local: &str, date: NaiveDate) -> String {
    format!("{KEYLESS_KEY_PREFIX}{local}-{}", date.format("%Y-%m-%d"))
}

/// Today's slot key prefix (UTC).
#[must_use]
pub fn todays_slot_key_prefix(local: &str) -> String {
    slot_key_prefix(local, chrono::Utc::now().date_naive())
}
