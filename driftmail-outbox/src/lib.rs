//! Filesystem-backed outbound queue.
//!
//! Each account owns one `outbox/` directory holding a single file per
//! queued message. Delivery metadata (recipient, retry count) lives inside
//! the record rather than in the filename; the filename carries only the
//! entry's ordinal. All writes are staged to a dot-prefixed temporary file
//! and committed with an atomic rename, so a crash mid-write never exposes
//! a partial entry to the delivery scheduler.

pub mod entry;
pub mod error;
pub mod store;

pub use entry::{QueueEntry, QueuedMessage};
pub use error::{OutboxError, Result};
pub use store::{OUTBOX_DIR, Outbox};
