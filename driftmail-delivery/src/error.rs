//! Typed error handling for delivery operations.
//!
//! The taxonomy mirrors how failures are acted on:
//! - Channel errors split permanent (bounce) from transient (defer) cases.
//! - `ConnectionTerminated` is fatal to the in-progress sweep or pass, but
//!   never corrupts queue state.
//! - Resolver unavailability aborts a reconciliation pass wholesale.

use thiserror::Error;

use driftmail_outbox::OutboxError;

/// Failure opening a secure per-contact channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The recipient address can never name a valid contact. Bounced, not
    /// retried.
    #[error("not a valid driftmail address")]
    BadAddress,

    /// The contact exists but is permanently unusable. The message carries
    /// the reason handed back to the sender in the bounce.
    #[error("contact is permanently unusable: {0}")]
    FatalContact(String),

    /// The contact could not be established right now (key material not yet
    /// fetchable, transient I/O). The entry is left untouched for a later
    /// sweep.
    #[error("contact not yet establishable: {0}")]
    Unavailable(String),
}

/// Failure from the underlying network layer.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The connection to the local network node was shut down. Aborts the
    /// in-progress sweep; no delivery attempt was completed.
    #[error("connection to the network node was terminated")]
    ConnectionTerminated,
}

/// Failure from the external identity directory.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// The directory service is not loaded or not reachable. The whole
    /// reconciliation pass is skipped for this tick.
    #[error("identity service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Top-level delivery error type.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("outbox error: {0}")]
    Outbox(#[from] OutboxError),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("resolver error: {0}")]
    Resolver(#[from] ResolverError),

    /// Failure from the mailbox/pending-store collaborator.
    #[error("pending store error: {0}")]
    Pending(#[source] anyhow::Error),
}

impl DeliveryError {
    /// Whether this failure ends the delivery worker rather than just the
    /// current cycle.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Network(NetworkError::ConnectionTerminated))
    }
}
