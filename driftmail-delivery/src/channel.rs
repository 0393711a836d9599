//! Secure per-contact channel seam.
//!
//! The channel and handshake protocol are external collaborators; the
//! delivery engine only opens channels and pushes bytes through them.

use std::path::Path;

use async_trait::async_trait;

use driftmail_common::address::RecipientAddress;

use crate::error::{ChannelError, NetworkError};

/// An established delivery session to one recipient.
#[async_trait]
pub trait Contact: Send + Sync {
    /// Attempt to send the message over this channel.
    ///
    /// `Ok(false)` is a completed attempt that failed: the caller charges a
    /// retry against the entry. A terminated node connection is fatal to
    /// the whole sweep instead.
    ///
    /// # Errors
    /// `NetworkError::ConnectionTerminated` if the node connection died.
    async fn send(&self, message: &[u8]) -> Result<bool, NetworkError>;
}

/// Factory for per-contact channels.
#[async_trait]
pub trait SecureChannel: Send + Sync + std::fmt::Debug {
    /// Establish (or reuse) the channel for one recipient of one account.
    ///
    /// # Errors
    /// - `ChannelError::BadAddress` / `FatalContact`: permanent, bounce.
    /// - `ChannelError::Unavailable`: transient, leave the entry untouched.
    async fn open(
        &self,
        account_dir: &Path,
        address: &RecipientAddress,
    ) -> Result<Box<dyn Contact>, ChannelError>;
}
