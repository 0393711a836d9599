use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Suffix shared by every routable driftmail domain. The part in front of it
/// is the base32 hash of the recipient's public key material.
pub const NETWORK_DOMAIN_SUFFIX: &str = ".drift";

/// Reserved domain for keyless (slot-based) delivery. Messages addressed
/// here are inserted under a rotating, time-derived network slot instead of
/// a per-recipient secure channel.
pub const KEYLESS_DOMAIN: &str = "anon.drift";

/// How an address is routed on the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    /// Slot-based delivery into the reserved keyless domain.
    Keyless,
    /// Secure-channel delivery to an identity-hash domain.
    Identity,
}

/// A parsed recipient address: local part plus a network domain.
///
/// The domain is either the content hash identifying a recipient's public
/// key material or the reserved keyless-delivery domain. Parsing never
/// fails; malformed input yields an empty domain so every caller can apply
/// the same "an unroutable address is discarded, not retried" rule.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecipientAddress {
    pub local: String,
    pub domain: String,
}

impl RecipientAddress {
    /// Split a raw address on the first `@`.
    ///
    /// Anything without an `@`, or with nothing after it, comes back with an
    /// empty domain. Domains are case-insensitive (base32), so they are
    /// lowered here once.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('@') {
            Some((local, domain)) => Self {
                local: local.to_owned(),
                domain: domain.trim().to_ascii_lowercase(),
            },
            None => Self {
                local: raw.to_owned(),
                domain: String::new(),
            },
        }
    }

    /// An address with an empty domain can never be delivered.
    #[must_use]
    pub fn is_deliverable(&self) -> bool {
        !self.domain.is_empty()
    }

    #[must_use]
    pub fn kind(&self) -> AddressKind {
        if self.domain.eq_ignore_ascii_case(KEYLESS_DOMAIN) {
            AddressKind::Keyless
        } else {
            AddressKind::Identity
        }
    }

    /// The identity hash carried in the domain, with the network suffix
    /// stripped. `None` for keyless or undeliverable addresses.
    #[must_use]
    pub fn identity_hash(&self) -> Option<&str> {
        if !self.is_deliverable() || self.kind() == AddressKind::Keyless {
            return None;
        }
        self.domain
            .strip_suffix(NETWORK_DOMAIN_SUFFIX)
            .or(Some(&self.domain))
    }
}

impl Display for RecipientAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local, self.domain)
    }
}
