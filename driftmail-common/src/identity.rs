use serde::{Deserialize, Serialize};

use crate::address::NETWORK_DOMAIN_SUFFIX;

/// A network identity as reported by the external identity directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The directory's opaque identifier for this identity.
    pub identity_id: String,
    /// Human-chosen nickname, not unique.
    pub nickname: String,
    /// Base32 hash of the identity's public key material. This is the part
    /// of a routable address in front of the network suffix.
    pub address_hash: String,
}

impl Identity {
    /// The mail domain this identity is reachable under.
    #[must_use]
    pub fn mail_domain(&self) -> String {
        format!(
            "{}{NETWORK_DOMAIN_SUFFIX}",
            self.address_hash.to_ascii_lowercase()
        )
    }
}

/// One of the local user's own identities; the owner side of a resolution
/// request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnIdentity {
    pub identity_id: String,
    pub nickname: String,
    pub address_hash: String,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn mail_domain_appends_network_suffix() {
        let identity = Identity {
            identity_id: "id-1".to_owned(),
            nickname: "bob".to_owned(),
            address_hash: "B5ZSWAI7YBKMVCRFDDLZ5EUW3IFZN5Z5".to_owned(),
        };
        assert_eq!(
            identity.mail_domain(),
            "b5zswai7ybkmvcrfddlz5euw3ifzn5z5.drift"
        );
    }
}
