//! Identity resolution seam and the unambiguous-match policy.

use ahash::AHashMap;
use async_trait::async_trait;

use driftmail_common::identity::{Identity, OwnIdentity};

use crate::error::ResolverError;

/// Ways the identity directory may match a recipient string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchMethod {
    /// The full `local@hash.drift` form.
    FullAddress,
    /// Just the local part.
    LocalPart,
    /// The identity's nickname.
    Nickname,
}

impl MatchMethod {
    /// Every supported matching method; the reconciler always asks for all
    /// of them.
    pub const ALL: [Self; 3] = [Self::FullAddress, Self::LocalPart, Self::Nickname];
}

/// External identity directory.
#[async_trait]
pub trait IdentityResolver: Send + Sync + std::fmt::Debug {
    /// Ask the directory to match each address string to candidate
    /// identities, from `owner`'s point of view.
    ///
    /// Addresses absent from the returned map are treated the same as
    /// addresses mapped to an empty candidate list.
    ///
    /// # Errors
    /// `ResolverError::ServiceUnavailable` if the directory is not loaded.
    async fn match_identities(
        &self,
        addresses: &[String],
        owner: &OwnIdentity,
        methods: &[MatchMethod],
    ) -> Result<AHashMap<String, Vec<Identity>>, ResolverError>;
}

/// Result of applying the arbitration policy to one directory response.
#[derive(Debug)]
pub(crate) struct MatchOutcome {
    /// Recipients matched by exactly one candidate identity.
    pub resolved: Vec<(String, Identity)>,
    /// Recipients with zero or several candidates; they stay pending.
    pub unresolved: Vec<String>,
}

/// A recipient resolves unambiguously only if the directory returned
/// exactly one candidate for it. Zero candidates and several candidates
/// both leave it pending; there is deliberately no tie-breaking or scoring
/// here.
pub(crate) fn partition_matches(
    pending: &[String],
    mut matches: AHashMap<String, Vec<Identity>>,
) -> MatchOutcome {
    let mut outcome = MatchOutcome {
        resolved: Vec::new(),
        unresolved: Vec::new(),
    };

    for recipient in pending {
        match matches.remove(recipient) {
            Some(mut candidates) if candidates.len() == 1 => {
                let identity = candidates.remove(0);
                outcome.resolved.push((recipient.clone(), identity));
            }
            _ => outcome.unresolved.push(recipient.clone()),
        }
    }

    outcome
}
