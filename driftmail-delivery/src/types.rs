//! Shared delivery types.

/// Terminal state of one queue entry after a sweep looked at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Handed to the network; the entry is gone.
    Delivered,
    /// A completed attempt failed; requeued with its retry count bumped.
    Retrying,
    /// Given up on; the sender was notified and the entry deleted.
    Bounced,
    /// Unroutable or corrupt; deleted without a delivery attempt.
    Discarded,
    /// Left untouched for a later sweep (transient condition, or a bounce
    /// that could not be confirmed yet).
    Deferred,
}

/// Counters for one full sweep of an account's outbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub delivered: usize,
    pub retrying: usize,
    pub bounced: usize,
    pub discarded: usize,
    pub deferred: usize,
}

impl SweepStats {
    pub(crate) fn record(&mut self, outcome: EntryOutcome) {
        match outcome {
            EntryOutcome::Delivered => self.delivered += 1,
            EntryOutcome::Retrying => self.retrying += 1,
            EntryOutcome::Bounced => self.bounced += 1,
            EntryOutcome::Discarded => self.discarded += 1,
            EntryOutcome::Deferred => self.deferred += 1,
        }
    }

    /// Total entries this sweep looked at.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.delivered + self.retrying + self.bounced + self.discarded + self.deferred
    }
}

/// Counters for one reconciliation pass over the pending store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Records whose every recipient resolved; fanned out and deleted.
    pub completed: usize,
    /// Records partially resolved; fanned out and rewritten with the
    /// reduced pending set.
    pub narrowed: usize,
    /// Records with no unambiguous resolution; left untouched.
    pub untouched: usize,
}
