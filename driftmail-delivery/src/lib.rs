//! Outbound delivery engine for driftmail.
//!
//! Orchestrates at-least-once delivery of composed mail over a
//! content-addressed anonymous network: the per-account outbox sweep with
//! retry and bounce policy, and the slower reconciliation pass that
//! re-resolves recipients whose network identity was unknown at compose
//! time. The network itself, the secure channel protocol, the mailbox
//! engine, and the identity directory are consumed through trait seams.

pub mod bounce;
pub mod channel;
pub mod engine;
pub mod error;
pub mod network;
pub mod pending;
pub mod reconciler;
pub mod resolver;
pub mod scheduler;
pub mod sender;
pub mod types;

pub use bounce::BounceNotifier;
pub use channel::{Contact, SecureChannel};
pub use engine::{AccountContext, Collaborators, DeliveryEngine, EngineConfig};
pub use error::{ChannelError, DeliveryError, NetworkError, ResolverError};
pub use network::{KEYLESS_KEY_PREFIX, KeylessInserter, slot_key_prefix, todays_slot_key_prefix};
pub use pending::{PendingMessage, PendingStore};
pub use reconciler::{PendingReconciler, ReconcilerConfig};
pub use resolver::{IdentityResolver, MatchMethod};
pub use scheduler::{DeliveryScheduler, SchedulerConfig};
pub use sender::MessageSender;
pub use types::{EntryOutcome, ReconcileStats, SweepStats};
