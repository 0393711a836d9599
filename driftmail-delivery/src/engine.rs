//! Per-datadir delivery engine: one scheduler and one reconciler task per
//! account, fully independent of each other.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::Deserialize;
use tokio::{
    sync::{Notify, broadcast},
    task::JoinSet,
};
use tracing::{error, info};

use driftmail_common::{Signal, identity::OwnIdentity};
use driftmail_outbox::Outbox;

use crate::{
    bounce::BounceNotifier,
    channel::SecureChannel,
    error::DeliveryError,
    network::KeylessInserter,
    pending::PendingStore,
    reconciler::{PendingReconciler, ReconcilerConfig},
    resolver::IdentityResolver,
    scheduler::{DeliveryScheduler, SchedulerConfig},
    sender::MessageSender,
};

/// Engine configuration, one section per worker kind.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
}

/// The external collaborators the engine delivers through. All shared
/// across accounts; per-account state lives in `AccountContext`.
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub channel: Arc<dyn SecureChannel>,
    pub inserter: Arc<dyn KeylessInserter>,
    pub bouncer: Arc<dyn BounceNotifier>,
    pub resolver: Arc<dyn IdentityResolver>,
}

/// Everything account-specific the engine needs to run one account's
/// delivery subsystem. Account management itself is out of scope; callers
/// build these from whatever account store they keep.
#[derive(Debug, Clone)]
pub struct AccountContext {
    pub id: String,
    pub dir: PathBuf,
    pub owner: OwnIdentity,
    pub pending: Arc<dyn PendingStore>,
}

/// Spawns and supervises the per-account delivery workers.
#[derive(Debug)]
pub struct DeliveryEngine {
    config: EngineConfig,
    collaborators: Collaborators,
}

impl DeliveryEngine {
    #[must_use]
    pub fn new(config: EngineConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
        }
    }

    /// Enumerate account directories below `datadir`, skipping hidden and
    /// system entries (leading dot) and anything that is not a directory.
    ///
    /// # Errors
    /// If `datadir` cannot be read.
    pub async fn discover_accounts(datadir: &Path) -> Result<Vec<(String, PathBuf)>, DeliveryError> {
        let mut accounts = Vec::new();
        let mut dir = tokio::fs::read_dir(datadir)
            .await
            .map_err(driftmail_outbox::OutboxError::from)?;

        while let Some(found) = dir
            .next_entry()
            .await
            .map_err(driftmail_outbox::OutboxError::from)?
        {
            let name = found.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let is_dir = found
                .file_type()
                .await
                .map_err(driftmail_outbox::OutboxError::from)?
                .is_dir();
            if is_dir {
                accounts.push((name, found.path()));
            }
        }

        Ok(accounts)
    }

    /// Start the scheduler and reconciler tasks for one account.
    ///
    /// Returns the account's `MessageSender`, the handle the composition
    /// front end uses to fan out new mail.
    ///
    /// # Errors
    /// If the account's outbox cannot be opened.
    pub async fn start_account(
        &self,
        account: AccountContext,
        tasks: &mut JoinSet<Result<(), DeliveryError>>,
        shutdown: &broadcast::Sender<Signal>,
    ) -> Result<MessageSender, DeliveryError> {
        let outbox = Arc::new(Outbox::open(&account.dir).await?);
        let wake = Arc::new(Notify::new());
        let sender = MessageSender::new(Arc::clone(&outbox), Arc::clone(&wake));

        let scheduler = DeliveryScheduler::new(
            self.config.scheduler.clone(),
            account.id.clone(),
            account.dir.clone(),
            outbox,
            Arc::clone(&self.collaborators.channel),
            Arc::clone(&self.collaborators.inserter),
            Arc::clone(&self.collaborators.bouncer),
            wake,
        );
        let rx = shutdown.subscribe();
        tasks.spawn(async move { scheduler.serve(rx).await });

        let reconciler = PendingReconciler::new(
            self.config.reconciler.clone(),
            account.id.clone(),
            account.owner,
            account.pending,
            Arc::clone(&self.collaborators.resolver),
            sender.clone(),
        );
        let rx = shutdown.subscribe();
        tasks.spawn(async move { reconciler.serve(rx).await });

        info!(account = %account.id, "delivery workers started");
        Ok(sender)
    }

    /// Run every account's workers until they stop.
    ///
    /// A failed worker is logged and does not take the others down.
    ///
    /// # Errors
    /// If any account's outbox cannot be opened at startup.
    pub async fn serve(
        &self,
        accounts: Vec<AccountContext>,
        shutdown: broadcast::Sender<Signal>,
    ) -> Result<(), DeliveryError> {
        let mut tasks = JoinSet::new();

        for account in accounts {
            self.start_account(account, &mut tasks, &shutdown).await?;
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(error = %e, "delivery worker failed"),
                Err(e) => error!(error = %e, "delivery worker panicked"),
            }
        }

        Ok(())
    }
}
