use std::{
    collections::HashSet,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tokio::fs;
use tracing::{debug, warn};

use crate::{
    entry::{QueueEntry, QueuedMessage},
    error::{OutboxError, Result},
};

/// Name of the per-account queue directory.
pub const OUTBOX_DIR: &str = "outbox";

const ENTRY_SUFFIX: &str = ".msg";
const STAGING_SUFFIX: &str = ".tmp";

/// Per-account outbound queue store.
///
/// Exclusively owned by the account's delivery subsystem. Ordinal
/// allocation is serialized through an internal mutex so two concurrent
/// `enqueue` calls can never pick the same ordinal; everything else relies
/// on the atomicity of same-directory renames.
#[derive(Debug)]
pub struct Outbox {
    path: PathBuf,
    alloc: tokio::sync::Mutex<()>,
}

impl Outbox {
    /// Open (creating if necessary) the outbox below an account directory.
    ///
    /// Staging files left behind by a crash are removed here; they were
    /// never visible to the scheduler, so dropping them is safe.
    ///
    /// # Errors
    /// If the directory cannot be created or scanned.
    pub async fn open(account_dir: &Path) -> Result<Self> {
        let path = account_dir.join(OUTBOX_DIR);
        fs::create_dir_all(&path).await?;

        let mut dir = fs::read_dir(&path).await?;
        while let Some(found) = dir.next_entry().await? {
            let name = found.file_name();
            if name.to_string_lossy().ends_with(STAGING_SUFFIX) {
                debug!(file = %name.to_string_lossy(), "removing stale staging file");
                let _ = fs::remove_file(found.path()).await;
            }
        }

        Ok(Self {
            path,
            alloc: tokio::sync::Mutex::new(()),
        })
    }

    /// The queue directory this store owns.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entry_path(&self, ordinal: u64) -> PathBuf {
        self.path.join(format!("{ordinal}{ENTRY_SUFFIX}"))
    }

    fn staging_path(&self, ordinal: u64) -> PathBuf {
        self.path
            .join(format!(".{ordinal}{ENTRY_SUFFIX}{STAGING_SUFFIX}"))
    }

    /// Write a new entry with retry count 0 and return it.
    ///
    /// The ordinal is the smallest integer >= 1 not already in use. The
    /// scan-and-pick runs under the allocation mutex, and the record is
    /// staged then renamed into place, so concurrent enqueues never collide
    /// and a crash mid-write never leaves a half-written entry visible.
    ///
    /// # Errors
    /// If the record cannot be encoded or written.
    pub async fn enqueue(&self, recipient: &str, data: Vec<u8>) -> Result<QueueEntry> {
        let message = QueuedMessage::new(recipient, data);
        let encoded = bincode::serde::encode_to_vec(&message, bincode::config::standard())?;

        let _guard = self.alloc.lock().await;

        let taken = self.occupied_ordinals().await?;
        let mut ordinal = 1u64;
        while taken.contains(&ordinal) {
            ordinal += 1;
        }

        self.commit(ordinal, &encoded).await?;
        debug!(ordinal, recipient, "enqueued outbound message");

        Ok(QueueEntry { ordinal, message })
    }

    /// Rewrite an entry in place with its retry count incremented.
    ///
    /// The ordinal (and therefore the filename) is unchanged; the commit is
    /// a stage-then-rename over the existing file, atomic with respect to
    /// the scheduler's directory scan.
    ///
    /// # Errors
    /// If the record cannot be encoded or written.
    pub async fn requeue(&self, entry: &QueueEntry) -> Result<QueueEntry> {
        let mut message = entry.message.clone();
        message.retries += 1;
        let encoded = bincode::serde::encode_to_vec(&message, bincode::config::standard())?;

        self.commit(entry.ordinal, &encoded).await?;
        debug!(
            ordinal = entry.ordinal,
            retries = message.retries,
            "requeued outbound message"
        );

        Ok(QueueEntry {
            ordinal: entry.ordinal,
            message,
        })
    }

    /// Scan the queue directory and decode every committed entry.
    ///
    /// The order is whatever the directory iteration yields. Files that do
    /// not look like entries, and entries whose record fails to decode, are
    /// corrupt: they are deleted immediately with a warning and never
    /// retried. Entries that vanish mid-scan (a concurrent delete) are
    /// skipped silently.
    ///
    /// # Errors
    /// If the directory itself cannot be read.
    pub async fn entries(&self) -> Result<Vec<QueueEntry>> {
        let mut found = Vec::new();
        let mut dir = fs::read_dir(&self.path).await?;

        while let Some(file) = dir.next_entry().await? {
            let name = file.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') {
                // Staging files are invisible by design.
                continue;
            }

            let Some(ordinal) = parse_ordinal(&name) else {
                warn!(file = %name, "invalid file in outbox, deleting");
                let _ = fs::remove_file(file.path()).await;
                continue;
            };

            match self.read(ordinal).await {
                Ok(message) => found.push(QueueEntry { ordinal, message }),
                Err(OutboxError::Decode(e)) => {
                    warn!(ordinal, error = %e, "corrupt outbox record, deleting");
                    let _ = fs::remove_file(file.path()).await;
                }
                Err(OutboxError::Io(e)) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }

        Ok(found)
    }

    /// Remove an entry. Idempotent: an already-gone entry is not an error.
    ///
    /// # Errors
    /// On any I/O failure other than the file being absent.
    pub async fn delete(&self, entry: &QueueEntry) -> Result<()> {
        match fs::remove_file(self.entry_path(entry.ordinal)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn read(&self, ordinal: u64) -> Result<QueuedMessage> {
        let bytes = fs::read(self.entry_path(ordinal)).await?;
        let (message, _) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard())?;
        Ok(message)
    }

    async fn commit(&self, ordinal: u64, encoded: &[u8]) -> Result<()> {
        let staged = self.staging_path(ordinal);
        fs::write(&staged, encoded).await?;
        fs::rename(&staged, self.entry_path(ordinal)).await?;
        Ok(())
    }

    async fn occupied_ordinals(&self) -> Result<HashSet<u64>> {
        let mut taken = HashSet::new();
        let mut dir = fs::read_dir(&self.path).await?;
        while let Some(file) = dir.next_entry().await? {
            let name = file.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') {
                continue;
            }
            if let Some(ordinal) = parse_ordinal(&name) {
                taken.insert(ordinal);
            }
        }
        Ok(taken)
    }
}

fn parse_ordinal(filename: &str) -> Option<u64> {
    filename.strip_suffix(ENTRY_SUFFIX)?.parse().ok()
}
