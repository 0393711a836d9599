//! Concurrency tests for the outbox ordinal allocator.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::{collections::HashSet, sync::Arc};

use driftmail_outbox::Outbox;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_enqueues_never_collide() {
    let dir = tempfile::tempdir().expect("tempdir");
    let outbox = Arc::new(Outbox::open(dir.path()).await.expect("open outbox"));

    const WRITERS: usize = 32;

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..WRITERS {
        let outbox = Arc::clone(&outbox);
        tasks.spawn(async move {
            outbox
                .enqueue(&format!("writer-{i}@abcdef.drift"), vec![u8::try_from(i).unwrap()])
                .await
                .expect("enqueue")
        });
    }

    let mut ordinals = HashSet::new();
    while let Some(entry) = tasks.join_next().await {
        let entry = entry.expect("task");
        assert!(
            ordinals.insert(entry.ordinal),
            "two writers were handed ordinal {}",
            entry.ordinal
        );
    }

    assert_eq!(ordinals.len(), WRITERS);

    // Every entry must have been committed and be readable.
    let entries = outbox.entries().await.expect("scan");
    assert_eq!(entries.len(), WRITERS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn interleaved_enqueue_and_delete_reuses_freed_ordinals() {
    let dir = tempfile::tempdir().expect("tempdir");
    let outbox = Arc::new(Outbox::open(dir.path()).await.expect("open outbox"));

    let kept = outbox.enqueue("keep@x.drift", vec![0]).await.unwrap();
    let dropped = outbox.enqueue("drop@x.drift", vec![1]).await.unwrap();
    outbox.delete(&dropped).await.unwrap();

    let replacement = outbox.enqueue("again@x.drift", vec![2]).await.unwrap();
    assert_eq!(replacement.ordinal, dropped.ordinal);
    assert_ne!(replacement.ordinal, kept.ordinal);

    let entries = outbox.entries().await.unwrap();
    assert_eq!(entries.len(), 2);
}
