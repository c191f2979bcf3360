//! Concurrent fetching of the replies that comment threads didn't embed.
//!
//! A fixed pool of workers shares one queue of comment ids. The queue is filled and closed
//! before the workers start, so a worker is done once a receive comes back empty. Each worker
//! pages through the replies of one comment at a time and appends them to the shared
//! collection.
//!
//! The first worker to hit an error reports it, then empties the queue without fetching
//! anything, so that no more quota is spent on results that will be thrown away. Workers that
//! are mid-way through a comment finish it regularly.

use super::{CommentItem, Reply};
use crate::quota::QuotaLedger;
use crate::youtube_api::{Status, YouTubeClient};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::instrument;

/// Number of reply workers used unless configured otherwise.
pub const DEFAULT_WORKERS: usize = 10;

/// State shared by all workers of one resolution.
struct Shared {
    client: YouTubeClient,
    key: String,
    queue: Mutex<mpsc::Receiver<String>>,
    collection: Mutex<Vec<CommentItem>>,
}

/// Fetches the replies of every comment in `pending` and appends them to `items`.
///
/// Runs `workers` workers concurrently. Every worker's quota is added to `ledger` once it
/// has finished, whether it succeeded or not. All workers are waited for before anything is
/// returned, so by the time this returns the queue is empty and `ledger` is final.
///
/// If any worker failed, the first failure reported is returned and `items` is discarded.
#[instrument(skip_all, fields(pending = pending.len(), workers = workers))]
pub async fn resolve_replies(
    client: &YouTubeClient,
    key: &str,
    pending: Vec<String>,
    items: Vec<CommentItem>,
    ledger: &QuotaLedger,
    workers: usize,
) -> Result<Vec<CommentItem>, Status> {
    if pending.is_empty() {
        return Ok(items);
    }
    let workers = workers.max(1);

    // the whole queue is known up front, so fill it and close it before anyone reads from it.
    // it has room for every pending comment, so none of these sends wait.
    let (tx, rx) = mpsc::channel(pending.len());
    for parent_id in pending {
        tx.send(parent_id)
            .await
            .map_err(|_| Status::failed_to_query())?;
    }
    drop(tx);

    let shared = Arc::new(Shared {
        client: client.clone(),
        key: key.to_string(),
        queue: Mutex::new(rx),
        collection: Mutex::new(items),
    });

    let (results_tx, mut results) = mpsc::channel(workers);
    let handles: Vec<JoinHandle<u64>> = (0..workers)
        .map(|worker_id| {
            tokio::spawn(worker(worker_id, Arc::clone(&shared), results_tx.clone()))
        })
        .collect();
    drop(results_tx);

    let mut panicked = false;
    for handle in handles {
        match handle.await {
            Ok(charged) => ledger.charge(charged),
            Err(e) => {
                tracing::error!(error = %e, "reply worker died");
                panicked = true;
            }
        }
    }

    let mut failure = None;
    while let Some(status) = results.recv().await {
        if !status.is_ok() && failure.is_none() {
            failure = Some(status);
        }
    }
    if let Some(status) = failure {
        return Err(status);
    }
    if panicked {
        return Err(Status::failed_to_query());
    }

    let items = std::mem::take(&mut *shared.collection.lock().await);
    Ok(items)
}

/// Works through the queue until it's empty, and returns the quota it spent.
///
/// Publishes exactly one outcome on `results`: the first failure it hit, or OK.
#[instrument(skip(shared, results))]
async fn worker(worker_id: usize, shared: Arc<Shared>, results: mpsc::Sender<Status>) -> u64 {
    let ledger = QuotaLedger::new();
    let mut resolved = 0;

    loop {
        let Some(parent_id) = shared.queue.lock().await.recv().await else {
            break;
        };

        if let Err(status) = fetch_replies(&shared, &parent_id, &ledger).await {
            tracing::debug!(%parent_id, %status, "giving up on replies");
            // the channel has room for one outcome per worker
            let _ = results.send(status).await;

            let mut queue = shared.queue.lock().await;
            let mut drained = 0;
            while queue.recv().await.is_some() {
                drained += 1;
            }
            if drained != 0 {
                tracing::debug!(drained, "dropped queued comments after failure");
            }
            return ledger.total();
        }
        resolved += 1;
    }

    tracing::trace!(resolved, quota = ledger.total(), "reply worker done");
    let _ = results.send(Status::ok()).await;
    ledger.total()
}

/// Pages through all replies of one comment, appending each to the shared collection.
async fn fetch_replies(
    shared: &Shared,
    parent_id: &str,
    ledger: &QuotaLedger,
) -> Result<(), Status> {
    let replies = shared.client.list_replies(parent_id, &shared.key, ledger);
    let mut replies = std::pin::pin!(replies);
    while let Some(reply) = replies.next().await {
        let reply = CommentItem::from(Reply::from(reply?));
        shared.collection.lock().await.push(reply);
    }
    Ok(())
}
