//! Fetching of all top-level comments on a video.

use super::{Comment, CommentItem, Reply};
use crate::quota::QuotaLedger;
use crate::youtube_api::{CommentThread, Status, YouTubeClient};
use tokio_stream::StreamExt;
use tracing::instrument;

/// Everything learned from paging through a video's comment threads.
#[derive(Debug, Default)]
pub struct FetchedThreads {
    /// Every top-level comment, plus the replies of threads that embedded all of theirs.
    pub items: Vec<CommentItem>,
    /// Ids of comments whose replies still have to be fetched separately.
    pub pending: Vec<String>,
}

impl FetchedThreads {
    fn ingest(&mut self, thread: CommentThread) {
        let comment = Comment::from_thread(&thread);
        let embedded = thread.replies.map(|r| r.comments).unwrap_or_default();

        if embedded.len() == thread.snippet.total_reply_count as usize {
            self.items.push(comment.into());
            self.items
                .extend(embedded.into_iter().map(|r| CommentItem::from(Reply::from(r))));
        } else {
            tracing::trace!(
                comment_id = %comment.id,
                embedded = embedded.len(),
                total = thread.snippet.total_reply_count,
                "thread has unresolved replies"
            );
            self.pending.push(comment.id.clone());
            self.items.push(comment.into());
        }
    }
}

/// Pages through every comment thread on `video_id`.
///
/// Pages are fetched one at a time, since each needs the previous page's continuation token.
/// The first failing page aborts the whole fetch; nothing fetched up to that point is returned.
#[instrument(skip(client, key, ledger))]
pub async fn fetch_threads(
    client: &YouTubeClient,
    video_id: &str,
    key: &str,
    ledger: &QuotaLedger,
) -> Result<FetchedThreads, Status> {
    let mut fetched = FetchedThreads::default();

    let threads = client.list_comment_threads(video_id, key, ledger);
    let mut threads = std::pin::pin!(threads);
    while let Some(thread) = threads.next().await {
        fetched.ingest(thread?);
    }

    tracing::debug!(
        items = fetched.items.len(),
        pending = fetched.pending.len(),
        "fetched all comment threads"
    );
    Ok(fetched)
}
